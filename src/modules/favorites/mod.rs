//! Per-user bookmarked courses.

pub mod controller;
pub mod router;
pub mod service;
