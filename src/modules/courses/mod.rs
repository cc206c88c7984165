//! The public course catalog.

pub mod controller;
pub mod router;
pub mod service;
