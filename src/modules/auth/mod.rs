//! Registration, login and the caller's profile.

pub mod controller;
pub mod router;
pub mod service;
