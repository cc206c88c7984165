//! Orders. A paid order is the entitlement that unlocks a course.
//!
//! Orders are created `pending` with the course price frozen. Moving an order
//! to `paid` happens outside this API.

pub mod controller;
pub mod router;
pub mod service;
