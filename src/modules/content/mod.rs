//! Course content: listing, file upload, metadata edits, deletion and the
//! range-addressable stream.
//!
//! Reads go through the consumption policy (admin, owning seller, paid
//! buyer). Changes go through the management policy (admin, owning seller).

pub mod controller;
pub mod router;
pub mod service;
