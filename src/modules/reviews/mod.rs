//! Course reviews. A buyer with a paid order may rate a course once; the
//! course keeps a running average and count.

pub mod controller;
pub mod router;
pub mod service;
