pub mod auth;
pub mod content;
pub mod courses;
pub mod favorites;
pub mod orders;
pub mod reviews;
