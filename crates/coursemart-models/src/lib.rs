//! # Coursemart Models
//!
//! Domain models and DTOs for the Coursemart API: database rows, request and
//! response bodies, and the typed ids that tie them together.
//!
//! - [`ids`]: strongly-typed `Uuid` newtypes
//! - [`users`]: accounts, registration and login
//! - [`courses`]: courses, modules and content blocks
//! - [`orders`]: purchases, which double as entitlements
//! - [`reviews`]: buyer ratings of purchased courses

pub mod courses;
pub mod ids;
pub mod orders;
pub mod reviews;
pub mod users;

pub use courses::{
    ContentBlock, Course, CourseDetail, CourseFilterParams, CourseModule, UpdateContentBlockDto,
};
pub use ids::{ContentBlockId, CourseId, ModuleId, OrderId, ReviewId, UserId};
pub use orders::{CreateOrderDto, Order, OrderStatus};
pub use reviews::{CourseReview, CreateReviewDto};
pub use users::{LoginRequest, RegisterRequest, TokenResponse, User, UserProfile};
