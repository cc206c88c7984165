//! Request extractors for authentication.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. [`auth::AuthUser`] validates the JWT and extracts claims
//! 3. [`auth::CurrentIdentity`] looks the subject up and rejects unknown or
//!    deactivated accounts
//! 4. Handler executes and consults the access gate where content is involved
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::CurrentIdentity;
//!
//! async fn list_orders(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
//!     // identity.user_id, identity.role
//! }
//! ```

pub mod auth;
