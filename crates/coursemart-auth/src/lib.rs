//! # Coursemart Auth
//!
//! Authentication types and JWT utilities for the Coursemart API.
//!
//! - [`claims`]: the access token claim set
//! - [`jwt`]: token creation and verification
//!
//! Tokens only prove who the caller was when the token was issued. Whether the
//! account still exists and is active is decided per request against the user
//! directory.
//!
//! # Example
//!
//! ```ignore
//! use coursemart_auth::{create_access_token, verify_token};
//! use coursemart_config::JwtConfig;
//! use coursemart_core::UserRole;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "buyer@example.com", UserRole::Buyer, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
