//! # Coursemart Core
//!
//! Foundational types shared by every Coursemart crate:
//!
//! - [`errors`]: [`AppError`] with HTTP conversion, and the [`DeliveryError`]
//!   taxonomy of the content delivery path
//! - [`file_storage`]: storage backends for content blobs
//! - [`password`]: bcrypt password hashing and verification
//! - [`roles`]: the [`UserRole`] enum

pub mod errors;
pub mod file_storage;
pub mod password;
pub mod roles;

pub use errors::{AppError, DeliveryError, DenyReason, ErrorCode};
pub use file_storage::{BlobReader, FileStorage, LocalFileStorage, StorageError, StoredBlob};
pub use password::{hash_password, verify_password};
pub use roles::UserRole;
