//! # Coursemart Delivery
//!
//! The gated content delivery path: who may read a content block, and how its
//! bytes are served.
//!
//! A request flows through four stages, each of which can end it:
//!
//! 1. identity resolution ([`ports::resolve_identity`]) -> `Unauthenticated`
//! 2. existence checks on course and block -> `NotFound`
//! 3. the [`access::AccessGate`] rule chain -> `Forbidden`
//! 4. range resolution ([`range::resolve_range`]) -> `RangeNotSatisfiable`
//!
//! after which [`stream::chunk_stream`] emits the requested span.
//!
//! [`service::ContentDelivery`] wires the stages together. The repository
//! traits in [`ports`] are implemented over Postgres by `coursemart-db` and in
//! memory by [`memory`] (behind the `test-utils` feature).

pub mod access;
pub mod media;
pub mod ports;
pub mod range;
pub mod service;
pub mod stream;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use access::{
    AccessDecision, AccessGate, AccessRule, AccessTarget, AdminRule, DenyRule, Grant, OwnerRule,
    PurchaseRule,
};
pub use ports::{
    BlockLocation, ContentRepository, CourseRef, EntitlementLookup, Identity, IdentityDirectory,
    resolve_identity,
};
pub use range::{ByteSpan, resolve_range};
pub use service::{ContentDelivery, Delivery, Policy};
pub use stream::{ChunkStream, DEFAULT_CHUNK_SIZE, chunk_stream};
