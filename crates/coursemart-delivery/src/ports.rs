//! Repository ports the delivery path depends on.
//!
//! Every lookup is read-only from the gate's point of view. Implementations
//! may serve slightly stale data; a purchase that lands a moment after a
//! request started is simply seen by the next request.

use async_trait::async_trait;

use coursemart_core::{DeliveryError, UserRole};
use coursemart_models::{ContentBlock, ContentBlockId, CourseId, UpdateContentBlockDto, UserId};

/// The caller as far as access decisions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
    pub active: bool,
}

/// The parts of a course that matter for access: who sells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseRef {
    pub id: CourseId,
    pub owner_id: UserId,
}

/// Everything needed to gate and serve one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    pub block_id: ContentBlockId,
    pub course_id: CourseId,
    pub owner_id: UserId,
    /// Storage key of the blob, `None` until something was uploaded.
    pub locator: Option<String>,
    /// Declared media type of the block, as authored.
    pub media_type: String,
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_identity(&self, user_id: UserId) -> Result<Option<Identity>, DeliveryError>;
}

#[async_trait]
pub trait EntitlementLookup: Send + Sync {
    /// Whether at least one `paid` order exists for this exact pair.
    async fn has_paid_entitlement(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, DeliveryError>;
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_course(&self, course_id: CourseId) -> Result<Option<CourseRef>, DeliveryError>;

    async fn find_block(
        &self,
        block_id: ContentBlockId,
    ) -> Result<Option<BlockLocation>, DeliveryError>;

    /// Blocks of a course, ordered by module position then block position.
    async fn list_blocks(&self, course_id: CourseId) -> Result<Vec<ContentBlock>, DeliveryError>;

    async fn set_block_locator(
        &self,
        block_id: ContentBlockId,
        locator: &str,
    ) -> Result<Option<ContentBlock>, DeliveryError>;

    async fn update_block(
        &self,
        block_id: ContentBlockId,
        changes: &UpdateContentBlockDto,
    ) -> Result<Option<ContentBlock>, DeliveryError>;

    /// Returns whether a row was removed.
    async fn delete_block(&self, block_id: ContentBlockId) -> Result<bool, DeliveryError>;
}

/// Turn an authenticated user id into an [`Identity`].
///
/// Unknown and deactivated accounts are both `Unauthenticated`: a valid token
/// for an account that no longer may sign in proves nothing.
pub async fn resolve_identity(
    directory: &dyn IdentityDirectory,
    user_id: UserId,
) -> Result<Identity, DeliveryError> {
    match directory.find_identity(user_id).await? {
        Some(identity) if identity.active => Ok(identity),
        Some(_) => Err(DeliveryError::Unauthenticated(
            "Account is deactivated".to_string(),
        )),
        None => Err(DeliveryError::Unauthenticated(
            "User no longer exists".to_string(),
        )),
    }
}
