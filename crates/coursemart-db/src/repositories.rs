//! Postgres-backed ports.
//!
//! Runtime-checked queries only, so the workspace builds without a live
//! database.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_core::{DeliveryError, UserRole};
use coursemart_delivery::{
    BlockLocation, ContentRepository, CourseRef, EntitlementLookup, Identity, IdentityDirectory,
};
use coursemart_models::{
    ContentBlock, ContentBlockId, CourseId, OrderStatus, UpdateContentBlockDto, UserId,
};

const BLOCK_COLUMNS: &str = "b.id, b.module_id, b.title, b.block_type, b.content_url, \
     b.duration_seconds, b.position, b.created_at, b.updated_at";

#[derive(Debug, Clone)]
pub struct PgIdentityDirectory {
    db: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    #[instrument(skip(self))]
    async fn find_identity(&self, user_id: UserId) -> Result<Option<Identity>, DeliveryError> {
        let row = sqlx::query_as::<_, (UserId, UserRole, bool)>(
            "SELECT id, role, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(DeliveryError::store)?;

        Ok(row.map(|(user_id, role, active)| Identity {
            user_id,
            role,
            active,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct PgEntitlementLookup {
    db: PgPool,
}

impl PgEntitlementLookup {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntitlementLookup for PgEntitlementLookup {
    #[instrument(skip(self))]
    async fn has_paid_entitlement(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, DeliveryError> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM orders
                   WHERE user_id = $1 AND course_id = $2 AND status = $3
               )"#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(OrderStatus::Paid)
        .fetch_one(&self.db)
        .await
        .map_err(DeliveryError::store)
    }
}

#[derive(Debug, Clone)]
pub struct PgContentRepository {
    db: PgPool,
}

impl PgContentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    #[instrument(skip(self))]
    async fn find_course(&self, course_id: CourseId) -> Result<Option<CourseRef>, DeliveryError> {
        let row = sqlx::query_as::<_, (CourseId, UserId)>(
            "SELECT id, seller_id FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.db)
        .await
        .map_err(DeliveryError::store)?;

        Ok(row.map(|(id, owner_id)| CourseRef { id, owner_id }))
    }

    #[instrument(skip(self))]
    async fn find_block(
        &self,
        block_id: ContentBlockId,
    ) -> Result<Option<BlockLocation>, DeliveryError> {
        let row = sqlx::query_as::<_, (ContentBlockId, CourseId, UserId, Option<String>, String)>(
            r#"SELECT b.id, m.course_id, c.seller_id, b.content_url, b.block_type
               FROM content_blocks b
               JOIN course_modules m ON m.id = b.module_id
               JOIN courses c ON c.id = m.course_id
               WHERE b.id = $1"#,
        )
        .bind(block_id)
        .fetch_optional(&self.db)
        .await
        .map_err(DeliveryError::store)?;

        Ok(row.map(
            |(block_id, course_id, owner_id, locator, media_type)| BlockLocation {
                block_id,
                course_id,
                owner_id,
                locator,
                media_type,
            },
        ))
    }

    #[instrument(skip(self))]
    async fn list_blocks(&self, course_id: CourseId) -> Result<Vec<ContentBlock>, DeliveryError> {
        let query = format!(
            r#"SELECT {BLOCK_COLUMNS}
               FROM content_blocks b
               JOIN course_modules m ON m.id = b.module_id
               WHERE m.course_id = $1
               ORDER BY m.position, b.position, b.created_at"#
        );

        sqlx::query_as::<_, ContentBlock>(&query)
            .bind(course_id)
            .fetch_all(&self.db)
            .await
            .map_err(DeliveryError::store)
    }

    #[instrument(skip(self))]
    async fn set_block_locator(
        &self,
        block_id: ContentBlockId,
        locator: &str,
    ) -> Result<Option<ContentBlock>, DeliveryError> {
        let query = format!(
            r#"UPDATE content_blocks b
               SET content_url = $2, updated_at = NOW()
               WHERE b.id = $1
               RETURNING {BLOCK_COLUMNS}"#
        );

        sqlx::query_as::<_, ContentBlock>(&query)
            .bind(block_id)
            .bind(locator)
            .fetch_optional(&self.db)
            .await
            .map_err(DeliveryError::store)
    }

    #[instrument(skip(self))]
    async fn update_block(
        &self,
        block_id: ContentBlockId,
        changes: &UpdateContentBlockDto,
    ) -> Result<Option<ContentBlock>, DeliveryError> {
        let query = format!(
            r#"UPDATE content_blocks b
               SET title = COALESCE($2, b.title),
                   block_type = COALESCE($3, b.block_type),
                   position = COALESCE($4, b.position),
                   duration_seconds = COALESCE($5, b.duration_seconds),
                   updated_at = NOW()
               WHERE b.id = $1
               RETURNING {BLOCK_COLUMNS}"#
        );

        sqlx::query_as::<_, ContentBlock>(&query)
            .bind(block_id)
            .bind(&changes.title)
            .bind(&changes.block_type)
            .bind(changes.position)
            .bind(changes.duration_seconds)
            .fetch_optional(&self.db)
            .await
            .map_err(DeliveryError::store)
    }

    #[instrument(skip(self))]
    async fn delete_block(&self, block_id: ContentBlockId) -> Result<bool, DeliveryError> {
        let result = sqlx::query("DELETE FROM content_blocks WHERE id = $1")
            .bind(block_id)
            .execute(&self.db)
            .await
            .map_err(DeliveryError::store)?;

        Ok(result.rows_affected() > 0)
    }
}
