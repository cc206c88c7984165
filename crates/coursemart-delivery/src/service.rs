//! The gated delivery service.
//!
//! [`ContentDelivery`] answers two questions for a resolved [`Identity`]:
//! may this caller see (or change) a course's content, and what bytes does a
//! stream request produce. Checks run in a fixed order so that every caller
//! gets the same answer for the same missing resource:
//!
//! 1. the course exists
//! 2. the block exists and belongs to that course
//! 3. the gate permits the caller
//! 4. the range is satisfiable

use std::sync::Arc;

use coursemart_core::{DeliveryError, FileStorage};
use coursemart_models::{ContentBlockId, CourseId};

use crate::access::{AccessGate, AccessTarget, Grant};
use crate::media::content_type_for;
use crate::ports::{BlockLocation, ContentRepository, CourseRef, EntitlementLookup, Identity};
use crate::range::{ByteSpan, resolve_range};
use crate::stream::{ChunkStream, DEFAULT_CHUNK_SIZE, chunk_stream};

/// Which rule chain guards an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Reading content: admins, the owning seller and buyers with a paid order.
    Consume,
    /// Changing content: admins and the owning seller only.
    Manage,
}

/// A permitted, opened transfer ready to be written out.
pub struct Delivery {
    pub grant: Grant,
    pub content_type: String,
    pub total_length: u64,
    /// `Some` when the request carried a satisfiable `Range` header.
    pub span: Option<ByteSpan>,
    pub body: ChunkStream,
}

impl Delivery {
    pub fn is_partial(&self) -> bool {
        self.span.is_some()
    }

    /// Number of bytes the body will carry.
    pub fn content_length(&self) -> u64 {
        match self.span {
            Some(span) => span.len(),
            None => self.total_length,
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("grant", &self.grant)
            .field("content_type", &self.content_type)
            .field("total_length", &self.total_length)
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ContentDelivery {
    content: Arc<dyn ContentRepository>,
    storage: Arc<dyn FileStorage>,
    consume_gate: AccessGate,
    manage_gate: AccessGate,
    chunk_size: usize,
}

impl ContentDelivery {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        entitlements: Arc<dyn EntitlementLookup>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            content,
            storage,
            consume_gate: AccessGate::standard(entitlements.clone()),
            manage_gate: AccessGate::management(entitlements),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn gate(&self, policy: Policy) -> &AccessGate {
        match policy {
            Policy::Consume => &self.consume_gate,
            Policy::Manage => &self.manage_gate,
        }
    }

    /// Check that the course exists and the caller passes `policy` on it.
    pub async fn authorize_course(
        &self,
        identity: &Identity,
        course_id: CourseId,
        policy: Policy,
    ) -> Result<(CourseRef, Grant), DeliveryError> {
        let course = self
            .content
            .find_course(course_id)
            .await?
            .ok_or(DeliveryError::NotFound("course"))?;

        let grant = self
            .gate(policy)
            .authorize(identity, &AccessTarget::from(&course))
            .await?;

        Ok((course, grant))
    }

    /// Check that the block exists under `course_id` and the caller passes
    /// `policy` on it.
    pub async fn authorize_block(
        &self,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
        policy: Policy,
    ) -> Result<(BlockLocation, Grant), DeliveryError> {
        let block = self.locate_block(course_id, block_id).await?;

        let grant = self
            .gate(policy)
            .authorize(identity, &AccessTarget::from(&block))
            .await?;

        Ok((block, grant))
    }

    async fn locate_block(
        &self,
        course_id: CourseId,
        block_id: ContentBlockId,
    ) -> Result<BlockLocation, DeliveryError> {
        self.content
            .find_course(course_id)
            .await?
            .ok_or(DeliveryError::NotFound("course"))?;

        self.content
            .find_block(block_id)
            .await?
            .filter(|block| block.course_id == course_id)
            .ok_or(DeliveryError::NotFound("content block"))
    }

    /// Resolve, gate and open a block for streaming.
    ///
    /// `range` is the raw `Range` header value, if any.
    #[tracing::instrument(
        skip(self, identity),
        fields(user_id = %identity.user_id, grant = tracing::field::Empty)
    )]
    pub async fn open(
        &self,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
        range: Option<&str>,
    ) -> Result<Delivery, DeliveryError> {
        let block = self.locate_block(course_id, block_id).await?;
        let locator = block
            .locator
            .as_deref()
            .ok_or(DeliveryError::NotFound("content file"))?;

        let grant = self
            .consume_gate
            .authorize(identity, &AccessTarget::from(&block))
            .await?;
        tracing::Span::current().record("grant", grant.as_str());

        let blob = self.storage.open(locator).await?;
        let total_length = blob.len;
        let span = resolve_range(range, total_length)?;

        let body = chunk_stream(
            blob.reader,
            span.or_else(|| ByteSpan::full(total_length)),
            self.chunk_size,
        )
        .await?;

        Ok(Delivery {
            grant,
            content_type: content_type_for(&block.media_type, locator),
            total_length,
            span,
            body,
        })
    }
}
