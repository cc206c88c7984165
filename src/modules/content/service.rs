use anyhow::anyhow;
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use coursemart_core::file_storage::sanitize_file_name;
use coursemart_core::{AppError, DeliveryError, StorageError};
use coursemart_delivery::{Delivery, Grant, Identity, Policy};
use coursemart_models::{ContentBlock, ContentBlockId, CourseId, UpdateContentBlockDto};

use crate::metrics;
use crate::state::AppState;

/// Storage key for a new upload: `courses/{course_id}/{uuid}_{name}`.
pub fn storage_key(course_id: CourseId, file_name: &str) -> String {
    format!(
        "courses/{course_id}/{}_{}",
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

fn record_decision<T>(result: &Result<T, DeliveryError>, grant: impl Fn(&T) -> Grant) {
    match result {
        Ok(value) => metrics::track_access_decision(true, grant(value).as_str()),
        Err(err @ DeliveryError::Forbidden(_)) => {
            metrics::track_access_decision(false, err.code().as_str())
        }
        Err(_) => {}
    }
}

fn storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidFileSize { max_bytes } => AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            anyhow!("File exceeds maximum size of {max_bytes} bytes"),
        ),
        other => DeliveryError::from(other).into(),
    }
}

/// Best-effort blob removal. Failures are logged, never returned.
async fn discard_blob(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete(key).await {
        tracing::warn!(key, error = %e, "failed to remove stored blob");
    }
}

pub struct ContentService;

impl ContentService {
    #[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
    pub async fn list_blocks(
        state: &AppState,
        identity: &Identity,
        course_id: CourseId,
    ) -> Result<Vec<ContentBlock>, AppError> {
        let result = state
            .delivery
            .authorize_course(identity, course_id, Policy::Consume)
            .await;
        record_decision(&result, |(_, grant)| *grant);
        result?;

        Ok(state.content.list_blocks(course_id).await?)
    }

    /// Store `data` as the block's content, replacing any previous blob.
    #[instrument(skip(state, identity, data), fields(user_id = %identity.user_id, bytes = data.len()))]
    pub async fn upload(
        state: &AppState,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
        file_name: &str,
        data: &[u8],
    ) -> Result<ContentBlock, AppError> {
        let (location, _) = state
            .delivery
            .authorize_block(identity, course_id, block_id, Policy::Manage)
            .await?;

        let key = storage_key(course_id, file_name);
        let key = state.storage.save(&key, data).await.map_err(storage_error)?;

        let updated = match state.content.set_block_locator(block_id, &key).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                discard_blob(state, &key).await;
                return Err(DeliveryError::NotFound("content block").into());
            }
            Err(e) => {
                discard_blob(state, &key).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = location.locator.as_deref()
            && previous != key
        {
            discard_blob(state, previous).await;
        }

        metrics::track_content_uploaded(data.len());
        tracing::info!(block_id = %block_id, key = %key, "content uploaded");

        Ok(updated)
    }

    #[instrument(skip(state, identity, changes), fields(user_id = %identity.user_id))]
    pub async fn update(
        state: &AppState,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
        changes: &UpdateContentBlockDto,
    ) -> Result<ContentBlock, AppError> {
        state
            .delivery
            .authorize_block(identity, course_id, block_id, Policy::Manage)
            .await?;

        state
            .content
            .update_block(block_id, changes)
            .await?
            .ok_or_else(|| DeliveryError::NotFound("content block").into())
    }

    /// Remove the block's blob, then the block itself.
    #[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
    pub async fn delete(
        state: &AppState,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
    ) -> Result<(), AppError> {
        let (location, _) = state
            .delivery
            .authorize_block(identity, course_id, block_id, Policy::Manage)
            .await?;

        if let Some(key) = location.locator.as_deref() {
            discard_blob(state, key).await;
        }

        if !state.content.delete_block(block_id).await? {
            return Err(DeliveryError::NotFound("content block").into());
        }

        tracing::info!(block_id = %block_id, "content block deleted");
        Ok(())
    }

    pub async fn open_stream(
        state: &AppState,
        identity: &Identity,
        course_id: CourseId,
        block_id: ContentBlockId,
        range: Option<&str>,
    ) -> Result<Delivery, AppError> {
        let result = state
            .delivery
            .open(identity, course_id, block_id, range)
            .await;
        record_decision(&result, |delivery| delivery.grant);

        let delivery = result?;
        metrics::track_stream_started(delivery.is_partial(), delivery.content_length());
        Ok(delivery)
    }
}
