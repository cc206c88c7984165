use anyhow::anyhow;
use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use futures::TryStreamExt;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{ContentBlock, ContentBlockId, CourseId, UpdateContentBlockDto};

use super::service::ContentService;
use crate::docs::ErrorResponse;
use crate::metrics;
use crate::middleware::auth::CurrentIdentity;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List a course's content blocks
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/contents",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 200, description = "Blocks ordered by module then block position", body = Vec<ContentBlock>),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 403, description = "Course not purchased", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(course_id = %course_id))]
pub async fn list_contents(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Vec<ContentBlock>>, AppError> {
    let blocks = ContentService::list_blocks(&state, &identity, course_id).await?;
    Ok(Json(blocks))
}

/// Upload the file behind a content block
///
/// Expects a multipart body with a `file` field. Replaces any previous file.
#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/contents/blocks/{block_id}/upload",
    params(
        ("course_id" = CourseId, Path, description = "Course id"),
        ("block_id" = ContentBlockId, Path, description = "Content block id")
    ),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Block with its new locator", body = ContentBlock),
        (status = 400, description = "Missing or unreadable file field", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course or block not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(course_id = %course_id, block_id = %block_id))]
pub async fn upload_content(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((course_id, block_id)): Path<(CourseId, ContentBlockId)>,
    mut multipart: Multipart,
) -> Result<Json<ContentBlock>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), anyhow!(e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::new(e.status(), anyhow!(e.body_text())))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::bad_request(anyhow!("Missing required 'file' field")))?;

    let block =
        ContentService::upload(&state, &identity, course_id, block_id, &file_name, &data).await?;
    Ok(Json(block))
}

/// Update a content block's metadata
#[utoipa::path(
    patch,
    path = "/api/courses/{course_id}/contents/blocks/{block_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course id"),
        ("block_id" = ContentBlockId, Path, description = "Content block id")
    ),
    request_body = UpdateContentBlockDto,
    responses(
        (status = 200, description = "Updated block", body = ContentBlock),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course or block not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(course_id = %course_id, block_id = %block_id))]
pub async fn update_content(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((course_id, block_id)): Path<(CourseId, ContentBlockId)>,
    ValidatedJson(changes): ValidatedJson<UpdateContentBlockDto>,
) -> Result<Json<ContentBlock>, AppError> {
    let block = ContentService::update(&state, &identity, course_id, block_id, &changes).await?;
    Ok(Json(block))
}

/// Delete a content block and its file
#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}/contents/blocks/{block_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course id"),
        ("block_id" = ContentBlockId, Path, description = "Content block id")
    ),
    responses(
        (status = 204, description = "Block deleted"),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course or block not found", body = ErrorResponse)
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(course_id = %course_id, block_id = %block_id))]
pub async fn delete_content(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((course_id, block_id)): Path<(CourseId, ContentBlockId)>,
) -> Result<StatusCode, AppError> {
    ContentService::delete(&state, &identity, course_id, block_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stream a content block, honouring `Range`
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/contents/blocks/{block_id}/stream",
    params(
        ("course_id" = CourseId, Path, description = "Course id"),
        ("block_id" = ContentBlockId, Path, description = "Content block id"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. `bytes=0-1023`")
    ),
    responses(
        (status = 200, description = "Full content"),
        (status = 206, description = "Requested byte range"),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 403, description = "Course not purchased", body = ErrorResponse),
        (status = 404, description = "Course, block or file not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    ),
    tag = "Content",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(course_id = %course_id, block_id = %block_id))]
pub async fn stream_content(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((course_id, block_id)): Path<(CourseId, ContentBlockId)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // A header that is not valid ASCII is unparseable, not absent.
    let range = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    let delivery =
        ContentService::open_stream(&state, &identity, course_id, block_id, range).await?;

    let mut response = Response::builder()
        .header(header::CONTENT_TYPE, delivery.content_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, delivery.content_length());

    response = match delivery.span {
        Some(span) => response.status(StatusCode::PARTIAL_CONTENT).header(
            header::CONTENT_RANGE,
            span.content_range(delivery.total_length),
        ),
        None => response.status(StatusCode::OK),
    };

    let body = delivery
        .body
        .inspect_ok(|chunk| metrics::track_bytes_streamed(chunk.len()))
        .inspect_err(|_| metrics::track_transfer_failed());

    response
        .body(Body::from_stream(body))
        .map_err(AppError::internal)
}
