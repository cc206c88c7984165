use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CourseId};

use super::service::FavoriteService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::CurrentIdentity;
use crate::state::AppState;

/// Add a course to the caller's favorites
///
/// Adding a course twice is not an error.
#[utoipa::path(
    post,
    path = "/api/favorites/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 201, description = "Added to favorites"),
        (status = 200, description = "Already a favorite"),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Favorites",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id, course_id = %course_id))]
pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    let added = FavoriteService::add_favorite(&state.db, identity.user_id, course_id).await?;
    Ok(if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

/// Remove a course from the caller's favorites
#[utoipa::path(
    delete,
    path = "/api/favorites/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 404, description = "Course is not a favorite", body = ErrorResponse)
    ),
    tag = "Favorites",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id, course_id = %course_id))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(course_id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    FavoriteService::remove_favorite(&state.db, identity.user_id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's favorite courses
#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "Favorite courses, most recent first", body = Vec<Course>),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    tag = "Favorites",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn list_favorites(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = FavoriteService::list_favorites(&state.db, identity.user_id).await?;
    Ok(Json(courses))
}
