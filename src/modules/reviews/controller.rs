use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{CourseId, CourseReview, CreateReviewDto};

use super::service::ReviewService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::CurrentIdentity;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Review a purchased course
#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/reviews",
    params(("course_id" = CourseId, Path, description = "Course id")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = CourseReview),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 403, description = "Course not purchased", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course already reviewed", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id, course_id = %course_id))]
pub async fn create_review(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(course_id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<CourseReview>), AppError> {
    let review = ReviewService::create_review(&state.db, identity.user_id, course_id, dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// List a course's reviews
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/reviews",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<CourseReview>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Vec<CourseReview>>, AppError> {
    let reviews = ReviewService::list_reviews(&state.db, course_id).await?;
    Ok(Json(reviews))
}

/// The caller's review of a course
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/reviews/me",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 200, description = "The caller's review", body = CourseReview),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 404, description = "No review yet", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id, course_id = %course_id))]
pub async fn get_my_review(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(course_id): Path<CourseId>,
) -> Result<Json<CourseReview>, AppError> {
    let review = ReviewService::get_my_review(&state.db, identity.user_id, course_id).await?;
    Ok(Json(review))
}
