use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CourseDetail, CourseFilterParams, CourseId};

use super::service::CourseService;
use crate::docs::ErrorResponse;
use crate::state::AppState;

/// Browse the course catalog
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Courses, newest first", body = Vec<Course>)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::list_courses(&state.db, &filters).await?;
    Ok(Json(courses))
}

/// Course details with its module outline
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(("course_id" = CourseId, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course details", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
) -> Result<Json<CourseDetail>, AppError> {
    let course = CourseService::get_course(&state.db, course_id).await?;
    Ok(Json(course))
}
