use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_course, list_courses};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/{course_id}", get(get_course))
}
