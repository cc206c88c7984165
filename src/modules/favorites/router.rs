use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{add_favorite, list_favorites, remove_favorite};

pub fn init_favorites_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/{course_id}", post(add_favorite).delete(remove_favorite))
}
