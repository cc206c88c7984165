use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_review, get_my_review, list_reviews};

pub fn init_reviews_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/me", get(get_my_review))
}
