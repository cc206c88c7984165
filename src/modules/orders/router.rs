use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_order, list_orders, list_purchased_courses};

pub fn init_orders_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/courses", get(list_purchased_courses))
}
