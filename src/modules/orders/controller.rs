use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CreateOrderDto, Order};

use super::service::OrderService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::CurrentIdentity;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Place an order for a course
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderDto,
    responses(
        (status = 201, description = "Pending order created", body = Order),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course already purchased", body = ErrorResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id, course_id = %dto.course_id))]
pub async fn create_order(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    ValidatedJson(dto): ValidatedJson<CreateOrderDto>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = OrderService::create_order(&state.db, identity.user_id, dto.course_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<Order>),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn list_orders(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderService::list_orders(&state.db, identity.user_id).await?;
    Ok(Json(orders))
}

/// List courses the caller has paid for
#[utoipa::path(
    get,
    path = "/api/orders/courses",
    responses(
        (status = 200, description = "Purchased courses", body = Vec<Course>),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    tag = "Orders",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn list_purchased_courses(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = OrderService::list_purchased_courses(&state.db, identity.user_id).await?;
    Ok(Json(courses))
}
