use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CourseId, Order, OrderStatus, UserId};

use crate::metrics;
use crate::modules::courses::service::COURSE_COLUMNS;

const ORDER_COLUMNS: &str = "id, user_id, course_id, price, status, created_at, updated_at";

pub struct OrderService;

impl OrderService {
    #[instrument(skip(db))]
    pub async fn create_order(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Order, AppError> {
        let price = sqlx::query_scalar::<_, f64>("SELECT price FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;

        let already_paid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM orders WHERE user_id = $1 AND course_id = $2 AND status = $3
             )",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(OrderStatus::Paid)
        .fetch_one(db)
        .await?;

        if already_paid {
            return Err(AppError::conflict(anyhow!("Course already purchased")));
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, course_id, price, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(price)
        .bind(OrderStatus::Pending)
        .fetch_one(db)
        .await?;

        metrics::track_order_created();
        tracing::info!(order_id = %order.id, "order created");

        Ok(order)
    }

    /// The caller's orders, newest first.
    #[instrument(skip(db))]
    pub async fn list_orders(db: &PgPool, user_id: UserId) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(orders)
    }

    /// Courses the caller holds at least one paid order for.
    #[instrument(skip(db))]
    pub async fn list_purchased_courses(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE EXISTS (
                SELECT 1 FROM orders o
                WHERE o.course_id = courses.id AND o.user_id = $1 AND o.status = $2
             )
             ORDER BY courses.title"
        ))
        .bind(user_id)
        .bind(OrderStatus::Paid)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }
}
