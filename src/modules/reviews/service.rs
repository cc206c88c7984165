use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{CourseId, CourseReview, CreateReviewDto, OrderStatus, UserId};

use crate::metrics;
use crate::modules::courses::service::CourseService;

const REVIEW_COLUMNS: &str = "id, user_id, course_id, rating, comment, created_at";

pub struct ReviewService;

impl ReviewService {
    #[instrument(skip(db, dto), fields(rating = dto.rating))]
    pub async fn create_review(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
        dto: CreateReviewDto,
    ) -> Result<CourseReview, AppError> {
        CourseService::ensure_exists(db, course_id).await?;

        let purchased = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM orders WHERE user_id = $1 AND course_id = $2 AND status = $3
             )",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(OrderStatus::Paid)
        .fetch_one(db)
        .await?;

        if !purchased {
            return Err(AppError::forbidden(
                "You must purchase this course before reviewing it",
            ));
        }

        let mut tx = db.begin().await?;

        let review = sqlx::query_as::<_, CourseReview>(&format!(
            "INSERT INTO course_reviews (user_id, course_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(dto.rating)
        .bind(&dto.comment)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict(anyhow!("Course already reviewed"))
            }
            _ => AppError::database(e),
        })?;

        sqlx::query(
            "UPDATE courses SET
                rating_avg = COALESCE(
                    (SELECT ROUND(AVG(rating)::numeric, 2)::float8
                     FROM course_reviews WHERE course_id = $1),
                    0),
                rating_count = (SELECT COUNT(*)::int FROM course_reviews WHERE course_id = $1)
             WHERE id = $1",
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        metrics::track_review_created(review.rating);
        tracing::info!(review_id = %review.id, "review created");

        Ok(review)
    }

    /// Reviews of a course, newest first.
    #[instrument(skip(db))]
    pub async fn list_reviews(
        db: &PgPool,
        course_id: CourseId,
    ) -> Result<Vec<CourseReview>, AppError> {
        CourseService::ensure_exists(db, course_id).await?;

        let reviews = sqlx::query_as::<_, CourseReview>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM course_reviews
             WHERE course_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(course_id)
        .fetch_all(db)
        .await?;

        Ok(reviews)
    }

    #[instrument(skip(db))]
    pub async fn get_my_review(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseReview, AppError> {
        sqlx::query_as::<_, CourseReview>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM course_reviews WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("You have not reviewed this course")))
    }
}
