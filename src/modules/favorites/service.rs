use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CourseId, UserId};

use crate::modules::courses::service::{COURSE_COLUMNS, CourseService};

pub struct FavoriteService;

impl FavoriteService {
    /// Bookmark a course. Returns `false` when it was already bookmarked.
    #[instrument(skip(db))]
    pub async fn add_favorite(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, AppError> {
        CourseService::ensure_exists(db, course_id).await?;

        let result = sqlx::query(
            "INSERT INTO favorites (user_id, course_id) VALUES ($1, $2)
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(db))]
    pub async fn remove_favorite(
        db: &PgPool,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Course is not in favorites")));
        }

        Ok(())
    }

    /// Bookmarked courses, most recently added first.
    #[instrument(skip(db))]
    pub async fn list_favorites(db: &PgPool, user_id: UserId) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             JOIN favorites f ON f.course_id = courses.id
             WHERE f.user_id = $1
             ORDER BY f.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }
}
