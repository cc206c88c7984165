use anyhow::anyhow;
use sqlx::PgPool;
use tracing::instrument;

use coursemart_core::AppError;
use coursemart_models::{Course, CourseDetail, CourseFilterParams, CourseId, CourseModule};

/// Columns of a [`Course`] row, qualified by table name.
pub const COURSE_COLUMNS: &str = "courses.id, courses.seller_id, courses.title, \
     courses.description, courses.price, courses.is_published, courses.rating_avg, \
     courses.rating_count, courses.created_at, courses.updated_at";

pub struct CourseService;

impl CourseService {
    /// Catalog listing, newest first. Unpublished courses only show up when
    /// asked for explicitly.
    #[instrument(skip(db))]
    pub async fn list_courses(
        db: &PgPool,
        filters: &CourseFilterParams,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses
             WHERE ($1::uuid IS NULL OR courses.seller_id = $1)
               AND courses.is_published = $2
             ORDER BY courses.created_at DESC"
        ))
        .bind(filters.seller_id)
        .bind(filters.is_published.unwrap_or(true))
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, course_id: CourseId) -> Result<CourseDetail, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE courses.id = $1"
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;

        let modules = sqlx::query_as::<_, CourseModule>(
            "SELECT id, course_id, title, position FROM course_modules
             WHERE course_id = $1
             ORDER BY position, title",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        Ok(CourseDetail { course, modules })
    }

    pub async fn ensure_exists(db: &PgPool, course_id: CourseId) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
                .bind(course_id)
                .fetch_one(db)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::not_found(anyhow!("Course not found")))
        }
    }
}
