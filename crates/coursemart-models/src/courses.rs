//! Course structure: a course owns ordered modules, a module owns ordered
//! content blocks, and a block points at its stored bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{ContentBlockId, CourseId, ModuleId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub seller_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_published: bool,
    /// Mean review rating rounded to two decimals, 0 without reviews.
    pub rating_avg: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course with its module outline.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    /// Only courses by this seller
    pub seller_id: Option<UserId>,
    /// Defaults to published courses only
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseModule {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub position: i32,
}

/// A unit of deliverable content.
///
/// `content_url` is an opaque storage key, empty until a file is uploaded.
/// `block_type` is either a coarse kind ("video", "pdf") or a full MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContentBlock {
    pub id: ContentBlockId,
    pub module_id: ModuleId,
    pub title: String,
    pub block_type: String,
    pub content_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateContentBlockDto {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub block_type: Option<String>,
    #[validate(range(min = 0))]
    pub position: Option<i32>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i32>,
}

impl UpdateContentBlockDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.block_type.is_none()
            && self.position.is_none()
            && self.duration_seconds.is_none()
    }
}
