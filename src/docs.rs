use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use coursemart_core::{ErrorCode, UserRole};
use coursemart_models::{
    ContentBlock, ContentBlockId, Course, CourseDetail, CourseId, CourseModule, CourseReview,
    CreateOrderDto, CreateReviewDto, LoginRequest, Order, OrderStatus, RegisterRequest,
    TokenResponse, UpdateContentBlockDto, UserId, UserProfile,
};

/// Body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::get_me,
        crate::modules::orders::controller::create_order,
        crate::modules::orders::controller::list_orders,
        crate::modules::orders::controller::list_purchased_courses,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::reviews::controller::create_review,
        crate::modules::reviews::controller::list_reviews,
        crate::modules::reviews::controller::get_my_review,
        crate::modules::favorites::controller::add_favorite,
        crate::modules::favorites::controller::remove_favorite,
        crate::modules::favorites::controller::list_favorites,
        crate::modules::content::controller::list_contents,
        crate::modules::content::controller::upload_content,
        crate::modules::content::controller::update_content,
        crate::modules::content::controller::delete_content,
        crate::modules::content::controller::stream_content,
    ),
    components(
        schemas(
            ErrorResponse,
            ErrorCode,
            UserRole,
            UserId,
            CourseId,
            ContentBlockId,
            UserProfile,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            Course,
            CourseDetail,
            CourseModule,
            CourseReview,
            CreateReviewDto,
            ContentBlock,
            UpdateContentBlockDto,
            Order,
            OrderStatus,
            CreateOrderDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and profile"),
        (name = "Courses", description = "Public course catalog"),
        (name = "Orders", description = "Course purchases"),
        (name = "Reviews", description = "Ratings of purchased courses"),
        (name = "Favorites", description = "Bookmarked courses"),
        (name = "Content", description = "Course content management and streaming")
    ),
    info(
        title = "Coursemart API",
        version = "0.1.0",
        description = "Course marketplace API: gated content delivery with byte-range streaming.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_content_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/courses/{course_id}/contents"));
        assert!(paths.contains_key("/api/courses/{course_id}/contents/blocks/{block_id}/stream"));
        assert!(paths.contains_key("/api/auth/login"));
        assert!(paths.contains_key("/api/orders"));
    }

    #[test]
    fn test_openapi_lists_catalog_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/courses"));
        assert!(paths.contains_key("/api/courses/{course_id}"));
        assert!(paths.contains_key("/api/courses/{course_id}/reviews"));
        assert!(paths.contains_key("/api/courses/{course_id}/reviews/me"));
        assert!(paths.contains_key("/api/favorites"));
        assert!(paths.contains_key("/api/favorites/{course_id}"));
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
