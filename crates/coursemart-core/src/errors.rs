//! Application error types.
//!
//! [`AppError`] is what every handler returns. It carries an HTTP status, a
//! machine-readable [`ErrorCode`] and the underlying [`anyhow::Error`].
//!
//! [`DeliveryError`] is the taxonomy of the content delivery path. It converts
//! into an [`AppError`] through the blanket `From` impl without losing its
//! status or code, so `?` can be used freely in handlers.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// Machine-readable error code included in every error body.
///
/// Callers branch on this instead of parsing the free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    UnprocessableEntity,
    RangeNotSatisfiable,
    IoFailure,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::PayloadTooLarge => "payload_too_large",
            Self::UnprocessableEntity => "unprocessable_entity",
            Self::RangeNotSatisfiable => "range_not_satisfiable",
            Self::IoFailure => "io_failure",
            Self::Internal => "internal",
        }
    }

    /// Default code for a status when no more specific one is known.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest,
            StatusCode::UNAUTHORIZED => Self::Unauthenticated,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::Conflict,
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            StatusCode::UNPROCESSABLE_ENTITY => Self::UnprocessableEntity,
            StatusCode::RANGE_NOT_SATISFIABLE => Self::RangeNotSatisfiable,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the access gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No paid order exists for the (user, course) pair.
    NotPurchased,
    /// The caller neither owns the course nor is an admin.
    NotOwner,
    /// No rule in the chain reached a decision.
    NoApplicableRule,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPurchased => f.write_str("course has not been purchased"),
            Self::NotOwner => f.write_str("only the course owner or an admin may do this"),
            Self::NoApplicableRule => f.write_str("no access rule permits this request"),
        }
    }
}

/// Failures of the content access and delivery path.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("access denied: {0}")]
    Forbidden(DenyReason),

    #[error("requested range not satisfiable (resource is {total_length} bytes)")]
    RangeNotSatisfiable { total_length: u64 },

    #[error("content store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl DeliveryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::RangeNotSatisfiable { .. } => ErrorCode::RangeNotSatisfiable,
            Self::Io(_) => ErrorCode::IoFailure,
            Self::Store(_) => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Io(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wraps a persistence failure raised while resolving delivery inputs.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::Store(err.into())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Self::RangeNotSatisfiable { total_length } = self
            && let Ok(value) = HeaderValue::from_str(&format!("bytes */{total_length}"))
        {
            headers.insert(header::CONTENT_RANGE, value);
        }
        headers
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub error: Error,
    pub headers: HeaderMap,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code: ErrorCode::from_status(status),
            error: err.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::internal(anyhow::anyhow!(message.into()))
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.code, error = ?self.error, "request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string(),
            "code": self.code,
        }));

        (self.status, self.headers, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let parts = error
            .downcast_ref::<DeliveryError>()
            .map(|delivery| (delivery.status(), delivery.code(), delivery.headers()));

        match parts {
            Some((status, code, headers)) => Self {
                status,
                code,
                error,
                headers,
            },
            None => AppError::internal(error),
        }
    }
}
