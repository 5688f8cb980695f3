use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{bookmark::BookmarkRecord, response::ErrorResponse};

pub type Result<T> = std::result::Result<T, AppError>;

/// Input rejected before any upstream call is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("start_date and end_date must be given together")]
    IncompleteRange,

    #[error("invalid {field}: '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("end_date {end} is before start_date {start}")]
    InvertedRange { start: String, end: String },

    #[error("date range cannot exceed {max} days, got {days} days")]
    RangeTooLarge { days: i64, max: i64 },

    #[error("url is required")]
    MissingUrl,

    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    #[error("title is required")]
    MissingTitle,

    #[error("title cannot exceed {max} characters")]
    TitleTooLong { max: usize },

    #[error("{0} is required")]
    MissingTag(&'static str),

    #[error("invalid tag '{0}': tags cannot contain whitespace or commas")]
    InvalidTag(String),

    #[error("at most {max} tags can be used as a filter, got {count}")]
    TooManyTags { count: usize, max: usize },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("No changes requested: at least one of title, description, tags, private, to_read is required")]
    NoChangesRequested,

    #[error("Old and new tag are identical: {0}")]
    IdenticalTag(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Update failed for {}: {}", .original.url, .reason)]
    UpdateFailed {
        original: Box<BookmarkRecord>,
        reason: String,
    },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code relayed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BookmarkNotFound(_) => "BOOKMARK_NOT_FOUND",
            AppError::TagNotFound(_) => "TAG_NOT_FOUND",
            AppError::NoChangesRequested => "NO_CHANGES_REQUESTED",
            AppError::IdenticalTag(_) => "IDENTICAL_TAG",
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::UpdateFailed { .. } => "UPDATE_FAILED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::UnknownTool(_) => "UNKNOWN_TOOL",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::NoChangesRequested
            | AppError::IdenticalTag(_) => StatusCode::BAD_REQUEST,
            AppError::BookmarkNotFound(_)
            | AppError::TagNotFound(_)
            | AppError::UnknownTool(_) => StatusCode::NOT_FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Network(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpdateFailed { .. } | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Network(msg) => tracing::warn!("Network error: {}", msg),
            AppError::Upstream(msg) => tracing::warn!("Upstream error: {}", msg),
            AppError::UpdateFailed { reason, .. } => tracing::error!("Update failed: {}", reason),
            _ => tracing::debug!("Request failed: {}", self),
        }

        let body = match &self {
            AppError::UpdateFailed { original, .. } => ErrorResponse::with_details(
                self.code().to_string(),
                self.to_string(),
                json!({ "original": original }),
            ),
            _ => ErrorResponse::new(self.code().to_string(), self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", err))
    }
}
