use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tress_core::TressError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Job not found")]
    JobNotFound,

    #[error("Job still running")]
    NotReady,

    #[error("Too many running jobs (max {max})")]
    Busy { max: usize },

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Unsupported image format (expected PNG or JPEG)")]
    UnsupportedFormat,

    #[error("Image too large: {width}x{height} (max {max} per side)")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Scan error: {0}")]
    Scan(#[from] TressError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// Whether the caller supplied something unusable, as opposed to a
    /// failure on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FilterError::Decode(_)
                | FilterError::UnsupportedFormat
                | FilterError::ImageTooLarge { .. }
                | FilterError::Scan(_)
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::JobNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::NotReady => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Busy { .. } => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Filter(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Filter(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": message,
        }));

        (status, body).into_response()
    }
}
