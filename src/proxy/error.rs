// Request outcome errors, rendered as JSON bodies
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid messages format")]
    InvalidMessages,

    #[error("Invalid request format: {0}")]
    InvalidRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body could not be read (e.g. over the size limit)
    #[error("Invalid request body")]
    Body { status: StatusCode, message: String },

    #[error("{provider} API Error: {status}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
        endpoint: String,
    },

    #[error("Request timeout")]
    Timeout { provider: String, secs: u64 },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidMessages | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Body { status, .. } => *status,
            RelayError::Upstream { .. } | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(&self) -> Value {
        match self {
            RelayError::InvalidMessages | RelayError::MethodNotAllowed => {
                json!({ "error": self.to_string() })
            }
            RelayError::Body { message, .. } => json!({
                "error": self.to_string(),
                "message": message,
            }),
            RelayError::InvalidRequest(details) => json!({
                "error": "Invalid request format",
                "details": details,
            }),
            RelayError::Upstream { body, endpoint, .. } => json!({
                "error": self.to_string(),
                "details": body,
                "endpoint": endpoint,
            }),
            RelayError::Timeout { provider, secs } => json!({
                "error": "Request timeout",
                "message": format!(
                    "{} API took too long to respond (>{}s). Please try again.",
                    provider, secs
                ),
            }),
            RelayError::Internal(message) => json!({
                "error": "Internal server error",
                "message": message,
            }),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
