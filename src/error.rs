//! Nova Relay error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Nova Relay error type
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid local configuration (API key, phone number ID)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider rejected the request with a non-2xx status
    #[error("Vapi API error: {status} {body}")]
    Provider { status: u16, body: String },

    /// Network-level failure reaching the provider (timeout, connect, DNS)
    #[error("Request failed: {0}")]
    Transport(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Nova Relay operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status presented to the caller.
    ///
    /// Provider rejections mirror the provider's own status so clients can
    /// distinguish e.g. quota errors from relay-side failures; everything
    /// else is a 500-class response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // An upstream status outside the mappable range degrades to 502.
            Error::Provider { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        tracing::error!(%status, "{}", detail);
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
