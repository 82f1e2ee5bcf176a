//! Server error types.
//!
//! [`ServerError`] covers startup and is fatal. [`ApiError`] is what request
//! handlers return and is rendered as `{"detail": ...}`.

use std::io;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use calbot_core::{IntervalError, RangeError, TracingError};
use calbot_protocol::{ErrorBody, ValidationError};
use calbot_providers::ProviderError;
use thiserror::Error;
use tracing::{error, warn};

/// Result type for server startup.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the backend before or while it serves.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The calendar could not be reached with the configured credentials.
    #[error("Calendar store unavailable: {0}")]
    Store(#[from] ProviderError),

    #[error("Logging setup failed: {0}")]
    Tracing(#[from] TracingError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}

/// Error returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller sent something we cannot act on.
    #[error("{0}")]
    BadRequest(String),

    /// The calendar or the agent failed.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::BadRequest(message) => warn!(%status, "rejected request: {message}"),
            Self::Upstream(message) => error!(%status, "upstream failure: {message}"),
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<IntervalError> for ApiError {
    fn from(err: IntervalError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
