//! Agent error types.

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use calbot_core::TracingError;
use calbot_protocol::ErrorBody;
use thiserror::Error;
use tracing::error;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The language model call failed or answered with something unusable.
    #[error("Reasoner error: {0}")]
    Reasoner(String),

    /// The model kept calling tools without producing an answer.
    #[error("agent stopped after {0} steps without a final answer")]
    MaxSteps(usize),

    #[error("{0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Logging setup failed: {0}")]
    Tracing(#[from] TracingError),
}

impl AgentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn reasoner(message: impl Into<String>) -> Self {
        Self::Reasoner(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "run failed: {self}");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
