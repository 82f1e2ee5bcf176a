//! Error types for calendar store operations.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Why a store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials were rejected or the token exchange failed.
    Unauthenticated,
    /// The service account cannot access the calendar.
    Forbidden,
    /// Connection failure or timeout.
    Unreachable,
    RateLimited,
    /// 5xx or any status without a more specific code.
    Upstream,
    /// The response body could not be decoded.
    InvalidResponse,
    NotFound,
    /// The API refused the request as malformed.
    Rejected,
    /// Missing or malformed local setup: credential file, calendar id.
    Configuration,
    /// A per-calendar error inside an otherwise valid reply.
    Calendar,
    Internal,
}

impl ProviderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Upstream => "upstream",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::Configuration => "configuration",
            Self::Calendar => "calendar",
            Self::Internal => "internal",
        }
    }

    /// Code for a non-success Google API status.
    pub fn for_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthenticated,
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::BAD_REQUEST => Self::Rejected,
            _ => Self::Upstream,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a [`CalendarStore`](crate::CalendarStore).
///
/// Displays as `[store] code: message`, the text the backend returns in
/// `detail` for upstream failures.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Unauthenticated, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Forbidden, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Unreachable, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Upstream, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Configuration, message)
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Calendar, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    /// Maps a transport failure from reqwest.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let what = match (err.is_timeout(), err.is_connect()) {
            (true, _) => "timed out",
            (_, true) => "could not connect",
            _ => "request failed",
        };
        Self::network(format!("{what}: {err}")).with_source(err)
    }

    /// Maps a non-success HTTP status, keeping the body for diagnosis.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("API returned {status}")
        } else {
            format!("API returned {status}: {body}")
        };
        Self::new(ProviderErrorCode::for_status(status), message)
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Local setup problem rather than a remote failure.
    pub fn is_configuration(&self) -> bool {
        self.code == ProviderErrorCode::Configuration
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "[{provider}] {}: {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
