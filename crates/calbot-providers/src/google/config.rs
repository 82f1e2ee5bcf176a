//! Google Calendar store configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for [`GoogleCalendarStore`](super::GoogleCalendarStore).
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Calendar to read and write, usually an email-like id.
    pub calendar_id: String,

    /// Path to the service-account JSON key.
    pub credentials_path: PathBuf,

    /// Timeout applied to every API and token request.
    pub timeout: Duration,

    /// Calendar API root. Overridden in tests.
    pub api_base: String,

    /// Token endpoint override. When unset the key file's `token_uri` is used.
    pub token_uri: Option<String>,

    pub user_agent: String,

    pub scopes: Vec<String>,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Read/write access to events and free/busy.
    pub const CALENDAR_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    pub fn new(calendar_id: impl Into<String>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            credentials_path: credentials_path.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            token_uri: None,
            user_agent: format!("calbot/{}", env!("CARGO_PKG_VERSION")),
            scopes: vec![Self::CALENDAR_SCOPE.to_string()],
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Checks the configuration without touching the network.
    pub fn validate(&self) -> Result<(), String> {
        if self.calendar_id.trim().is_empty() {
            return Err("calendar id is required".to_string());
        }
        if !self.credentials_path.is_file() {
            return Err(format!(
                "service account key not found at {}",
                self.credentials_path.display()
            ));
        }
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        Ok(())
    }
}

/// Returns the first candidate path that exists as a file.
pub fn first_existing<'a, I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    candidates
        .into_iter()
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}
