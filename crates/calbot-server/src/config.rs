//! Backend configuration.
//!
//! Every setting is a flag with an environment fallback. `.env` files are
//! loaded by `main` before parsing. [`BackendArgs::resolve`] turns the raw
//! arguments into a [`ServerConfig`], failing on anything that would make
//! the backend unusable.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use calbot_core::TracingOutputFormat;
use calbot_providers::google::{GoogleConfig, first_existing};
use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Where the service-account key is looked up when none is given.
pub const DEFAULT_CREDENTIALS_PATH: &str = "/etc/secrets/calendar-bot-sa.json";
/// Checked after [`DEFAULT_CREDENTIALS_PATH`].
pub const FALLBACK_CREDENTIALS_PATH: &str = "./credentials/calendar-bot-sa.json";

pub const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Timeout for forwarding `/run` to the agent.
pub const AGENT_TIMEOUT: Duration = Duration::from_secs(60);
/// Requests still running after this are answered with 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Which calendar store to serve from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Google Calendar through a service account.
    #[default]
    Google,
    /// Empty in-process calendar, for local demos.
    Memory,
}

/// Command-line arguments of `calbot-backend`.
#[derive(Debug, Clone, Parser)]
#[command(name = "calbot-backend", version, about = "Calendar backend for calbot")]
pub struct BackendArgs {
    /// Calendar to serve
    #[arg(long, env = "GOOGLE_CALENDAR_ID")]
    pub calendar_id: Option<String>,

    /// Service-account JSON key
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_FILE")]
    pub credentials: Option<PathBuf>,

    /// Base URL of the agent service
    #[arg(long, env = "AGENT_URL", default_value = DEFAULT_AGENT_URL)]
    pub agent_url: String,

    /// Address to listen on
    #[arg(long, env = "CALBOT_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "CALBOT_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingOutputFormat,

    /// Calendar store backend
    #[arg(long, env = "CALBOT_STORE", value_enum, default_value_t = StoreKind::Google)]
    pub store: StoreKind,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Store settings after validation.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Google(GoogleConfig),
    Memory { calendar_id: String },
}

/// Validated backend configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store: StoreConfig,
    pub agent_url: Url,
    pub bind: SocketAddr,
    pub agent_timeout: Duration,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(store: StoreConfig, agent_url: Url) -> Self {
        Self {
            store,
            agent_url,
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            agent_timeout: AGENT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    #[must_use]
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }
}

impl BackendArgs {
    /// Validates the arguments.
    ///
    /// The Google store needs a calendar id and an existing key file. When
    /// no key path is given the default and fallback locations are tried
    /// in order.
    pub fn resolve(&self) -> ServerResult<ServerConfig> {
        let agent_url = parse_service_url(&self.agent_url, "AGENT_URL")?;
        let calendar_id = self
            .calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let store = match self.store {
            StoreKind::Memory => StoreConfig::Memory {
                calendar_id: calendar_id.unwrap_or("memory").to_string(),
            },
            StoreKind::Google => {
                let calendar_id = calendar_id
                    .ok_or_else(|| ServerError::config("GOOGLE_CALENDAR_ID is not set"))?;
                let credentials = resolve_credentials(self.credentials.as_deref())?;
                StoreConfig::Google(GoogleConfig::new(calendar_id, credentials))
            }
        };

        Ok(ServerConfig::new(store, agent_url).with_bind(self.bind))
    }
}

fn resolve_credentials(explicit: Option<&Path>) -> ServerResult<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ServerError::config(format!(
            "service account file not found at {}",
            path.display()
        )));
    }

    first_existing([
        Path::new(DEFAULT_CREDENTIALS_PATH),
        Path::new(FALLBACK_CREDENTIALS_PATH),
    ])
    .ok_or_else(|| {
        ServerError::config(format!(
            "service account file not found at {DEFAULT_CREDENTIALS_PATH} or {FALLBACK_CREDENTIALS_PATH}; \
             set GOOGLE_SERVICE_ACCOUNT_FILE"
        ))
    })
}

/// Parses an http(s) base URL.
pub fn parse_service_url(value: &str, name: &str) -> ServerResult<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| ServerError::config(format!("{name} '{value}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServerError::config(format!(
            "{name} '{value}' must use http or https"
        )));
    }
    Ok(url)
}
