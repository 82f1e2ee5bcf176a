//! Logging setup shared by the backend, the agent and the chat client.
//!
//! ```ignore
//! use calbot_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::service())?;
//! ```
//!
//! `RUST_LOG` overrides the default directive when it is set. Every format
//! writes to stderr so the chat client keeps stdout for the conversation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("logging is already initialised: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("unknown log format '{0}' (expected pretty, compact or json)")]
    UnknownFormat(String),
}

/// Shape of emitted log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, for a developer terminal.
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, for log collectors.
    Json,
}

impl TracingOutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        [Self::Pretty, Self::Compact, Self::Json]
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or(TracingError::UnknownFormat(wanted))
    }
}

impl fmt::Display for TracingOutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`init_tracing`] installs.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for calbot crates and the HTTP layer when `RUST_LOG` is unset.
    pub level: Level,
    pub format: TracingOutputFormat,
    /// File and line of the call site.
    pub show_location: bool,
    pub show_target: bool,
    pub show_time: bool,
    /// Log span open and close, which makes request spans visible.
    pub span_events: bool,
    /// Explicit filter directive, wins over `RUST_LOG`.
    pub directive: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::service().with_format(TracingOutputFormat::Pretty)
    }
}

impl TracingConfig {
    /// Long-running HTTP services.
    #[must_use]
    pub fn service() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Compact,
            show_location: false,
            show_target: true,
            show_time: true,
            span_events: false,
            directive: None,
        }
    }

    /// The interactive client. Warnings only, so log lines do not
    /// interleave with the conversation.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            level: Level::WARN,
            show_target: false,
            show_time: false,
            ..Self::service()
        }
    }

    /// Client output with `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            show_location: true,
            show_target: true,
            ..Self::cli()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    /// Directive used when neither `directive` nor `RUST_LOG` is set.
    pub fn default_directive(&self) -> String {
        format!("calbot={level},tower_http={level}", level = self.level)
    }

    fn filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(directive) = &self.directive {
            return Ok(EnvFilter::try_new(directive)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive())))
    }

    fn output_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.show_location)
            .with_line_number(self.show_location)
            .with_target(self.show_target)
            .with_span_events(spans);

        match (self.format, self.show_time) {
            (TracingOutputFormat::Pretty, _) => layer.pretty().boxed(),
            (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
            (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
            (TracingOutputFormat::Json, _) => layer.json().boxed(),
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the directive does not
/// parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.filter()?;
    let subscriber = tracing_subscriber::registry()
        .with(config.output_layer())
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
