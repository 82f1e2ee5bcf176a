//! Agent configuration.

use std::net::SocketAddr;

use calbot_core::TracingOutputFormat;
use clap::Parser;
use url::Url;

use crate::error::{AgentError, AgentResult};
use crate::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, OpenAiConfig};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_AGENT_BIND: &str = "127.0.0.1:8001";
/// Older name of `CALBOT_BACKEND_URL`, honored when the new one is unset.
pub const LEGACY_BACKEND_ENV: &str = "FASTAPI_URL";

/// Command-line arguments of `calbot-agent`.
#[derive(Debug, Clone, Parser)]
#[command(name = "calbot-agent", version, about = "Calendar assistant agent for calbot")]
pub struct AgentArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "OPENAI_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Calendar backend the tools talk to
    #[arg(long, env = "CALBOT_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Address to listen on
    #[arg(long, env = "CALBOT_AGENT_BIND", default_value = DEFAULT_AGENT_BIND)]
    pub bind: SocketAddr,

    /// Maximum reasoning steps per prompt
    #[arg(long, env = "CALBOT_AGENT_MAX_STEPS", default_value_t = crate::agent::DEFAULT_MAX_STEPS)]
    pub max_steps: usize,

    /// Messages of conversation history to keep
    #[arg(long, env = "CALBOT_AGENT_MEMORY", default_value_t = crate::memory::DEFAULT_MEMORY_MESSAGES)]
    pub memory: usize,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "CALBOT_LOG_FORMAT", default_value = "compact")]
    pub log_format: TracingOutputFormat,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Validated agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub openai: OpenAiConfig,
    pub backend_url: Url,
    pub bind: SocketAddr,
    pub max_steps: usize,
    pub memory: usize,
}

impl AgentArgs {
    pub fn resolve(&self) -> AgentResult<AgentConfig> {
        self.resolve_with_legacy(std::env::var(LEGACY_BACKEND_ENV).ok())
    }

    /// Like [`resolve`](Self::resolve), with the legacy backend variable
    /// passed in.
    pub fn resolve_with_legacy(&self, legacy_backend_url: Option<String>) -> AgentResult<AgentConfig> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AgentError::config("OPENAI_API_KEY is not set"))?;

        if self.max_steps == 0 {
            return Err(AgentError::config("max steps must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        let backend = self
            .backend_url
            .clone()
            .or(legacy_backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = parse_service_url(&backend, "CALBOT_BACKEND_URL")?;
        parse_service_url(&self.openai_base_url, "OPENAI_BASE_URL")?;

        let openai = OpenAiConfig::new(api_key)
            .with_base_url(&self.openai_base_url)
            .with_model(&self.model)
            .with_temperature(self.temperature);

        Ok(AgentConfig {
            openai,
            backend_url,
            bind: self.bind,
            max_steps: self.max_steps,
            memory: self.memory,
        })
    }
}

fn parse_service_url(value: &str, name: &str) -> AgentResult<Url> {
    let url = Url::parse(value.trim())
        .map_err(|e| AgentError::config(format!("{name} '{value}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AgentError::config(format!("{name} '{value}' must use http or https")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> AgentArgs {
        let mut argv = vec!["calbot-agent"];
        argv.extend_from_slice(extra);
        AgentArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = args(&["--openai-api-key", "sk-test"])
            .resolve_with_legacy(None)
            .unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.temperature, 0.2);
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.backend_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.bind.to_string(), DEFAULT_AGENT_BIND);
        assert_eq!(config.max_steps, 6);
        assert_eq!(config.memory, 20);
    }

    #[test]
    fn api_key_is_required() {
        let err = args(&[]).resolve_with_legacy(None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let err = args(&["--openai-api-key", " "]).resolve_with_legacy(None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn legacy_backend_variable_is_a_fallback() {
        let legacy = Some("http://calendar:9000".to_string());

        let config = args(&["--openai-api-key", "sk"])
            .resolve_with_legacy(legacy.clone())
            .unwrap();
        assert_eq!(config.backend_url.as_str(), "http://calendar:9000/");

        let config = args(&["--openai-api-key", "sk", "--backend-url", "http://backend:8000"])
            .resolve_with_legacy(legacy)
            .unwrap();
        assert_eq!(config.backend_url.as_str(), "http://backend:8000/");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(
            args(&["--openai-api-key", "sk", "--max-steps", "0"])
                .resolve_with_legacy(None)
                .is_err()
        );
        assert!(
            args(&["--openai-api-key", "sk", "--temperature", "3.5"])
                .resolve_with_legacy(None)
                .is_err()
        );
        assert!(
            args(&["--openai-api-key", "sk", "--backend-url", "localhost"])
                .resolve_with_legacy(None)
                .is_err()
        );
    }
}
