//! Forwarding of `/run` prompts to the agent service.

use std::time::Duration;

use calbot_protocol::RunRequest;
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ServerError, ServerResult};

/// HTTP client for the agent's `POST /run`.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    run_url: Url,
}

impl AgentClient {
    pub fn new(base: &Url, timeout: Duration) -> ServerResult<Self> {
        let run_url = base
            .join("run")
            .map_err(|e| ServerError::config(format!("invalid agent URL {base}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, run_url })
    }

    pub fn run_url(&self) -> &Url {
        &self.run_url
    }

    /// Sends a prompt and returns the agent's JSON body untouched.
    pub async fn run(&self, prompt: String) -> Result<serde_json::Value, ApiError> {
        debug!(url = %self.run_url, "forwarding prompt to agent");
        let response = self
            .http
            .post(self.run_url.clone())
            .json(&RunRequest::new(prompt))
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("agent unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::upstream(format!("agent returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("agent sent an invalid response: {e}")))
    }
}

/// Prepends the current UTC time so the agent can resolve relative dates.
pub fn contextualize(prompt: &str, now: DateTime<Utc>) -> String {
    format!(
        "Current UTC date and time is {}.\n{prompt}",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}
