//! HTTP client for the calbot backend.

use std::time::Duration;

use calbot_protocol::{
    AvailabilityQuery, AvailabilityResponse, CreateEventRequest, CreatedEvent, ErrorBody,
    EventDetailsQuery, EventDetailsResponse, RunRequest, RunResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed access to the backend endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let mut base = Url::parse(base_url.trim())
            .map_err(|e| ClientError::config(format!("invalid backend URL '{base_url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "backend URL '{base_url}' must use http or https"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("calbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::config(format!("invalid endpoint {path}: {e}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "backend response");

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(ClientError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn availability(&self, query: &AvailabilityQuery) -> ClientResult<AvailabilityResponse> {
        let request = self.http.get(self.endpoint("availability")?).query(query);
        self.send(request).await
    }

    pub async fn create_event(&self, event: &CreateEventRequest) -> ClientResult<CreatedEvent> {
        let request = self.http.post(self.endpoint("events")?).json(event);
        self.send(request).await
    }

    pub async fn event_details(&self, query: &EventDetailsQuery) -> ClientResult<EventDetailsResponse> {
        let request = self.http.get(self.endpoint("event_details")?).query(query);
        self.send(request).await
    }

    /// Sends a prompt to the agent through the backend.
    pub async fn run(&self, prompt: impl Into<String>) -> ClientResult<RunResponse> {
        let request = self
            .http
            .post(self.endpoint("run")?)
            .json(&RunRequest::new(prompt));
        self.send(request).await
    }

    pub async fn health(&self) -> ClientResult<String> {
        let response = self.http.get(self.endpoint("health")?).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Backend {
                status: status.as_u16(),
                detail: body,
            });
        }
        Ok(body)
    }
}
