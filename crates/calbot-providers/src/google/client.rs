//! Google Calendar API v3 client.
//!
//! Thin wrapper over the four endpoints the backend uses: `calendars.get`,
//! `freeBusy.query`, `events.insert` and `events.list`. Authentication is
//! delegated to an [`AccessTokenSource`].

use std::collections::HashMap;
use std::sync::Arc;

use calbot_core::{TimeWindow, format_utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::AccessTokenSource;
use super::config::GoogleConfig;
use crate::error::{ProviderError, ProviderResult};

/// Google Calendar API client.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl std::fmt::Debug for GoogleCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendarClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GoogleCalendarClient {
    pub fn new(
        http_client: reqwest::Client,
        api_base: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into(),
            tokens,
        }
    }

    /// Builds the shared HTTP client for a configuration.
    pub fn http_client(config: &GoogleConfig) -> ProviderResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {e}")))
    }

    fn calendar_url(&self, calendar_id: &str, suffix: &str) -> String {
        format!(
            "{}/calendars/{}{}",
            self.api_base,
            urlencoding::encode(calendar_id),
            suffix
        )
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ProviderResult<T> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {e}")))
    }

    /// `GET /calendars/{id}`.
    pub async fn get_calendar(&self, calendar_id: &str) -> ProviderResult<ApiCalendar> {
        let request = self.http_client.get(self.calendar_url(calendar_id, ""));
        self.execute(request).await
    }

    /// `POST /freeBusy` for a single calendar.
    pub async fn free_busy(&self, calendar_id: &str, window: &TimeWindow) -> ProviderResult<Vec<ApiTimePeriod>> {
        let body = FreeBusyRequest {
            time_min: format_utc(&window.start),
            time_max: format_utc(&window.end),
            items: vec![FreeBusyItem {
                id: calendar_id.to_string(),
            }],
        };
        let request = self
            .http_client
            .post(format!("{}/freeBusy", self.api_base))
            .json(&body);

        let mut response: FreeBusyResponse = self.execute(request).await?;
        let calendar = response.calendars.remove(calendar_id).ok_or_else(|| {
            ProviderError::invalid_response(format!("calendar {calendar_id} missing from freeBusy response"))
        })?;

        if let Some(error) = calendar.errors.first() {
            return Err(ProviderError::calendar(format!(
                "freeBusy failed for {calendar_id}: {} ({})",
                error.reason, error.domain
            )));
        }

        debug!(calendar_id, busy = calendar.busy.len(), "fetched free/busy");
        Ok(calendar.busy)
    }

    /// `POST /calendars/{id}/events`.
    pub async fn insert_event(&self, calendar_id: &str, event: &ApiEventInsert) -> ProviderResult<ApiEvent> {
        let request = self
            .http_client
            .post(self.calendar_url(calendar_id, "/events"))
            .json(event);
        self.execute(request).await
    }

    /// `GET /calendars/{id}/events`, following every page.
    ///
    /// Recurring events are expanded and results ordered by start time.
    pub async fn list_events(&self, calendar_id: &str, window: &TimeWindow) -> ProviderResult<Vec<ApiEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", format_utc(&window.start)),
                ("timeMax", format_utc(&window.end)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let request = self
                .http_client
                .get(self.calendar_url(calendar_id, "/events"))
                .query(&query);
            let page: EventListResponse = self.execute(request).await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(calendar_id, count = events.len(), "listed events");
        Ok(events)
    }
}

/// Calendar resource from `calendars.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest {
    time_min: String,
    time_max: String,
    items: Vec<FreeBusyItem>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<ApiTimePeriod>,
    #[serde(default)]
    errors: Vec<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyError {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

/// A busy period as reported by `freeBusy.query`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiTimePeriod {
    pub start: String,
    pub end: String,
}

/// Start or end of an event on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Body of `events.insert`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEventInsert {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: ApiEventTime,
    pub end: ApiEventTime,
}

/// An event resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub html_link: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub start: ApiEventTime,
    #[serde(default)]
    pub end: ApiEventTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}
