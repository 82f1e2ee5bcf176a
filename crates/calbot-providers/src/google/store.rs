//! [`CalendarStore`] backed by Google Calendar.

use std::sync::Arc;

use calbot_core::{Interval, TimeWindow, format_utc};
use calbot_protocol::{CreatedEvent, EventDetails, EventTime};
use tracing::{info, warn};

use super::auth::{AccessTokenSource, ServiceAccountKey, ServiceAccountTokenSource};
use super::client::{ApiEvent, ApiEventInsert, ApiEventTime, ApiTimePeriod, GoogleCalendarClient};
use super::config::GoogleConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::store::{BoxFuture, CalendarInfo, CalendarStore, NewEvent};

const PROVIDER_NAME: &str = "google";

/// Google Calendar store for one calendar, authenticated as a service
/// account.
#[derive(Debug)]
pub struct GoogleCalendarStore {
    calendar_id: String,
    client: GoogleCalendarClient,
}

impl GoogleCalendarStore {
    /// Loads the service-account key and prepares the API client.
    ///
    /// No network traffic happens here; call
    /// [`verify_access`](CalendarStore::verify_access) to check the calendar.
    pub fn from_config(config: &GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(PROVIDER_NAME))?;

        let key = ServiceAccountKey::from_file(&config.credentials_path)
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        let http = GoogleCalendarClient::http_client(config)?;

        let mut tokens = ServiceAccountTokenSource::new(key, config.scopes.clone(), http.clone());
        if let Some(uri) = &config.token_uri {
            tokens = tokens.with_token_uri(uri);
        }
        info!(
            calendar_id = %config.calendar_id,
            account = %tokens.client_email(),
            "configured Google Calendar store"
        );

        Ok(Self::with_token_source(config, http, Arc::new(tokens)))
    }

    /// Builds a store around an existing token source.
    pub fn with_token_source(
        config: &GoogleConfig,
        http: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            calendar_id: config.calendar_id.clone(),
            client: GoogleCalendarClient::new(http, config.api_base.clone(), tokens),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    async fn fetch_busy(&self, window: TimeWindow) -> ProviderResult<Vec<Interval>> {
        let periods = self.client.free_busy(&self.calendar_id, &window).await?;
        Ok(periods.iter().filter_map(to_interval).collect())
    }

    async fn create(&self, event: NewEvent) -> ProviderResult<CreatedEvent> {
        let body = ApiEventInsert {
            summary: event.title.clone(),
            description: event.description.clone(),
            start: ApiEventTime {
                date_time: Some(format_utc(&event.start())),
                ..Default::default()
            },
            end: ApiEventTime {
                date_time: Some(format_utc(&event.end())),
                ..Default::default()
            },
        };

        let created = self.client.insert_event(&self.calendar_id, &body).await?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::invalid_response("inserted event has no id"))?;
        info!(event_id = %id, title = %event.title, "created event");

        Ok(CreatedEvent {
            id,
            html_link: created.html_link.unwrap_or_default(),
            summary: created.summary.unwrap_or(event.title),
            start: to_event_time(created.start),
            end: to_event_time(created.end),
        })
    }

    async fn fetch_events(&self, window: TimeWindow) -> ProviderResult<Vec<EventDetails>> {
        let events = self.client.list_events(&self.calendar_id, &window).await?;
        Ok(events.into_iter().filter_map(to_details).collect())
    }
}

impl CalendarStore for GoogleCalendarStore {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn verify_access(&self) -> BoxFuture<'_, ProviderResult<CalendarInfo>> {
        Box::pin(async move {
            let calendar = self
                .client
                .get_calendar(&self.calendar_id)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))?;
            let mut info = CalendarInfo::new(calendar.id, calendar.summary);
            info.time_zone = calendar.time_zone;
            Ok(info)
        })
    }

    fn free_busy(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Interval>>> {
        Box::pin(async move { self.fetch_busy(window).await.map_err(|e| e.with_provider(PROVIDER_NAME)) })
    }

    fn insert_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        Box::pin(async move { self.create(event).await.map_err(|e| e.with_provider(PROVIDER_NAME)) })
    }

    fn list_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<EventDetails>>> {
        Box::pin(async move { self.fetch_events(window).await.map_err(|e| e.with_provider(PROVIDER_NAME)) })
    }
}

/// Converts a busy period, dropping entries that do not form a valid
/// interval. Zero-length periods (start == end) are dropped too, as an
/// [`Interval`] needs start < end.
fn to_interval(period: &ApiTimePeriod) -> Option<Interval> {
    Interval::parse(&period.start, &period.end)
        .map_err(|e| warn!(start = %period.start, end = %period.end, "skipping busy period: {e}"))
        .ok()
}

fn to_event_time(time: ApiEventTime) -> EventTime {
    EventTime {
        date_time: time.date_time,
        date: time.date,
        time_zone: time.time_zone,
    }
}

fn to_details(event: ApiEvent) -> Option<EventDetails> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }
    Some(EventDetails {
        summary: event.summary.unwrap_or_default(),
        start: to_event_time(event.start),
        end: to_event_time(event.end),
        description: event.description.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_busy_periods_are_dropped() {
        let good = ApiTimePeriod {
            start: "2025-07-03T09:00:00Z".to_string(),
            end: "2025-07-03T10:00:00Z".to_string(),
        };
        let inverted = ApiTimePeriod {
            start: "2025-07-03T10:00:00Z".to_string(),
            end: "2025-07-03T09:00:00Z".to_string(),
        };
        let zero_length = ApiTimePeriod {
            start: "2025-07-03T11:00:00Z".to_string(),
            end: "2025-07-03T11:00:00Z".to_string(),
        };
        let garbage = ApiTimePeriod {
            start: "soon".to_string(),
            end: "later".to_string(),
        };

        assert!(to_interval(&good).is_some());
        assert!(to_interval(&inverted).is_none());
        assert!(to_interval(&zero_length).is_none());
        assert!(to_interval(&garbage).is_none());
    }

    #[test]
    fn details_fill_missing_fields() {
        let event = ApiEvent {
            id: Some("e1".to_string()),
            summary: None,
            description: None,
            html_link: None,
            status: Some("confirmed".to_string()),
            start: ApiEventTime {
                date: Some("2025-07-04".to_string()),
                ..Default::default()
            },
            end: ApiEventTime {
                date: Some("2025-07-05".to_string()),
                ..Default::default()
            },
        };
        let details = to_details(event).unwrap();
        assert_eq!(details.summary, "");
        assert_eq!(details.description, "");
        assert_eq!(details.start.date.as_deref(), Some("2025-07-04"));
    }

    #[test]
    fn cancelled_events_are_skipped() {
        let event = ApiEvent {
            id: Some("e1".to_string()),
            summary: Some("Gone".to_string()),
            description: None,
            html_link: None,
            status: Some("cancelled".to_string()),
            start: ApiEventTime::default(),
            end: ApiEventTime::default(),
        };
        assert!(to_details(event).is_none());
    }
}
