//! Request and response bodies.

use calbot_core::{Interval, SlotDuration};
use serde::{Deserialize, Serialize};

use crate::{MAX_EVENT_MINUTES, ValidationError};

/// Query string of `GET /availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// Natural-language range such as "next week".
    pub range: String,
    /// Slot length in minutes, 30 when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_minutes: Option<u32>,
}

impl AvailabilityQuery {
    pub fn new(range: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            slot_minutes: None,
        }
    }

    #[must_use]
    pub fn with_slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = Some(minutes);
        self
    }

    /// Resolves the requested slot length.
    pub fn slot_duration(&self) -> Result<SlotDuration, ValidationError> {
        match self.slot_minutes {
            None => Ok(SlotDuration::default()),
            Some(minutes) => SlotDuration::from_minutes(minutes).ok_or(ValidationError::SlotMinutes),
        }
    }
}

/// Body of a successful `GET /availability`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub slots: Vec<Interval>,
}

fn default_duration() -> i64 {
    30
}

/// Body of `POST /events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    /// ISO8601 timestamp or a phrase such as "tomorrow at 3pm".
    pub start: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateEventRequest {
    pub fn new(title: impl Into<String>, start: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            duration_minutes,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the fields that do not need a clock or a calendar.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.start.trim().is_empty() {
            return Err(ValidationError::EmptyStart);
        }
        if !(1..=MAX_EVENT_MINUTES).contains(&self.duration_minutes) {
            return Err(ValidationError::Duration {
                value: self.duration_minutes,
                max: MAX_EVENT_MINUTES,
            });
        }
        Ok(())
    }
}

/// Start or end of a calendar event as stored by the calendar.
///
/// Timed events carry `dateTime`, all-day events carry `date`. Values are
/// passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// The timestamp or date, whichever is present.
    pub fn display_value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// Body of a successful `POST /events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(rename = "htmlLink", default)]
    pub html_link: String,
    #[serde(default)]
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
}

/// Query string of `GET /event_details`.
///
/// Either `start` and `end` (ISO8601) or `range` (a phrase) must be given.
/// When both forms are present the explicit bounds win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetailsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// Which form of [`EventDetailsQuery`] was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSelection<'a> {
    Between { start: &'a str, end: &'a str },
    Range(&'a str),
}

impl EventDetailsQuery {
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            range: None,
        }
    }

    pub fn range(phrase: impl Into<String>) -> Self {
        Self {
            range: Some(phrase.into()),
            ..Self::default()
        }
    }

    /// Picks the query form, ignoring blank values.
    pub fn selection(&self) -> Result<EventSelection<'_>, ValidationError> {
        fn non_blank(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        match (non_blank(&self.start), non_blank(&self.end), non_blank(&self.range)) {
            (Some(start), Some(end), _) => Ok(EventSelection::Between { start, end }),
            (_, _, Some(range)) => Ok(EventSelection::Range(range)),
            _ => Err(ValidationError::MissingWindow),
        }
    }
}

/// One event in `GET /event_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(default)]
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Empty when the event has no description.
    #[serde(default)]
    pub description: String,
}

/// Body of a successful `GET /event_details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetailsResponse {
    pub events: Vec<EventDetails>,
}

/// Body of `POST /run` on both the backend and the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub prompt: String,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Agent answer to a prompt, with any free slots it looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub content: String,
    #[serde(default)]
    pub slots: Vec<Interval>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn slot(h: u32, m: u32, minutes: i64) -> Interval {
        let start = Utc.with_ymd_and_hms(2025, 7, 3, h, m, 0).unwrap();
        Interval::new(start, start + chrono::Duration::minutes(minutes)).unwrap()
    }

    mod availability {
        use super::*;

        #[test]
        fn response_shape() {
            let response = AvailabilityResponse {
                slots: vec![slot(0, 0, 30), slot(0, 30, 30)],
            };
            insta::assert_json_snapshot!(response, @r###"
            {
              "slots": [
                {
                  "start": "2025-07-03T00:00:00Z",
                  "end": "2025-07-03T00:30:00Z"
                },
                {
                  "start": "2025-07-03T00:30:00Z",
                  "end": "2025-07-03T01:00:00Z"
                }
              ]
            }
            "###);
        }

        #[test]
        fn slot_minutes_defaults_to_thirty() {
            let query = AvailabilityQuery::new("tomorrow");
            assert_eq!(query.slot_duration().unwrap().minutes(), 30);
            assert_eq!(
                query.clone().with_slot_minutes(45).slot_duration().unwrap().minutes(),
                45
            );
            assert_eq!(
                query.with_slot_minutes(0).slot_duration(),
                Err(ValidationError::SlotMinutes)
            );
        }

        #[test]
        fn query_omits_missing_slot_minutes() {
            let json = serde_json::to_string(&AvailabilityQuery::new("next week")).unwrap();
            assert_eq!(json, r#"{"range":"next week"}"#);
        }
    }

    mod events {
        use super::*;

        #[test]
        fn create_request_defaults() {
            let parsed: CreateEventRequest =
                serde_json::from_str(r#"{"title":"Sync","start":"2025-07-03T14:00:00Z"}"#).unwrap();
            assert_eq!(parsed.duration_minutes, 30);
            assert_eq!(parsed.description, None);
            assert!(parsed.validate().is_ok());
        }

        #[test]
        fn create_request_validation() {
            let ok = CreateEventRequest::new("Sync", "tomorrow 3pm", 60);
            assert!(ok.validate().is_ok());

            assert_eq!(
                CreateEventRequest::new("  ", "tomorrow", 30).validate(),
                Err(ValidationError::EmptyTitle)
            );
            assert_eq!(
                CreateEventRequest::new("Sync", "", 30).validate(),
                Err(ValidationError::EmptyStart)
            );
            assert_eq!(
                CreateEventRequest::new("Sync", "tomorrow", 0).validate(),
                Err(ValidationError::Duration { value: 0, max: 1440 })
            );
            assert!(CreateEventRequest::new("Sync", "tomorrow", -5).validate().is_err());
            assert!(CreateEventRequest::new("Sync", "tomorrow", 1440).validate().is_ok());
            assert!(CreateEventRequest::new("Sync", "tomorrow", 1441).validate().is_err());
        }

        #[test]
        fn created_event_uses_calendar_field_names() {
            let created = CreatedEvent {
                id: "evt-1".to_string(),
                html_link: "https://calendar.example/evt-1".to_string(),
                summary: "Sync".to_string(),
                start: EventTime::date_time("2025-07-03T14:00:00Z"),
                end: EventTime::date_time("2025-07-03T14:30:00Z"),
            };
            insta::assert_json_snapshot!(created, @r###"
            {
              "id": "evt-1",
              "htmlLink": "https://calendar.example/evt-1",
              "summary": "Sync",
              "start": {
                "dateTime": "2025-07-03T14:00:00Z"
              },
              "end": {
                "dateTime": "2025-07-03T14:30:00Z"
              }
            }
            "###);
        }

        #[test]
        fn event_time_accepts_all_day_and_zone() {
            let parsed: EventTime =
                serde_json::from_str(r#"{"dateTime":"2025-07-03T16:00:00+02:00","timeZone":"Europe/Paris"}"#)
                    .unwrap();
            assert_eq!(parsed.display_value(), Some("2025-07-03T16:00:00+02:00"));
            assert_eq!(parsed.time_zone.as_deref(), Some("Europe/Paris"));

            let all_day = EventTime::all_day("2025-07-04");
            assert_eq!(serde_json::to_string(&all_day).unwrap(), r#"{"date":"2025-07-04"}"#);
            assert_eq!(all_day.display_value(), Some("2025-07-04"));
        }

        #[test]
        fn details_description_defaults_to_empty() {
            let parsed: EventDetails = serde_json::from_str(
                r#"{"summary":"Lunch","start":{"date":"2025-07-04"},"end":{"date":"2025-07-05"}}"#,
            )
            .unwrap();
            assert_eq!(parsed.description, "");
        }
    }

    mod event_details_query {
        use super::*;

        #[test]
        fn explicit_bounds_win() {
            let mut query = EventDetailsQuery::between("2025-07-03T00:00:00Z", "2025-07-04T00:00:00Z");
            query.range = Some("next week".to_string());
            assert_eq!(
                query.selection(),
                Ok(EventSelection::Between {
                    start: "2025-07-03T00:00:00Z",
                    end: "2025-07-04T00:00:00Z",
                })
            );
        }

        #[test]
        fn range_form() {
            let query = EventDetailsQuery::range("tomorrow");
            assert_eq!(query.selection(), Ok(EventSelection::Range("tomorrow")));
        }

        #[test]
        fn half_bounds_fall_back_to_range_or_fail() {
            let mut query = EventDetailsQuery {
                start: Some("2025-07-03T00:00:00Z".to_string()),
                ..Default::default()
            };
            assert_eq!(query.selection(), Err(ValidationError::MissingWindow));

            query.range = Some("today".to_string());
            assert_eq!(query.selection(), Ok(EventSelection::Range("today")));
        }

        #[test]
        fn blank_values_are_missing() {
            let query = EventDetailsQuery {
                start: Some(" ".to_string()),
                end: Some("".to_string()),
                range: Some("\t".to_string()),
            };
            assert_eq!(query.selection(), Err(ValidationError::MissingWindow));
        }
    }

    mod run {
        use super::*;

        #[test]
        fn response_slots_default_to_empty() {
            let parsed: RunResponse = serde_json::from_str(r#"{"content":"Booked."}"#).unwrap();
            assert_eq!(parsed.content, "Booked.");
            assert!(parsed.slots.is_empty());
        }

        #[test]
        fn response_with_slots() {
            let response = RunResponse {
                content: "Here are some times".to_string(),
                slots: vec![slot(9, 0, 30)],
            };
            let json = serde_json::to_value(&response).unwrap();
            assert_eq!(json["slots"][0]["start"], "2025-07-03T09:00:00Z");
            assert_eq!(json["slots"][0]["end"], "2025-07-03T09:30:00Z");
        }

        #[test]
        fn error_body() {
            let body = ErrorBody::new("provide either both start and end, or range");
            assert_eq!(
                serde_json::to_string(&body).unwrap(),
                r#"{"detail":"provide either both start and end, or range"}"#
            );
            assert_eq!(body.to_string(), "provide either both start and end, or range");
        }
    }
}
