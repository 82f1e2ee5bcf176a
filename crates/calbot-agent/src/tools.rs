//! Calendar tools the model can call.
//!
//! Each tool is a request against the calendar backend. Failures never
//! abort a run; they come back to the model as the tool result text.

use std::time::Duration;

use calbot_core::Interval;
use calbot_protocol::{AvailabilityQuery, AvailabilityResponse, CreateEventRequest, ErrorBody, EventDetailsQuery};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::error::{AgentError, AgentResult};
use crate::reasoner::{ToolCall, ToolSpec};

/// Timeout for each backend request made by a tool.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(10);

pub const CHECK_AVAILABILITY: &str = "check_availability";
pub const CREATE_EVENT: &str = "create_event";
pub const GET_EVENT_DETAILS: &str = "get_event_details";

/// Why a tool call failed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    Arguments { tool: String, message: String },

    #[error("backend request failed: {0}")]
    Http(String),

    #[error("backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },

    #[error("backend sent an invalid response: {0}")]
    InvalidResponse(String),
}

/// Result of one tool call as fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub output: String,
    /// Set by a successful `check_availability`.
    pub slots: Option<Vec<Interval>>,
    pub failed: bool,
}

#[derive(Debug, Deserialize)]
struct RangeArgs {
    range: String,
    #[serde(default)]
    slot_minutes: Option<u32>,
}

/// HTTP client for the backend endpoints behind the tools.
#[derive(Debug, Clone)]
pub struct BackendTools {
    http: reqwest::Client,
    base: Url,
}

impl BackendTools {
    pub fn new(base: &Url) -> AgentResult<Self> {
        Self::with_timeout(base, TOOL_TIMEOUT)
    }

    pub fn with_timeout(base: &Url, timeout: Duration) -> AgentResult<Self> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Function definitions advertised to the model.
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: CHECK_AVAILABILITY.to_string(),
                description: "Ask for free slots in my calendar. `range` is a natural-language \
                              period such as \"tomorrow\", \"next week\" or \"friday\"."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "range": {"type": "string", "description": "Period to search, e.g. \"next week\""},
                        "slot_minutes": {"type": "integer", "minimum": 1, "description": "Slot length, 30 by default"}
                    },
                    "required": ["range"]
                }),
            },
            ToolSpec {
                name: CREATE_EVENT.to_string(),
                description: "Create a calendar event. Convert relative dates such as \"tomorrow\" \
                              to an ISO8601 UTC start, e.g. 2025-07-03T10:00:00Z."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "start": {"type": "string", "description": "ISO8601 UTC start time"},
                        "duration_minutes": {"type": "integer", "minimum": 1, "maximum": 1440},
                        "description": {"type": "string"}
                    },
                    "required": ["title", "start"]
                }),
            },
            ToolSpec {
                name: GET_EVENT_DETAILS.to_string(),
                description: "Fetch events scheduled in a time range. `range` is either two ISO8601 \
                              instants separated by a slash (2025-07-03T14:00:00Z/2025-07-03T15:00:00Z) \
                              or a phrase such as \"today\". Returns summaries, times and descriptions."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "range": {"type": "string"}
                    },
                    "required": ["range"]
                }),
            },
        ]
    }

    /// Runs a tool call. Never fails; errors are rendered into the output.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        info!(tool = %call.name, id = %call.id, "running tool");
        let result = match call.name.as_str() {
            CHECK_AVAILABILITY => self.check_availability(&call.arguments).await,
            CREATE_EVENT => self.create_event(&call.arguments).await,
            GET_EVENT_DETAILS => self.get_event_details(&call.arguments).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        match result {
            Ok((output, slots)) => ToolOutcome {
                output,
                slots,
                failed: false,
            },
            Err(e) => {
                warn!(tool = %call.name, "tool failed: {e}");
                ToolOutcome {
                    output: format!("Error: {e}"),
                    slots: None,
                    failed: true,
                }
            }
        }
    }

    async fn check_availability(&self, arguments: &str) -> Result<(String, Option<Vec<Interval>>), ToolError> {
        let args: RangeArgs = parse_arguments(CHECK_AVAILABILITY, arguments)?;
        let mut query = AvailabilityQuery::new(args.range);
        query.slot_minutes = args.slot_minutes;

        let request = self.http.get(self.endpoint("availability")?).query(&query);
        let body = self.send(request).await?;
        let response: AvailabilityResponse =
            serde_json::from_str(&body).map_err(|e| ToolError::InvalidResponse(e.to_string()))?;
        Ok((body, Some(response.slots)))
    }

    async fn create_event(&self, arguments: &str) -> Result<(String, Option<Vec<Interval>>), ToolError> {
        let request: CreateEventRequest = parse_arguments(CREATE_EVENT, arguments)?;
        let http = self.http.post(self.endpoint("events")?).json(&request);
        Ok((self.send(http).await?, None))
    }

    async fn get_event_details(&self, arguments: &str) -> Result<(String, Option<Vec<Interval>>), ToolError> {
        let args: RangeArgs = parse_arguments(GET_EVENT_DETAILS, arguments)?;
        let query = event_query(&args.range);
        let request = self.http.get(self.endpoint("event_details")?).query(&query);
        Ok((self.send(request).await?, None))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ToolError> {
        self.base
            .join(path)
            .map_err(|e| ToolError::Http(format!("invalid backend URL: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ToolError> {
        let response = request.send().await.map_err(|e| ToolError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Http(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(ToolError::Backend {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body)
    }
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(tool: &str, arguments: &str) -> Result<T, ToolError> {
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(arguments).map_err(|e| ToolError::Arguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Maps a `get_event_details` range onto the backend query.
///
/// `"<start>/<end>"` becomes explicit bounds, anything else is sent as a
/// phrase.
pub fn event_query(range: &str) -> EventDetailsQuery {
    match range.split_once('/') {
        Some((start, end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
            EventDetailsQuery::between(start.trim(), end.trim())
        }
        _ => EventDetailsQuery::range(range.trim()),
    }
}
