//! OpenAI-compatible chat-completions reasoner.
//!
//! Works against any endpoint that speaks `POST {base}/chat/completions`
//! with function tools.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::reasoner::{BoxFuture, ChatMessage, Reasoner, ReasonerTurn, Role, ToolCall, ToolSpec};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`OpenAiReasoner`].
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Chat-completions client with function calling.
#[derive(Debug)]
pub struct OpenAiReasoner {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiReasoner {
    pub fn new(config: OpenAiConfig) -> AgentResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.config.temperature,
            tools: tools.iter().map(WireTool::from).collect(),
        }
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> AgentResult<ReasonerTurn> {
        let request = self.build_request(messages, tools);
        debug!(model = %request.model, messages = request.messages.len(), "calling chat completions");

        let response = self
            .http
            .post(self.api_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::reasoner(format!("chat completion request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::reasoner(format!("failed to read chat completion: {e}")))?;
        if !status.is_success() {
            return Err(AgentError::reasoner(format!("OpenAI API error ({status}): {text}")));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::reasoner(format!("failed to parse chat completion: {e}")))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AgentError::reasoner("chat completion has no choices"))?;

        Ok(into_turn(message))
    }
}

impl Reasoner for OpenAiReasoner {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn reason<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, AgentResult<ReasonerTurn>> {
        Box::pin(self.complete(messages, tools))
    }
}

fn into_turn(message: WireMessage) -> ReasonerTurn {
    let calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| ToolCall::new(c.id, c.function.name, c.function.arguments))
        .collect();

    if calls.is_empty() {
        ReasonerTurn::Final(message.content.unwrap_or_default())
    } else {
        ReasonerTurn::ToolCalls {
            content: message.content.filter(|c| !c.is_empty()),
            calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = (!message.tool_calls.is_empty()).then(|| {
            message
                .tool_calls
                .iter()
                .map(|c| WireToolCall {
                    id: c.id.clone(),
                    call_type: "function".to_string(),
                    function: WireFunctionCall {
                        name: c.name.clone(),
                        arguments: c.arguments.clone(),
                    },
                })
                .collect()
        });
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolSpec> for WireTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            tool_type: "function",
            function: WireFunctionDef {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_shape() {
        let reasoner = OpenAiReasoner::new(OpenAiConfig::new("sk-test")).unwrap();
        let messages = [
            ChatMessage::system("be brief"),
            ChatMessage::user("free tomorrow?"),
            ChatMessage::tool_request(
                None,
                vec![ToolCall::new("call_1", "check_availability", r#"{"range":"tomorrow"}"#)],
            ),
            ChatMessage::tool_result("call_1", r#"{"slots":[]}"#),
        ];
        let tools = [ToolSpec {
            name: "check_availability".to_string(),
            description: "Free slots".to_string(),
            parameters: json!({"type": "object"}),
        }];

        let request = reasoner.build_request(&messages, &tools);
        insta::assert_json_snapshot!(request, @r#"
        {
          "model": "gpt-4o-mini",
          "messages": [
            {
              "role": "system",
              "content": "be brief"
            },
            {
              "role": "user",
              "content": "free tomorrow?"
            },
            {
              "role": "assistant",
              "content": null,
              "tool_calls": [
                {
                  "id": "call_1",
                  "type": "function",
                  "function": {
                    "name": "check_availability",
                    "arguments": "{\"range\":\"tomorrow\"}"
                  }
                }
              ]
            },
            {
              "role": "tool",
              "content": "{\"slots\":[]}",
              "tool_call_id": "call_1"
            }
          ],
          "temperature": 0.2,
          "tools": [
            {
              "type": "function",
              "function": {
                "name": "check_availability",
                "description": "Free slots",
                "parameters": {
                  "type": "object"
                }
              }
            }
          ]
        }
        "#);
    }

    #[test]
    fn response_with_tool_calls() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "get_event_details", "arguments": "{\"range\":\"today\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(body).unwrap();
        let turn = into_turn(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(
            turn,
            ReasonerTurn::ToolCalls {
                content: None,
                calls: vec![ToolCall::new("call_9", "get_event_details", r#"{"range":"today"}"#)],
            }
        );
    }

    #[test]
    fn response_with_text() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "You are free."}}]
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(body).unwrap();
        let turn = into_turn(parsed.choices.into_iter().next().unwrap().message);
        assert_eq!(turn, ReasonerTurn::Final("You are free.".to_string()));
    }

    #[test]
    fn config_trims_base_url_and_hides_key() {
        let config = OpenAiConfig::new("sk-secret").with_base_url("http://localhost:1234/v1/");
        assert_eq!(config.base_url, "http://localhost:1234/v1");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
