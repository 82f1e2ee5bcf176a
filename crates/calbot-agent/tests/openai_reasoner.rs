//! Chat-completions client against a mocked endpoint.

use calbot_agent::{ChatMessage, OpenAiConfig, OpenAiReasoner, Reasoner, ReasonerTurn, ToolCall, ToolSpec};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reasoner(server: &MockServer) -> OpenAiReasoner {
    let config = OpenAiConfig::new("sk-test").with_base_url(format!("{}/v1", server.uri()));
    OpenAiReasoner::new(config).unwrap()
}

fn tools() -> Vec<ToolSpec> {
    vec![ToolSpec {
        name: "check_availability".to_string(),
        description: "Free slots".to_string(),
        parameters: json!({"type": "object", "properties": {"range": {"type": "string"}}}),
    }]
}

#[tokio::test]
async fn sends_model_tools_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.2,
            "messages": [{"role": "user", "content": "free tomorrow?"}],
            "tools": [{"type": "function", "function": {"name": "check_availability"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "check_availability", "arguments": "{\"range\":\"tomorrow\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let turn = reasoner(&server)
        .reason(&[ChatMessage::user("free tomorrow?")], &tools())
        .await
        .unwrap();
    assert_eq!(
        turn,
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![ToolCall::new("call_1", "check_availability", r#"{"range":"tomorrow"}"#)],
        }
    );
}

#[tokio::test]
async fn final_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "You're free all day."}}]
        })))
        .mount(&server)
        .await;

    let turn = reasoner(&server)
        .reason(&[ChatMessage::user("free today?")], &[])
        .await
        .unwrap();
    assert_eq!(turn, ReasonerTurn::Final("You're free all day.".to_string()));
}

#[tokio::test]
async fn api_errors_carry_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = reasoner(&server)
        .reason(&[ChatMessage::user("hi")], &[])
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("invalid api key"));
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = reasoner(&server)
        .reason(&[ChatMessage::user("hi")], &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no choices"));
}
