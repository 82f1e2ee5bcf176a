//! `/run` and `/health` through the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use calbot_agent::{Agent, BackendTools, ReasonerTurn, ScriptedReasoner, create_app};
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

fn app(turns: Vec<ReasonerTurn>, fail: Option<&str>) -> axum::Router {
    let mut reasoner = ScriptedReasoner::new(turns);
    if let Some(message) = fail {
        reasoner = reasoner.then_fail(message);
    }
    let tools = BackendTools::new(&Url::parse("http://127.0.0.1:8000").unwrap()).unwrap();
    create_app(Arc::new(Agent::new(Arc::new(reasoner), tools)))
}

fn run_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health() {
    let response = app(vec![], None)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn run_returns_content_and_slots() {
    let app = app(vec![ReasonerTurn::Final("Hello!".to_string())], None);
    let response = app
        .oneshot(run_request(r#"{"prompt": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"content": "Hello!", "slots": []}));
}

#[tokio::test]
async fn reasoner_failure_is_500_with_detail() {
    let app = app(vec![], Some("OpenAI API error (429): slow down"));
    let response = app
        .oneshot(run_request(r#"{"prompt": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("slow down"));
}

#[tokio::test]
async fn bad_requests_are_400() {
    let response = app(vec![], None)
        .oneshot(run_request(r#"{"prompt": "  "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["detail"], "prompt must not be empty");

    let response = app(vec![], None)
        .oneshot(run_request(r#"{"question": "hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        json_body(response).await["detail"]
            .as_str()
            .unwrap()
            .contains("prompt")
    );
}
