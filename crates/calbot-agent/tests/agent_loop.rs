//! Tool loop tests: scripted model, mocked calendar backend.

use std::sync::Arc;

use calbot_agent::{
    Agent, AgentError, BackendTools, ChatMessage, ReasonerTurn, Role, ScriptedReasoner, ToolCall,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, arguments.to_string())
}

fn tools_for(server: &MockServer) -> BackendTools {
    BackendTools::new(&Url::parse(&server.uri()).unwrap()).unwrap()
}

fn agent(reasoner: &Arc<ScriptedReasoner>, server: &MockServer) -> Agent {
    Agent::new(reasoner.clone(), tools_for(server))
}

#[tokio::test]
async fn availability_slots_are_returned() {
    let backend = MockServer::start().await;
    let slots = json!({"slots": [
        {"start": "2025-07-04T09:00:00Z", "end": "2025-07-04T09:30:00Z"},
        {"start": "2025-07-04T09:30:00Z", "end": "2025-07-04T10:00:00Z"}
    ]});
    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(query_param("range", "tomorrow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(slots.clone()))
        .expect(1)
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![call("c1", "check_availability", json!({"range": "tomorrow"}))],
        },
        ReasonerTurn::Final("You are free from 09:00 to 10:00.".to_string()),
    ]));

    let reply = agent(&reasoner, &backend).run("am I free tomorrow?").await.unwrap();
    assert_eq!(reply.content, "You are free from 09:00 to 10:00.");
    assert_eq!(reply.slots.len(), 2);
    assert_eq!(
        serde_json::to_value(&reply.slots[0]).unwrap(),
        json!({"start": "2025-07-04T09:00:00Z", "end": "2025-07-04T09:30:00Z"})
    );

    // second model call saw the tool request and its result
    let seen = reasoner.seen();
    assert_eq!(seen.len(), 2);
    let second = &seen[1];
    assert_eq!(second[0].role, Role::System);
    assert_eq!(second[1], ChatMessage::user("am I free tomorrow?"));
    assert_eq!(second[2].tool_calls.len(), 1);
    assert_eq!(second[3].role, Role::Tool);
    assert_eq!(second[3].tool_call_id.as_deref(), Some("c1"));
    let result: serde_json::Value = serde_json::from_str(second[3].content.as_deref().unwrap()).unwrap();
    assert_eq!(result, slots);
}

#[tokio::test]
async fn create_event_posts_structured_request() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_json(json!({
            "title": "Sync",
            "start": "2025-07-04T15:00:00Z",
            "duration_minutes": 30
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt1",
            "htmlLink": "https://calendar.google.com/event?eid=evt1",
            "summary": "Sync",
            "start": {"dateTime": "2025-07-04T15:00:00Z"},
            "end": {"dateTime": "2025-07-04T15:30:00Z"}
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: Some("Booking it.".to_string()),
            calls: vec![call(
                "c1",
                "create_event",
                json!({"title": "Sync", "start": "2025-07-04T15:00:00Z"}),
            )],
        },
        ReasonerTurn::Final("Booked Sync tomorrow at 15:00.".to_string()),
    ]));

    let reply = agent(&reasoner, &backend).run("book a sync tomorrow at 3pm").await.unwrap();
    assert_eq!(reply.content, "Booked Sync tomorrow at 15:00.");
    assert!(reply.slots.is_empty());
}

#[tokio::test]
async fn event_details_splits_iso_range() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event_details"))
        .and(query_param("start", "2025-07-03T14:00:00Z"))
        .and(query_param("end", "2025-07-03T15:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/event_details"))
        .and(query_param("range", "next week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
        .expect(1)
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![
                call(
                    "c1",
                    "get_event_details",
                    json!({"range": "2025-07-03T14:00:00Z/2025-07-03T15:00:00Z"}),
                ),
                call("c2", "get_event_details", json!({"range": "next week"})),
            ],
        },
        ReasonerTurn::Final("Nothing booked.".to_string()),
    ]));

    let reply = agent(&reasoner, &backend).run("what's on?").await.unwrap();
    assert_eq!(reply.content, "Nothing booked.");
}

#[tokio::test]
async fn tool_failures_go_back_to_the_model() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"detail": "[google] upstream: API returned 503 Service Unavailable"})),
        )
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![
                call("c1", "check_availability", json!({"range": "tomorrow"})),
                call("c2", "check_availability", json!({"when": "today"})),
            ],
        },
        ReasonerTurn::Final("Which day do you mean?".to_string()),
    ]));

    let report = agent(&reasoner, &backend).run_report("am I free?").await.unwrap();
    assert_eq!(report.response.content, "Which day do you mean?");
    assert!(report.response.slots.is_empty());
    assert_eq!(report.steps, 2);
    assert_eq!(report.tool_calls, 2);
    assert_eq!(report.failed_tool_calls, 2);

    let seen = reasoner.seen();
    let results: Vec<&str> = seen[1]
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_deref().unwrap())
        .collect();
    assert_eq!(results[0], "Error: backend returned 500: [google] upstream: API returned 503 Service Unavailable");
    assert!(results[1].starts_with("Error: invalid arguments for check_availability"));
}

#[tokio::test]
async fn unreachable_backend_is_a_tool_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let tools = BackendTools::new(&Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()).unwrap();
    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![call("c1", "check_availability", json!({"range": "today"}))],
        },
        ReasonerTurn::Final("The calendar is unavailable.".to_string()),
    ]));

    let reply = Agent::new(reasoner.clone(), tools).run("free today?").await.unwrap();
    assert_eq!(reply.content, "The calendar is unavailable.");
    let tool_message = reasoner.seen()[1].last().unwrap().clone();
    assert!(tool_message.content.unwrap().starts_with("Error: backend request failed"));
}

#[tokio::test]
async fn last_successful_availability_wins() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(query_param("range", "today"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slots": [
            {"start": "2025-07-03T16:00:00Z", "end": "2025-07-03T16:30:00Z"}
        ]})))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(query_param("range", "tomorrow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slots": [
            {"start": "2025-07-04T08:00:00Z", "end": "2025-07-04T08:30:00Z"},
            {"start": "2025-07-04T08:30:00Z", "end": "2025-07-04T09:00:00Z"}
        ]})))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(query_param("range", "someday"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![call("c1", "check_availability", json!({"range": "today"}))],
        },
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![
                call("c2", "check_availability", json!({"range": "tomorrow"})),
                call("c3", "check_availability", json!({"range": "someday"})),
            ],
        },
        ReasonerTurn::Final("Tomorrow morning works.".to_string()),
    ]));

    let reply = agent(&reasoner, &backend).run("when can we meet?").await.unwrap();
    assert_eq!(reply.slots.len(), 2);
    assert_eq!(
        serde_json::to_value(&reply.slots[0]).unwrap()["start"],
        "2025-07-04T08:00:00Z"
    );
}

#[tokio::test]
async fn too_many_steps_is_an_error() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slots": []})))
        .mount(&backend)
        .await;

    let looping = (0..3).map(|i| ReasonerTurn::ToolCalls {
        content: None,
        calls: vec![call(&format!("c{i}"), "check_availability", json!({"range": "today"}))],
    });
    let reasoner = Arc::new(ScriptedReasoner::new(looping));

    let err = agent(&reasoner, &backend)
        .with_max_steps(2)
        .run("loop forever")
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::MaxSteps(2)));
    assert_eq!(reasoner.seen().len(), 2);
}

#[tokio::test]
async fn reasoner_errors_fail_the_run() {
    let backend = MockServer::start().await;
    let reasoner = Arc::new(ScriptedReasoner::new(Vec::<ReasonerTurn>::new()).then_fail("rate limited"));

    let agent = agent(&reasoner, &backend);
    let err = agent.run("hello").await.unwrap_err();
    assert!(err.to_string().contains("rate limited"));
    assert!(agent.memory().is_empty().await);
}

#[tokio::test]
async fn memory_carries_previous_exchanges() {
    let backend = MockServer::start().await;
    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::Final("Hi Sam.".to_string()),
        ReasonerTurn::Final("Your name is Sam.".to_string()),
    ]));
    let agent = agent(&reasoner, &backend);

    agent.run("I'm Sam").await.unwrap();
    agent.run("what's my name?").await.unwrap();

    let second = &reasoner.seen()[1];
    assert_eq!(
        second[1..],
        [
            ChatMessage::user("I'm Sam"),
            ChatMessage::assistant("Hi Sam."),
            ChatMessage::user("what's my name?"),
        ]
    );
    assert_eq!(agent.memory().len().await, 4);
}

#[tokio::test]
async fn report_counts_successful_calls() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"slots": []})))
        .mount(&backend)
        .await;

    let reasoner = Arc::new(ScriptedReasoner::new([
        ReasonerTurn::ToolCalls {
            content: None,
            calls: vec![call("c1", "check_availability", json!({"range": "today"}))],
        },
        ReasonerTurn::Final("Fully booked today.".to_string()),
    ]));

    let report = agent(&reasoner, &backend).run_report("free today?").await.unwrap();
    assert_eq!(report.steps, 2);
    assert_eq!(report.tool_calls, 1);
    assert_eq!(report.failed_tool_calls, 0);
    assert!(report.response.slots.is_empty());
}
