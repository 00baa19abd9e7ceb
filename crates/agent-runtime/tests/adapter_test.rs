// Integration tests for the provider adapters.
//
// Each adapter talks to a scripted stub server standing in for its
// provider's API; the stub records request bodies so the tests can assert
// the wire shapes each provider expects.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use agent_core::{Decision, Message, ProviderAdapter, ToolDefinition};
use agent_runtime::{
    AnthropicAdapter, AnthropicConfig, OllamaAdapter, OllamaConfig, OpenAiAdapter, OpenAiConfig,
};

// =============================================================================
// Scripted provider stub
// =============================================================================

#[derive(Clone)]
struct Stub {
    responses: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl Stub {
    fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn request_at(&self, call: usize) -> Value {
        self.requests.lock().unwrap()[call].clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn respond(State(stub): State<Stub>, Json(request): Json<Value>) -> Result<Json<Value>, StatusCode> {
    stub.requests.lock().unwrap().push(request);
    stub.responses
        .lock()
        .unwrap()
        .pop_front()
        .map(Json)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Spawn a stub that answers `path` with the scripted responses in order
async fn spawn_stub(path: &str, responses: Vec<Value>) -> (std::net::SocketAddr, Stub) {
    let stub = Stub::new(responses);
    let app = Router::new().route(path, post(respond)).with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, stub)
}

fn lookup_tool() -> ToolDefinition {
    ToolDefinition {
        name: "lookup_user_data".into(),
        description: "Fetch user-specific data".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "msisdn": {"type": "string"},
                "query": {"type": "string"}
            },
            "required": ["msisdn", "query"]
        }),
        direct_endpoint: None,
        proxy_endpoint: "http://localhost:3333/tools/lookup_user_data".into(),
    }
}

// =============================================================================
// Anthropic
// =============================================================================

#[tokio::test]
async fn test_anthropic_decide_requests_tool_call() {
    let (addr, stub) = spawn_stub(
        "/v1/messages",
        vec![json!({
            "content": [{
                "type": "tool_use",
                "id": "toolu_01",
                "name": "lookup_user_data",
                "input": {"msisdn": "u1", "query": "car_details"}
            }],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        })],
    )
    .await;

    let adapter = AnthropicAdapter::new(AnthropicConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let history = vec![Message::user("u1 get car details")];
    let decision = adapter
        .decide(&history, &[lookup_tool()], Some("be helpful"))
        .await
        .unwrap();

    match decision {
        Decision::ToolCall(call) => {
            assert_eq!(call.name, "lookup_user_data");
            assert_eq!(call.call_id, "toolu_01");
        }
        other => panic!("expected tool call, got {other:?}"),
    }

    // Request shape: separate system field, input_schema tool format
    let request = stub.request_at(0);
    assert_eq!(request["system"], "be helpful");
    assert_eq!(request["tools"][0]["name"], "lookup_user_data");
    assert!(request["tools"][0]["input_schema"].is_object());
    assert_eq!(request["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_anthropic_decide_returns_final_answer() {
    let (addr, _stub) = spawn_stub(
        "/v1/messages",
        vec![json!({
            "content": [{"type": "text", "text": "Your car is a Mazda MX-5."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 30, "output_tokens": 12}
        })],
    )
    .await;

    let adapter = AnthropicAdapter::new(AnthropicConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let decision = adapter
        .decide(&[Message::user("u1 get car details")], &[], None)
        .await
        .unwrap();

    assert!(matches!(decision, Decision::FinalAnswer(text) if text.contains("Mazda")));
}

#[tokio::test]
async fn test_anthropic_history_round_trip_carries_tool_result() {
    let (addr, stub) = spawn_stub(
        "/v1/messages",
        vec![json!({
            "content": [{"type": "text", "text": "All done."}],
            "stop_reason": "end_turn",
            "usage": null
        })],
    )
    .await;

    let adapter = AnthropicAdapter::new(AnthropicConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let history = vec![
        Message::user("u1 get car details"),
        Message::tool_use("toolu_01", "lookup_user_data", json!({"query": "car_details"})),
        Message::tool_result("toolu_01", r#"{"make":"Mazda"}"#),
    ];

    adapter.decide(&history, &[lookup_tool()], None).await.unwrap();

    let messages = stub.request_at(0)["messages"].clone();
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"][0]["type"], "tool_use");
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[2]["content"][0]["type"], "tool_result");
    assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_01");
}

// =============================================================================
// OpenAI
// =============================================================================

#[tokio::test]
async fn test_openai_decide_parses_string_arguments() {
    let (addr, stub) = spawn_stub(
        "/v1/responses",
        vec![json!({
            "output": [{
                "type": "function_call",
                "call_id": "fc_1",
                "name": "lookup_user_data",
                "arguments": "{\"msisdn\": \"u1\", \"query\": \"car_details\"}"
            }],
            "usage": {"input_tokens": 9, "output_tokens": 4, "total_tokens": 13}
        })],
    )
    .await;

    let adapter = OpenAiAdapter::new(OpenAiConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let decision = adapter
        .decide(
            &[Message::user("u1 get car details")],
            &[lookup_tool()],
            Some("be helpful"),
        )
        .await
        .unwrap();

    match decision {
        Decision::ToolCall(call) => {
            assert_eq!(call.arguments["query"], "car_details");
            assert_eq!(call.call_id, "fc_1");
        }
        other => panic!("expected tool call, got {other:?}"),
    }

    // Request shape: system prompt flattened into the input list,
    // discriminated function tools, auto tool choice
    let request = stub.request_at(0);
    assert_eq!(request["input"][0]["role"], "system");
    assert_eq!(request["input"][1]["role"], "user");
    assert_eq!(request["tools"][0]["type"], "function");
    assert_eq!(request["tool_choice"], "auto");
}

#[tokio::test]
async fn test_openai_decide_returns_final_answer() {
    let (addr, _stub) = spawn_stub(
        "/v1/responses",
        vec![json!({
            "output": [{
                "type": "message",
                "content": [{"type": "output_text", "text": "Your car is a Mazda MX-5."}]
            }],
            "usage": null
        })],
    )
    .await;

    let adapter = OpenAiAdapter::new(OpenAiConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{}", addr),
        ..Default::default()
    })
    .unwrap();

    let decision = adapter
        .decide(&[Message::user("u1 get car details")], &[], None)
        .await
        .unwrap();

    assert!(matches!(decision, Decision::FinalAnswer(text) if text.contains("Mazda")));
}

// =============================================================================
// Ollama
// =============================================================================

fn ollama_adapter(addr: std::net::SocketAddr) -> OllamaAdapter {
    OllamaAdapter::new(OllamaConfig {
        host: format!("http://{}", addr.ip()),
        port: addr.port(),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_ollama_decide_picks_first_tool_call() {
    let (addr, stub) = spawn_stub(
        "/api/chat",
        vec![json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "lookup_user_data",
                        "arguments": {"msisdn": "u1", "query": "car_details"}
                    }
                }]
            }
        })],
    )
    .await;

    let adapter = ollama_adapter(addr);
    let decision = adapter
        .decide(&[Message::user("u1 get car details")], &[lookup_tool()], None)
        .await
        .unwrap();

    assert!(matches!(decision, Decision::ToolCall(call) if call.name == "lookup_user_data"));

    let request = stub.request_at(0);
    assert_eq!(request["stream"], false);
    assert_eq!(request["tools"][0]["function"]["name"], "lookup_user_data");
}

#[tokio::test]
async fn test_ollama_finalizes_with_tools_disabled() {
    let (addr, stub) = spawn_stub(
        "/api/chat",
        vec![json!({
            "message": {"role": "assistant", "content": "Your car is a Mazda MX-5."}
        })],
    )
    .await;

    let adapter = ollama_adapter(addr);
    let call = agent_core::ToolCallRequest {
        name: "lookup_user_data".into(),
        arguments: json!({"query": "car_details"}),
        call_id: "c1".into(),
    };

    let text = adapter
        .finalize_after_tool("u1 get car details", &call, &json!({"make": "Mazda"}))
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some("Your car is a Mazda MX-5."));

    // Second-request shape: no tools, the result and question as plain text
    let request = stub.request_at(0);
    assert!(request.get("tools").is_none());
    let prompt = request["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Tool 'lookup_user_data' returned"));
    assert!(prompt.contains("u1 get car details"));
    assert_eq!(stub.request_count(), 1);
}
