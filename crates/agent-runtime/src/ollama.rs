//! Ollama Provider Adapter
//!
//! Local-model variant. Tool schemas pass through unchanged (the catalog
//! already speaks function-calling format). After a successful tool call
//! this adapter issues a second, tools-disabled request that synthesizes
//! the final answer directly instead of re-entering the loop.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentError, Decision, Message, MessageContent, ProviderAdapter, ProviderKind, Result, Role,
    ToolCallRequest, ToolDefinition,
};

/// Ollama adapter configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model identifier
    pub model: String,

    /// Per-call request timeout
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: ProviderKind::Ollama.default_model().into(),
            timeout: Duration::from_secs(300),
        }
    }
}

impl OllamaConfig {
    /// Read host and port from `OLLAMA_HOST` / `OLLAMA_PORT`, the model
    /// from `OLLAMA_MODEL` and the timeout from `AGENT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("OLLAMA_HOST").unwrap_or(defaults.host),
            port: std::env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            timeout: crate::env_timeout(defaults.timeout),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}:{}/api/chat", self.host, self.port)
    }
}

/// Provider adapter for a local Ollama instance. No credential required.
pub struct OllamaAdapter {
    client: reqwest::Client,
    chat_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaAdapter {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            chat_url: config.chat_url(),
            model: config.model,
            timeout: config.timeout,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::new(OllamaConfig::from_env())
    }

    /// Flatten canonical history into plain role/content messages.
    /// Tool traffic is rendered as text context; the local model has no
    /// structured tool-result channel.
    fn convert_messages(history: &[Message]) -> Vec<WireMessage> {
        history
            .iter()
            .map(|msg| match &msg.content {
                MessageContent::Text { text } => WireMessage {
                    role: match msg.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    content: text.clone(),
                },
                MessageContent::ToolUse { name, input, .. } => WireMessage {
                    role: "assistant",
                    content: format!("Calling tool '{}' with {}", name, input),
                },
                MessageContent::ToolResult { output, .. } => WireMessage {
                    role: "user",
                    content: format!("Tool returned: {}", output),
                },
            })
            .collect()
    }

    fn parse_response(response: &WireResponse) -> Decision {
        let Some(message) = &response.message else {
            return Decision::Unrecognized;
        };

        if let Some(call) = message.tool_calls.as_ref().and_then(|calls| calls.first()) {
            return Decision::ToolCall(ToolCallRequest {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
                call_id: uuid::Uuid::new_v4().to_string(),
            });
        }

        Decision::FinalAnswer(message.content.clone())
    }

    async fn chat(&self, messages: Vec<WireMessage>, tools: &[ToolDefinition]) -> Result<WireResponse> {
        let request = WireRequest {
            model: &self.model,
            messages,
            stream: false,
            tools: if tools.is_empty() {
                None
            } else {
                // Catalog entries are already function-call shaped
                Some(
                    tools
                        .iter()
                        .map(|t| {
                            serde_json::json!({
                                "type": "function",
                                "function": {
                                    "name": t.name,
                                    "description": t.description,
                                    "parameters": t.parameters,
                                }
                            })
                        })
                        .collect(),
                )
            },
        };

        let response = self
            .client
            .post(&self.chat_url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderCall(format!(
                "ollama returned status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("invalid ollama response: {}", e)))
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
        _system_prompt: Option<&str>,
    ) -> Result<Decision> {
        let response = self.chat(Self::convert_messages(history), tools).await?;
        Ok(Self::parse_response(&response))
    }

    /// Second request with tools disabled: feed the tool result and the
    /// original question back as plain text and let the model phrase the
    /// answer.
    async fn finalize_after_tool(
        &self,
        original_query: &str,
        call: &ToolCallRequest,
        result: &serde_json::Value,
    ) -> Result<Option<String>> {
        let prompt = format!(
            "Tool '{}' returned: {}\nBased on this, answer: \"{}\"\nProvide a natural language response.",
            call.name, result, original_query
        );

        let response = self
            .chat(
                vec![WireMessage {
                    role: "user",
                    content: prompt,
                }],
                &[],
            )
            .await?;

        Ok(Some(
            response.message.map(|m| m.content).unwrap_or_default(),
        ))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize, Debug)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct WireResponse {
    message: Option<WireResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct WireResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize, Debug)]
struct WireToolCall {
    function: WireToolCallFunction,
}

#[derive(Deserialize, Debug)]
struct WireToolCallFunction {
    name: String,
    arguments: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_from_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_parse_tool_call_response() {
        let response: WireResponse = serde_json::from_value(serde_json::json!({
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
        }))
        .unwrap();

        match OllamaAdapter::parse_response(&response) {
            Decision::ToolCall(call) => {
                assert_eq!(call.name, "lookup_user_data");
                assert_eq!(call.arguments["query"], "car_details");
                // Ollama sends no call id; one is generated
                assert!(!call.call_id.is_empty());
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_plain_content_is_final_answer() {
        let response: WireResponse = serde_json::from_value(serde_json::json!({
            "message": {"role": "assistant", "content": "Your car is a Mazda MX-5."}
        }))
        .unwrap();

        match OllamaAdapter::parse_response(&response) {
            Decision::FinalAnswer(text) => assert!(text.contains("Mazda")),
            other => panic!("expected final answer, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_message_is_unrecognized() {
        let response: WireResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            OllamaAdapter::parse_response(&response),
            Decision::Unrecognized
        ));
    }

    #[test]
    fn test_history_flattens_tool_traffic_to_text() {
        let history = vec![
            Message::user("u1 get car details"),
            Message::tool_use("c1", "lookup_user_data", serde_json::json!({"q": 1})),
            Message::tool_result("c1", r#"{"make":"Mazda"}"#),
        ];

        let wire = OllamaAdapter::convert_messages(&history);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[1].role, "assistant");
        assert!(wire[2].content.contains("Mazda"));
    }
}
