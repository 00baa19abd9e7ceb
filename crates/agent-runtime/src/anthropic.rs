//! Anthropic Provider Adapter
//!
//! Speaks the Messages API: tools as `{name, description, input_schema}`,
//! system prompt as a separate field, decisions read off the terminal
//! `stop_reason`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentError, Decision, Message, MessageContent, ProviderAdapter, ProviderKind, Result, Role,
    ToolCallRequest, ToolDefinition,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic adapter configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API key; construction fails without one
    pub api_key: Option<String>,

    /// API base URL (overridable for tests and gateways)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Token budget per response
    pub max_tokens: u32,

    /// Per-call request timeout
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            model: ProviderKind::Anthropic.default_model().into(),
            max_tokens: 1024,
            timeout: Duration::from_secs(300),
        }
    }
}

impl AnthropicConfig {
    /// Read the API key from `ANTHROPIC_API_KEY` and the timeout from
    /// `AGENT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            timeout: crate::env_timeout(defaults.timeout),
            ..defaults
        }
    }
}

/// Provider adapter for Anthropic's Messages API
pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl AnthropicAdapter {
    /// Create the adapter. Fails fast with a configuration error when no
    /// API key is present, before any network call.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            AgentError::Configuration("ANTHROPIC_API_KEY must be set for the Anthropic provider".into())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url,
            model: config.model,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env())
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.parameters.clone(),
            })
            .collect()
    }

    /// Map canonical history onto Messages API shapes: tool calls become
    /// assistant `tool_use` blocks, tool results user `tool_result` blocks.
    fn convert_history(history: &[Message]) -> Vec<WireMessage> {
        history
            .iter()
            .map(|msg| match (&msg.role, &msg.content) {
                (_, MessageContent::ToolUse { id, name, input }) => WireMessage {
                    role: "assistant",
                    content: vec![ContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    }],
                },
                (_, MessageContent::ToolResult { id, output }) => WireMessage {
                    role: "user",
                    content: vec![ContentBlock::ToolResult {
                        tool_use_id: id.clone(),
                        content: output.clone(),
                    }],
                },
                (role, MessageContent::Text { text }) => WireMessage {
                    role: match role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    content: vec![ContentBlock::Text { text: text.clone() }],
                },
            })
            .collect()
    }

    fn parse_response(response: &WireResponse) -> Decision {
        match response.stop_reason.as_deref() {
            Some("tool_use") => response
                .content
                .iter()
                .find_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => {
                        Some(Decision::ToolCall(ToolCallRequest {
                            name: name.clone(),
                            arguments: input.clone(),
                            call_id: id.clone(),
                        }))
                    }
                    _ => None,
                })
                .unwrap_or(Decision::Unrecognized),
            Some("end_turn") => response
                .content
                .iter()
                .find_map(|block| match block {
                    ContentBlock::Text { text } => Some(Decision::FinalAnswer(text.clone())),
                    _ => None,
                })
                .unwrap_or(Decision::Unrecognized),
            _ => Decision::Unrecognized,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
        system_prompt: Option<&str>,
    ) -> Result<Decision> {
        let request = WireRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: Self::convert_history(history),
            tools: Self::convert_tools(tools),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .timeout(self.timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("anthropic request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderCall(format!(
                "anthropic returned status {}: {}",
                status, body
            )));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("invalid anthropic response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "anthropic token usage"
            );
        }

        Ok(Self::parse_response(&parsed))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Deserialize, Debug)]
struct WireResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize, Debug)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}
