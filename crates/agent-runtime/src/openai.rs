//! OpenAI Provider Adapter
//!
//! Speaks the Responses API: each function definition carries an explicit
//! `type` discriminator, the system prompt and history flatten into one
//! ordered `input` list, and function-call arguments arrive as a
//! JSON-encoded string.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agent_core::{
    AgentError, Decision, Message, MessageContent, ProviderAdapter, ProviderKind, Result, Role,
    ToolCallRequest, ToolDefinition,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI adapter configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key; construction fails without one
    pub api_key: Option<String>,

    /// API base URL (overridable for tests and gateways)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Token budget per response
    pub max_output_tokens: u32,

    /// Per-call request timeout
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            model: ProviderKind::OpenAi.default_model().into(),
            max_output_tokens: 1024,
            timeout: Duration::from_secs(300),
        }
    }
}

impl OpenAiConfig {
    /// Read the API key from `OPENAI_API_KEY` and the timeout from
    /// `AGENT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            timeout: crate::env_timeout(defaults.timeout),
            ..defaults
        }
    }
}

/// Provider adapter for OpenAI's Responses API
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
    timeout: Duration,
}

impl OpenAiAdapter {
    /// Create the adapter. Fails fast with a configuration error when no
    /// API key is present, before any network call.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key.ok_or_else(|| {
            AgentError::Configuration("OPENAI_API_KEY must be set for the OpenAI provider".into())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url,
            model: config.model,
            max_output_tokens: config.max_output_tokens,
            timeout: config.timeout,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env())
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                kind: "function",
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect()
    }

    /// Flatten system prompt and history into the ordered input list
    fn convert_input(history: &[Message], system_prompt: Option<&str>) -> Vec<InputItem> {
        let mut input = Vec::with_capacity(history.len() + 1);

        if let Some(prompt) = system_prompt {
            input.push(InputItem::Message {
                role: "system",
                content: prompt.into(),
            });
        }

        for msg in history {
            match &msg.content {
                MessageContent::Text { text } => input.push(InputItem::Message {
                    role: match msg.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    content: text.clone(),
                }),
                MessageContent::ToolUse { id, name, input: args } => {
                    input.push(InputItem::FunctionCall {
                        kind: "function_call",
                        call_id: id.clone(),
                        name: name.clone(),
                        arguments: args.to_string(),
                    });
                }
                MessageContent::ToolResult { id, output } => {
                    input.push(InputItem::FunctionCallOutput {
                        kind: "function_call_output",
                        call_id: id.clone(),
                        output: output.clone(),
                    });
                }
            }
        }

        input
    }

    /// Interpret the first output item. A text answer always wins
    /// immediately; it is never gated on a verbosity flag.
    fn parse_response(response: &WireResponse) -> Result<Decision> {
        match response.output.first() {
            Some(OutputItem::FunctionCall {
                call_id,
                name,
                arguments,
            }) => {
                // Arguments arrive as a JSON-encoded string
                let parsed: serde_json::Value = serde_json::from_str(arguments).map_err(|e| {
                    AgentError::ProviderCall(format!(
                        "openai function-call arguments are not valid JSON: {}",
                        e
                    ))
                })?;

                Ok(Decision::ToolCall(ToolCallRequest {
                    name: name.clone(),
                    arguments: parsed,
                    call_id: call_id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                }))
            }
            Some(OutputItem::Message { content }) => Ok(content
                .iter()
                .find_map(|part| match part {
                    OutputContent::OutputText { text } => {
                        Some(Decision::FinalAnswer(text.clone()))
                    }
                    OutputContent::Unknown => None,
                })
                .unwrap_or(Decision::Unrecognized)),
            Some(OutputItem::Unknown) | None => Ok(Decision::Unrecognized),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
            input: Self::convert_input(history, system_prompt),
            max_output_tokens: self.max_output_tokens,
            tools: Self::convert_tools(tools),
            tool_choice: "auto",
        };

        let response = self
            .client
            .post(format!("{}/v1/responses", self.base_url))
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("openai request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ProviderCall(format!(
                "openai returned status {}: {}",
                status, body
            )));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ProviderCall(format!("invalid openai response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total_tokens,
                "openai token usage"
            );
        }

        Self::parse_response(&parsed)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    input: Vec<InputItem>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    tool_choice: &'static str,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum InputItem {
    Message {
        role: &'static str,
        content: String,
    },
    FunctionCall {
        #[serde(rename = "type")]
        kind: &'static str,
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        #[serde(rename = "type")]
        kind: &'static str,
        call_id: String,
        output: String,
    },
}

#[derive(Deserialize, Debug)]
struct WireResponse {
    output: Vec<OutputItem>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    FunctionCall {
        call_id: Option<String>,
        name: String,
        arguments: String,
    },
    Message {
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText { text: String },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}
