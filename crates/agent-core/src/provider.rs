//! LLM Provider Adapters
//!
//! Defines a common interface for all LLM providers (Ollama, Anthropic,
//! OpenAI) so the agent loop never branches on provider identity. Each
//! adapter issues exactly one request per `decide` call and parses exactly
//! one response into the canonical [`Decision`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::ToolDefinition;
use crate::error::Result;
use crate::message::Message;

/// Provider families supported by the runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    /// Numeric selector used by the hosting service: 0=Ollama, 1=Anthropic, 2=OpenAI
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ProviderKind::Ollama),
            1 => Some(ProviderKind::Anthropic),
            2 => Some(ProviderKind::OpenAi),
            _ => None,
        }
    }

    pub fn as_index(self) -> u8 {
        match self {
            ProviderKind::Ollama => 0,
            ProviderKind::Anthropic => 1,
            ProviderKind::OpenAi => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Environment variable holding the provider's credential, if one is required
    pub fn required_credential(self) -> Option<&'static str> {
        match self {
            ProviderKind::Ollama => None,
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "mistral:latest",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            ProviderKind::OpenAi => "gpt-4o",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Tool identifier
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,

    /// Provider call identifier (generated when the provider omits one)
    pub call_id: String,
}

/// Canonical outcome of interpreting one LLM response
#[derive(Clone, Debug)]
pub enum Decision {
    /// The model wants a tool invoked
    ToolCall(ToolCallRequest),

    /// The model produced its final text
    FinalAnswer(String),

    /// The response fit no known shape; the loop advances without
    /// progress, bounded by the iteration budget
    Unrecognized,
}

/// Adapter contract: one implementation per provider family.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider family this adapter speaks for
    fn kind(&self) -> ProviderKind;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Issue one provider request over the current history and parse the
    /// response into a canonical decision. Failures here are fatal to the
    /// run; the loop never recovers a provider-call error.
    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
        system_prompt: Option<&str>,
    ) -> Result<Decision>;

    /// Hook invoked after a tool call succeeds. Returning `Some(text)`
    /// finishes the run with that text; `None` re-enters the loop with the
    /// tool result appended to history.
    ///
    /// The default suits providers that reason over tool results themselves.
    /// The local-model adapter overrides this with a tools-disabled second
    /// request that synthesizes the answer directly.
    async fn finalize_after_tool(
        &self,
        original_query: &str,
        call: &ToolCallRequest,
        result: &serde_json::Value,
    ) -> Result<Option<String>> {
        let _ = (original_query, call, result);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_index_mapping() {
        assert_eq!(ProviderKind::from_index(0), Some(ProviderKind::Ollama));
        assert_eq!(ProviderKind::from_index(1), Some(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::from_index(2), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_index(3), None);

        for kind in [
            ProviderKind::Ollama,
            ProviderKind::Anthropic,
            ProviderKind::OpenAi,
        ] {
            assert_eq!(ProviderKind::from_index(kind.as_index()), Some(kind));
        }
    }

    #[test]
    fn test_credentials_required_only_for_hosted_providers() {
        assert_eq!(ProviderKind::Ollama.required_credential(), None);
        assert_eq!(
            ProviderKind::Anthropic.required_credential(),
            Some("ANTHROPIC_API_KEY")
        );
        assert_eq!(
            ProviderKind::OpenAi.required_credential(),
            Some("OPENAI_API_KEY")
        );
    }
}
