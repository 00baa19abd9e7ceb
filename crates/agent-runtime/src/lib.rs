//! # agent-runtime
//!
//! Provider adapters for the toolbridge agent.
//!
//! ## Providers
//!
//! - **Anthropic**: Messages API (stop-reason style)
//! - **OpenAI**: Responses API (function-call style)
//! - **Ollama**: Local inference via `/api/chat` (default models need no credential)
//!
//! Each adapter implements [`agent_core::ProviderAdapter`]; the agent loop
//! stays provider-agnostic and selects an implementation through
//! [`adapter_from_env`].

use std::sync::Arc;
use std::time::Duration;

use agent_core::{AgentError, ProviderAdapter, ProviderKind, Result};

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicAdapter, AnthropicConfig};
#[cfg(feature = "ollama")]
pub use ollama::{OllamaAdapter, OllamaConfig};
#[cfg(feature = "openai")]
pub use openai::{OpenAiAdapter, OpenAiConfig};

/// Build the adapter for a provider family from environment configuration.
///
/// Fails with a configuration error when the provider's credential is
/// missing or its support was not compiled in.
#[allow(unreachable_patterns)]
pub fn adapter_from_env(kind: ProviderKind) -> Result<Arc<dyn ProviderAdapter>> {
    match kind {
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => Ok(Arc::new(OllamaAdapter::from_env())),

        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicAdapter::from_env()?)),

        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiAdapter::from_env()?)),

        _ => Err(AgentError::Configuration(format!(
            "support for provider '{}' is not enabled in this build",
            kind
        ))),
    }
}

/// Per-call timeout from `AGENT_TIMEOUT_SECS`, shared by all adapters
pub(crate) fn env_timeout(default: Duration) -> Duration {
    std::env::var("AGENT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(default, Duration::from_secs)
}
