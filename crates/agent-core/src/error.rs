//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration (e.g. absent API key).
    /// Raised at construction time, before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tool catalog fetch failed; the registry stays undiscovered
    /// so a later attempt can retry
    #[error("Tool discovery failed: {0}")]
    Discovery(String),

    /// The model requested a tool absent from the registry
    #[error("Unknown tool: {name}. Available tools: {available:?}")]
    UnknownTool { name: String, available: Vec<String> },

    /// Tool endpoint returned an error status or the call itself failed
    #[error("Tool execution failed for '{name}': {reason}")]
    ToolExecution {
        name: String,
        /// HTTP status, when the endpoint answered with one
        status: Option<u16>,
        reason: String,
    },

    /// The LLM API call itself failed. Never recovered inside the loop.
    #[error("Provider call failed: {0}")]
    ProviderCall(String),

    /// The caller cancelled the run
    #[error("Run cancelled")]
    Cancelled,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether the loop recovers from this error by injecting a
    /// failure message into history and continuing.
    /// Provider and configuration failures are fatal; tool failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::ToolExecution { .. } | AgentError::UnknownTool { .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Configuration(msg) => format!("Configuration problem: {}", msg),
            AgentError::Discovery(_) => {
                "The tool catalog is currently unavailable. Please try again.".into()
            }
            AgentError::UnknownTool { name, .. } => {
                format!("The tool '{}' is not available.", name)
            }
            AgentError::ToolExecution { name, .. } => format!("Tool '{}' failed.", name),
            AgentError::ProviderCall(_) => {
                "The AI service encountered an error. Please try again.".into()
            }
            AgentError::Cancelled => "The request was cancelled.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
