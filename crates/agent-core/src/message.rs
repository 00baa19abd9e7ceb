//! Conversation Messages
//!
//! Provider-agnostic message format. Each adapter translates this into its
//! provider's native wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input (including synthetic tool-failure notices)
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Message payload: plain text, or a structured tool-call / tool-result
/// block carrying the provider's call identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult { id: String, output: String },
}

impl MessageContent {
    /// Plain text of the message, if it has any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message payload
    pub content: MessageContent,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a plain-text user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text { text: text.into() })
    }

    /// Create a plain-text assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text { text: text.into() })
    }

    /// Record the assistant's decision to call a tool
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self::new(
            Role::Assistant,
            MessageContent::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            },
        )
    }

    /// Record the result returned by a tool call
    pub fn tool_result(id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(
            Role::Tool,
            MessageContent::ToolResult {
                id: id.into(),
                output: output.into(),
            },
        )
    }
}
