//! # agent-core
//!
//! Core agent loop with tool catalog discovery and a provider-agnostic
//! LLM abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Agent (loop)                          │
//! │  ┌──────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ ToolRegistry │  │ ToolInvoker │  │   ProviderAdapter   │  │
//! │  │  (catalog)   │──│  (policy)   │──│  (one per family)   │  │
//! │  └──────────────┘  └─────────────┘  └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ProviderAdapter` trait normalizes Ollama, Anthropic and OpenAI into
//! one canonical [`Decision`] type, so the loop never branches on provider
//! identity.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod invoke;
pub mod message;
pub mod provider;

pub use agent::{Agent, RunOutcome, RunStatus};
pub use catalog::{ToolDefinition, ToolRegistry, ToolSummary};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
pub use invoke::{CallKind, EndpointPolicy, ToolInvoker};
pub use message::{Message, MessageContent, Role};
pub use provider::{Decision, ProviderAdapter, ProviderKind, ToolCallRequest};
