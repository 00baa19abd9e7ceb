//! Application State
//!
//! Owns the keyed agent factory: one agent per requested provider family,
//! built on first use and cached in a concurrency-safe map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use agent_core::{Agent, AgentConfig, ProviderKind, Result};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agents already constructed, keyed by provider family
    agents: Arc<RwLock<HashMap<ProviderKind, Arc<Agent>>>>,

    /// Provider used when a request names none
    pub default_provider: ProviderKind,

    /// Behavior settings applied to every agent
    pub agent_config: AgentConfig,
}

impl AppState {
    pub fn new(default_provider: ProviderKind, agent_config: AgentConfig) -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
            default_provider,
            agent_config,
        }
    }

    /// Get or create the agent for a provider family.
    ///
    /// Construction fails with a configuration error (missing credential)
    /// before any network call; a failed construction is not cached, so a
    /// later request can succeed once the credential is supplied.
    pub async fn agent_for(&self, kind: ProviderKind) -> Result<Arc<Agent>> {
        if let Some(agent) = self.agents.read().await.get(&kind) {
            return Ok(agent.clone());
        }

        let adapter = agent_runtime::adapter_from_env(kind)?;
        let agent = Arc::new(Agent::new(adapter, self.agent_config.clone()));

        let mut agents = self.agents.write().await;
        // A concurrent request may have built it while we were constructing
        let agent = agents.entry(kind).or_insert(agent).clone();
        tracing::info!(provider = %kind, "agent ready");
        Ok(agent)
    }
}
