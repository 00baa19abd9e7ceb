//! Tool Catalog
//!
//! Discovers tool metadata from the catalog service and caches it.
//! Discovery runs at most once per registry lifetime unless an explicit
//! reload is requested.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AgentError, Result};

/// A tool as advertised by the catalog service. Immutable once discovered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the LLM)
    pub description: String,

    /// JSON-schema-like parameter description, passed through to providers
    pub parameters: serde_json::Value,

    /// Tool-specific URL that bypasses the catalog proxy, if advertised
    pub direct_endpoint: Option<String>,

    /// Catalog-owned URL that forwards invocation to the tool
    pub proxy_endpoint: String,
}

/// Name + description pair for capability listings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Catalog wire format: OpenAI/Ollama function-calling shape.
/// The outer `type` discriminator is not needed after parsing.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    function: CatalogFunction,
}

#[derive(Debug, Deserialize)]
struct CatalogFunction {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    direct_endpoint: Option<String>,
}

/// Registry of discovered tools.
///
/// The map is written at most once; concurrent first discoveries are
/// serialized behind the write lock, and a failed fetch leaves the slot
/// empty so the next call retries.
pub struct ToolRegistry {
    catalog_url: String,
    client: reqwest::Client,
    timeout: Duration,
    tools: RwLock<Option<HashMap<String, ToolDefinition>>>,
}

impl ToolRegistry {
    /// Create a registry pointing at a catalog service
    pub fn new(catalog_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            client: reqwest::Client::new(),
            timeout,
            tools: RwLock::new(None),
        }
    }

    /// Base URL of the catalog service
    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// Whether discovery has completed
    pub async fn is_discovered(&self) -> bool {
        self.tools.read().await.is_some()
    }

    /// Fetch and cache the tool catalog.
    ///
    /// Idempotent: once discovered, returns the cached definitions with no
    /// network call.
    pub async fn discover(&self) -> Result<Vec<ToolDefinition>> {
        if let Some(tools) = self.tools.read().await.as_ref() {
            tracing::debug!("tools already discovered, using cache");
            return Ok(Self::sorted(tools));
        }

        let mut slot = self.tools.write().await;
        // Another caller may have finished discovery while we waited
        if let Some(tools) = slot.as_ref() {
            return Ok(Self::sorted(tools));
        }

        let url = format!("{}/tools", self.catalog_url);
        tracing::info!(%url, "discovering tools");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AgentError::Discovery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Discovery(format!(
                "catalog returned status {}",
                response.status()
            )));
        }

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|e| AgentError::Discovery(format!("invalid catalog body: {}", e)))?;

        let mut tools = HashMap::new();
        for entry in entries {
            let func = entry.function;
            let def = ToolDefinition {
                proxy_endpoint: format!("{}/tools/{}", self.catalog_url, func.name),
                description: func
                    .description
                    .unwrap_or_else(|| format!("Tool: {}", func.name)),
                parameters: func.parameters,
                direct_endpoint: func.direct_endpoint,
                name: func.name,
            };
            tracing::info!(tool = %def.name, direct = def.direct_endpoint.is_some(), "discovered tool");
            tools.insert(def.name.clone(), def);
        }

        tracing::info!(count = tools.len(), "tool discovery complete");
        let result = Self::sorted(&tools);
        *slot = Some(tools);
        Ok(result)
    }

    /// Look up a discovered tool by name
    pub async fn lookup(&self, name: &str) -> Result<ToolDefinition> {
        let tools = self.tools.read().await;
        let map = tools.as_ref().ok_or_else(|| AgentError::UnknownTool {
            name: name.into(),
            available: Vec::new(),
        })?;

        map.get(name).cloned().ok_or_else(|| AgentError::UnknownTool {
            name: name.into(),
            available: {
                let mut names: Vec<_> = map.keys().cloned().collect();
                names.sort();
                names
            },
        })
    }

    /// Name + description of every discovered tool (discovers lazily)
    pub async fn summaries(&self) -> Result<Vec<ToolSummary>> {
        Ok(self
            .discover()
            .await?
            .into_iter()
            .map(|t| ToolSummary {
                name: t.name,
                description: t.description,
            })
            .collect())
    }

    /// Drop the cache and fetch the catalog again
    pub async fn reload(&self) -> Result<Vec<ToolDefinition>> {
        *self.tools.write().await = None;
        self.discover().await
    }

    fn sorted(tools: &HashMap<String, ToolDefinition>) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = tools.values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_parsing() {
        let raw = serde_json::json!([{
            "type": "function",
            "function": {
                "name": "lookup_user_data",
                "description": "Fetch user-specific data",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "msisdn": {"type": "string"},
                        "query": {"type": "string"}
                    },
                    "required": ["msisdn", "query"]
                },
                "direct_endpoint": "http://localhost:8001/api/lookup_user_data"
            }
        }]);

        let entries: Vec<CatalogEntry> = serde_json::from_value(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].function.name, "lookup_user_data");
        assert!(entries[0].function.direct_endpoint.is_some());
    }

    #[test]
    fn test_catalog_entry_without_direct_endpoint() {
        let raw = serde_json::json!([{
            "type": "function",
            "function": {
                "name": "check_inventory",
                "description": "Check stock levels",
                "parameters": {"type": "object", "properties": {}}
            }
        }]);

        let entries: Vec<CatalogEntry> = serde_json::from_value(raw).unwrap();
        assert!(entries[0].function.direct_endpoint.is_none());
    }

    #[tokio::test]
    async fn test_lookup_before_discovery_is_unknown() {
        let registry = ToolRegistry::new("http://localhost:0", Duration::from_secs(1));
        let err = registry.lookup("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool { .. }));
    }
}
