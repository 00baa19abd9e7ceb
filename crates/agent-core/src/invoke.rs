//! Tool Invocation
//!
//! Resolves an endpoint for a named tool per the selection policy and
//! performs the network call. The invoker never retries; recovery is the
//! caller's decision.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{ToolDefinition, ToolRegistry};
use crate::error::{AgentError, Result};

/// Process-wide endpoint selection settings
#[derive(Clone, Debug, Default)]
pub struct EndpointPolicy {
    /// Prefer the tool's direct endpoint when one is registered
    pub prefer_direct: bool,

    /// Tools pinned to the proxy path regardless of preference
    pub force_proxy: HashSet<String>,
}

/// How the endpoint for a call was chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Direct,
    Proxy,
    /// Direct was preferred but the tool has no direct endpoint
    ProxyFallback,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::Direct => write!(f, "direct"),
            CallKind::Proxy => write!(f, "proxy"),
            CallKind::ProxyFallback => write!(f, "proxy (fallback)"),
        }
    }
}

/// Resolve the endpoint for a tool call.
///
/// Pure function of its inputs. Precedence: the per-call override beats the
/// process default; force-proxy membership beats both; a direct preference
/// without a registered direct endpoint falls back to the proxy.
pub fn resolve_endpoint<'a>(
    tool: &'a ToolDefinition,
    prefer_direct_override: Option<bool>,
    policy: &EndpointPolicy,
) -> (&'a str, CallKind) {
    let mut prefer_direct = prefer_direct_override.unwrap_or(policy.prefer_direct);

    if policy.force_proxy.contains(&tool.name) {
        prefer_direct = false;
    }

    if prefer_direct {
        match &tool.direct_endpoint {
            Some(endpoint) => (endpoint, CallKind::Direct),
            None => (&tool.proxy_endpoint, CallKind::ProxyFallback),
        }
    } else {
        (&tool.proxy_endpoint, CallKind::Proxy)
    }
}

/// Performs tool calls against resolved endpoints
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    client: reqwest::Client,
    timeout: Duration,
    policy: EndpointPolicy,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration, policy: EndpointPolicy) -> Self {
        Self {
            registry,
            client: reqwest::Client::new(),
            timeout,
            policy,
        }
    }

    /// Current endpoint policy
    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// Invoke a tool by name.
    ///
    /// Triggers registry discovery if it has not run yet. `prefer_direct`
    /// overrides the process default for this one call.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: &serde_json::Value,
        prefer_direct: Option<bool>,
    ) -> Result<serde_json::Value> {
        self.registry.discover().await?;
        let tool = self.registry.lookup(name).await?;

        let (endpoint, call_kind) = resolve_endpoint(&tool, prefer_direct, &self.policy);
        if call_kind == CallKind::ProxyFallback {
            tracing::warn!(
                tool = %name,
                "tool has no direct endpoint, falling back to proxy"
            );
        }

        tracing::info!(tool = %name, kind = %call_kind, "invoking tool");
        tracing::debug!(%endpoint, input = %arguments, "tool request");

        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .json(arguments)
            .send()
            .await
            .map_err(|e| AgentError::ToolExecution {
                name: name.into(),
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(tool = %name, %status, %body, "tool execution failed");
            return Err(AgentError::ToolExecution {
                name: name.into(),
                status: Some(status.as_u16()),
                reason: format!("status {}: {}", status, body),
            });
        }

        let result = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AgentError::ToolExecution {
                name: name.into(),
                status: None,
                reason: format!("invalid result body: {}", e),
            })?;

        tracing::info!(tool = %name, kind = %call_kind, "tool executed");
        tracing::debug!(result = %result, "tool result");
        Ok(result)
    }
}
