//! Agent Configuration

use std::time::Duration;

use crate::invoke::EndpointPolicy;

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant with access to user data tools.

When users ask about car-related issues (diagnostics, maintenance, problems, check lights, etc.),
use the lookup_user_data tool with query='car_details'.

When users ask about orders or purchases, use query='recent_orders'.
When users ask about account or profile info, use query='profile'.

After retrieving data, provide helpful analysis and recommendations based on the data.";

/// Behavior settings for one agent instance
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Base URL of the catalog service
    pub catalog_url: String,

    /// System prompt sent with every provider request
    pub system_prompt: String,

    /// Iteration budget for one run
    pub max_iterations: usize,

    /// Token budget per provider response
    pub max_tokens: u32,

    /// Per-call timeout for every network operation
    pub timeout: Duration,

    /// Prefer direct tool endpoints when advertised
    pub prefer_direct: bool,

    /// Tools pinned to the proxy path
    pub force_proxy_tools: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            catalog_url: "http://localhost:3333".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 5,
            max_tokens: 1024,
            timeout: Duration::from_secs(300),
            prefer_direct: true,
            force_proxy_tools: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// `CATALOG_URL`, `AGENT_MAX_ITERATIONS`, `AGENT_MAX_TOKENS`,
    /// `AGENT_TIMEOUT_SECS`, `AGENT_PREFER_DIRECT`,
    /// `AGENT_FORCE_PROXY_TOOLS` (comma-separated).
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            catalog_url: std::env::var("CATALOG_URL").unwrap_or(defaults.catalog_url),
            system_prompt: defaults.system_prompt,
            max_iterations: env_parse("AGENT_MAX_ITERATIONS", defaults.max_iterations),
            max_tokens: env_parse("AGENT_MAX_TOKENS", defaults.max_tokens),
            timeout: Duration::from_secs(env_parse(
                "AGENT_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            prefer_direct: env_parse("AGENT_PREFER_DIRECT", defaults.prefer_direct),
            force_proxy_tools: std::env::var("AGENT_FORCE_PROXY_TOOLS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Endpoint policy derived from this configuration
    pub fn endpoint_policy(&self) -> EndpointPolicy {
        EndpointPolicy {
            prefer_direct: self.prefer_direct,
            force_proxy: self.force_proxy_tools.iter().cloned().collect(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.catalog_url, "http://localhost:3333");
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.max_tokens, 1024);
        assert!(config.prefer_direct);
        assert!(config.force_proxy_tools.is_empty());
    }

    #[test]
    fn test_endpoint_policy_derivation() {
        let config = AgentConfig {
            prefer_direct: false,
            force_proxy_tools: vec!["lookup_user_data".into()],
            ..Default::default()
        };

        let policy = config.endpoint_policy();
        assert!(!policy.prefer_direct);
        assert!(policy.force_proxy.contains("lookup_user_data"));
    }
}
