//! Agent Loop
//!
//! Orchestrates discovery, conversation state and iteration across the
//! provider adapter and the tool invoker. Provider-call failures abort the
//! run; tool-call failures are folded back into the conversation so the
//! model can adapt.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::catalog::{ToolRegistry, ToolSummary};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::invoke::ToolInvoker;
use crate::message::Message;
use crate::provider::{Decision, ProviderAdapter};

/// Terminal result of a run that did not fail
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a final answer
    Answer(String),

    /// The iteration budget ran out before a final answer
    Exhausted { iterations: usize },
}

impl RunOutcome {
    /// Display text: the answer, or the exhaustion sentinel
    pub fn text(&self) -> &str {
        match self {
            RunOutcome::Answer(text) => text,
            RunOutcome::Exhausted { .. } => "max iterations reached",
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RunOutcome::Exhausted { .. })
    }
}

/// Loop status, tracked per run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Finished,
    Exhausted,
    Failed,
}

/// Per-run mutable state: 0-based iteration counter and append-only history
struct RunState {
    iteration: usize,
    history: Vec<Message>,
}

/// The agent: one provider adapter, one tool registry, one invoker.
///
/// A single instance serves concurrent runs; the registry's discovery cache
/// is the only shared mutable state.
pub struct Agent {
    adapter: Arc<dyn ProviderAdapter>,
    registry: Arc<ToolRegistry>,
    invoker: ToolInvoker,
    config: AgentConfig,
}

impl Agent {
    /// Create an agent with its own registry pointed at the configured catalog
    pub fn new(adapter: Arc<dyn ProviderAdapter>, config: AgentConfig) -> Self {
        let registry = Arc::new(ToolRegistry::new(config.catalog_url.clone(), config.timeout));
        Self::with_registry(adapter, config, registry)
    }

    /// Create an agent sharing an existing registry
    pub fn with_registry(
        adapter: Arc<dyn ProviderAdapter>,
        config: AgentConfig,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        let invoker = ToolInvoker::new(registry.clone(), config.timeout, config.endpoint_policy());
        Self {
            adapter,
            registry,
            invoker,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn invoker(&self) -> &ToolInvoker {
        &self.invoker
    }

    /// Name + description of every catalog tool, for capability listings
    pub async fn discover_tools(&self) -> Result<Vec<ToolSummary>> {
        self.registry.summaries().await
    }

    /// Run the agent loop to completion or exhaustion
    pub async fn run(&self, user_id: &str, query: &str) -> Result<RunOutcome> {
        self.run_with_cancel(user_id, query, CancellationToken::new())
            .await
    }

    /// Run the agent loop, stopping promptly if `cancel` fires.
    ///
    /// Without a cancellation request this behaves exactly like [`run`]:
    /// the loop ends only on a final answer, an exhausted budget, or a
    /// fatal provider error.
    ///
    /// [`run`]: Agent::run
    pub async fn run_with_cancel(
        &self,
        user_id: &str,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        tracing::info!(provider = %self.adapter.kind(), %user_id, %query, "starting run");

        let tools = race(&cancel, self.registry.discover()).await?;

        let user_message = format!("{} {}", user_id, query);
        let mut state = RunState {
            iteration: 0,
            history: vec![Message::user(user_message.clone())],
        };

        while state.iteration < self.config.max_iterations {
            tracing::debug!(
                iteration = state.iteration,
                budget = self.config.max_iterations,
                "agent iteration"
            );

            let decision = race(
                &cancel,
                self.adapter
                    .decide(&state.history, &tools, Some(self.config.system_prompt.as_str())),
            )
            .await
            .inspect_err(|e| {
                tracing::error!(status = ?RunStatus::Failed, error = %e, "provider call failed, aborting run");
            })?;

            match decision {
                Decision::FinalAnswer(text) => {
                    tracing::info!(
                        status = ?RunStatus::Finished,
                        iterations = state.iteration + 1,
                        "run finished"
                    );
                    return Ok(RunOutcome::Answer(text));
                }

                Decision::ToolCall(call) => {
                    match race(
                        &cancel,
                        self.invoker.invoke(&call.name, &call.arguments, None),
                    )
                    .await
                    {
                        Ok(result) => {
                            state.history.push(Message::tool_use(
                                call.call_id.as_str(),
                                call.name.as_str(),
                                call.arguments.clone(),
                            ));
                            state
                                .history
                                .push(Message::tool_result(call.call_id.as_str(), result.to_string()));

                            if let Some(text) = self
                                .adapter
                                .finalize_after_tool(&user_message, &call, &result)
                                .await?
                            {
                                tracing::info!(
                                    status = ?RunStatus::Finished,
                                    iterations = state.iteration + 1,
                                    "run finished after tool finalization"
                                );
                                return Ok(RunOutcome::Answer(text));
                            }
                        }
                        Err(e) if e.is_recoverable() => {
                            tracing::warn!(tool = %call.name, error = %e, "tool failed, continuing");
                            state
                                .history
                                .push(Message::user(format!("Tool failed: {}", e)));
                        }
                        Err(e) => return Err(e),
                    }
                }

                Decision::Unrecognized => {
                    tracing::warn!(iteration = state.iteration, "unrecognized provider response");
                }
            }

            state.iteration += 1;
        }

        tracing::warn!(
            status = ?RunStatus::Exhausted,
            iterations = self.config.max_iterations,
            "iteration budget exhausted without a final answer"
        );
        Ok(RunOutcome::Exhausted {
            iterations: self.config.max_iterations,
        })
    }
}

/// Race a loop step against the caller's cancellation request
async fn race<T>(
    cancel: &CancellationToken,
    step: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        result = step => result,
    }
}
