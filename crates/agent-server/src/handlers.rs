//! HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, ProviderKind, ToolSummary};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub default_provider: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Caller-supplied user identifier, prepended to the query
    pub id: String,

    /// The user's query
    pub message: String,

    /// Provider selector: 0=Ollama, 1=Anthropic, 2=OpenAI.
    /// Falls back to the server default when absent.
    #[serde(default)]
    pub llm: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub result: String,
    pub llm_used: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct ProviderInfo {
    pub index: u8,
    pub id: &'static str,
    pub default_model: &'static str,
    pub required_credential: Option<&'static str>,
    pub default: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        default_provider: state.default_provider.as_str(),
    })
}

/// Run the agent on a user query
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let kind = match payload.llm {
        Some(index) => ProviderKind::from_index(index).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!(
                        "Invalid LLM value: {}. Must be 0 (Ollama), 1 (Anthropic), or 2 (OpenAI)",
                        index
                    ),
                    code: "INVALID_PROVIDER".into(),
                }),
            )
        })?,
        None => state.default_provider,
    };

    let agent = state.agent_for(kind).await.map_err(into_http_error)?;

    let outcome = agent
        .run(&payload.id, &payload.message)
        .await
        .map_err(into_http_error)?;

    Ok(Json(GenerateResponse {
        result: outcome.text().to_string(),
        llm_used: kind.as_str(),
    }))
}

/// Tool summaries from the catalog, for capability displays
pub async fn list_tools(
    State(state): State<AppState>,
) -> Result<Json<Vec<ToolSummary>>, (StatusCode, Json<ErrorResponse>)> {
    let agent = state
        .agent_for(state.default_provider)
        .await
        .map_err(into_http_error)?;

    let tools = agent.discover_tools().await.map_err(into_http_error)?;
    Ok(Json(tools))
}

/// Available provider families and their requirements
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let providers = [
        ProviderKind::Ollama,
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
    ]
    .into_iter()
    .map(|kind| ProviderInfo {
        index: kind.as_index(),
        id: kind.as_str(),
        default_model: kind.default_model(),
        required_credential: kind.required_credential(),
        default: kind == state.default_provider,
    })
    .collect();

    Json(providers)
}

fn into_http_error(e: AgentError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &e {
        AgentError::Configuration(_) => (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR"),
        AgentError::Discovery(_) => (StatusCode::SERVICE_UNAVAILABLE, "DISCOVERY_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    };

    tracing::error!(error = %e, "request failed");

    (
        status,
        Json(ErrorResponse {
            error: e.user_message(),
            code: code.into(),
        }),
    )
}
