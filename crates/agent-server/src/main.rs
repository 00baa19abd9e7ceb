//! toolbridge HTTP Server
//!
//! Axum wrapper around the agent: one endpoint to run a query through a
//! selectable LLM provider, plus catalog and provider introspection.

mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use agent_core::{AgentConfig, ProviderKind};

use crate::handlers::{generate, health_check, list_providers, list_tools};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/api/tools", get(list_tools))
        .route("/api/providers", get(list_providers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let default_provider = std::env::var("DEFAULT_LLM_PROVIDER")
        .ok()
        .and_then(|v| v.parse().ok())
        .and_then(ProviderKind::from_index)
        .unwrap_or(ProviderKind::Anthropic);

    let agent_config = AgentConfig::from_env();
    tracing::info!(
        provider = %default_provider,
        catalog = %agent_config.catalog_url,
        max_iterations = agent_config.max_iterations,
        "starting agent server"
    );

    let state = AppState::new(default_provider, agent_config);

    // Warm up the default agent so credential problems surface at startup
    match state.agent_for(default_provider).await {
        Ok(agent) => match agent.discover_tools().await {
            Ok(tools) => {
                tracing::info!("discovered {} tools:", tools.len());
                for tool in tools {
                    tracing::info!("  • {}", tool.name);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog not reachable yet - discovery will retry");
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "default provider not usable - requests will fail until fixed");
        }
    }

    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("agent server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health         - Health check");
    tracing::info!("  POST /generate       - Run the agent on a query");
    tracing::info!("  GET  /api/tools      - List catalog tools");
    tracing::info!("  GET  /api/providers  - List LLM providers");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(ProviderKind::Ollama, AgentConfig::default())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["default_provider"], "ollama");
    }

    #[tokio::test]
    async fn test_providers_endpoint_lists_all_families() {
        let response = router(test_state())
            .oneshot(Request::get("/api/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let providers = json.as_array().unwrap();
        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0]["id"], "ollama");
        assert_eq!(providers[1]["required_credential"], "ANTHROPIC_API_KEY");
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_provider_index() {
        let request = Request::post("/generate")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"id": "u1", "message": "hello", "llm": 7}"#,
            ))
            .unwrap();

        let response = router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INVALID_PROVIDER");
    }
}
