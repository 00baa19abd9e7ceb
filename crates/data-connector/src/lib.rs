//! # data-connector
//!
//! Catalog service for the toolbridge agent: publishes the tool catalog
//! (`GET /tools`), proxies tool invocations (`POST /tools/{name}`) and
//! serves a direct endpoint for `lookup_user_data` backed by mock data.

pub mod data;
pub mod routes;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::{call_tool, health, list_tools, list_tools_simple, lookup_user_data_direct};

/// Shared route state
#[derive(Clone)]
pub struct ServiceState {
    /// Base URL under which this service is reachable; used to advertise
    /// the direct endpoint in the catalog
    pub public_base: String,
}

/// Build the service router
pub fn router(public_base: impl Into<String>) -> Router {
    let state = ServiceState {
        public_base: public_base.into(),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/simple", get(list_tools_simple))
        .route("/tools/{tool_name}", post(call_tool))
        .route("/api/lookup_user_data", post(lookup_user_data_direct))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
