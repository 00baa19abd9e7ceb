//! HTTP Routes
//!
//! Tool discovery in function-calling format, proxy invocation dispatch,
//! and the direct endpoint for `lookup_user_data`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::data::{lookup_user_data_parameters, mock_user_data};
use crate::ServiceState;

const LOOKUP_USER_DATA: &str = "lookup_user_data";

/// Catalog listing in OpenAI/Ollama function-calling format.
/// `lookup_user_data` advertises a direct endpoint on this same service.
pub async fn list_tools(State(state): State<ServiceState>) -> Json<Value> {
    Json(json!([
        {
            "type": "function",
            "function": {
                "name": LOOKUP_USER_DATA,
                "description": "Fetch user-specific data including car details, orders, profile information, etc.",
                "parameters": lookup_user_data_parameters(),
                "direct_endpoint": format!("{}/api/lookup_user_data", state.public_base)
            }
        }
    ]))
}

/// Simplified listing: name, description and a flat input schema
pub async fn list_tools_simple() -> Json<Value> {
    let parameters = lookup_user_data_parameters();
    let input_schema: Value = parameters["properties"]
        .as_object()
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| {
                    (
                        name.clone(),
                        json!({
                            "type": prop["type"],
                            "description": prop["description"]
                        }),
                    )
                })
                .collect::<serde_json::Map<_, _>>()
                .into()
        })
        .unwrap_or_default();

    Json(json!([{
        "name": LOOKUP_USER_DATA,
        "description": "Fetch user-specific data including car details, orders, profile information, etc.",
        "input_schema": input_schema
    }]))
}

#[derive(Debug, Deserialize)]
pub struct LookupUserDataRequest {
    pub msisdn: String,
    pub query: String,
}

/// Proxy invocation: dispatch a tool call by name
pub async fn call_tool(
    Path(tool_name): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match tool_name.as_str() {
        LOOKUP_USER_DATA => {
            let request: LookupUserDataRequest =
                serde_json::from_value(payload).map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"detail": e.to_string()})),
                    )
                })?;

            Ok(Json(mock_user_data(&request.msisdn, &request.query)))
        }
        other => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"detail": format!("Tool '{}' not found", other)})),
        )),
    }
}

/// Direct endpoint, bypassing the proxy dispatch
pub async fn lookup_user_data_direct(
    Json(request): Json<LookupUserDataRequest>,
) -> Json<Value> {
    let mut data = mock_user_data(&request.msisdn, &request.query);
    data["service"] = json!("data-connector");
    Json(data)
}

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "server": "data-connector"}))
}
