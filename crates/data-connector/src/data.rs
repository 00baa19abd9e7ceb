//! Mock User Data
//!
//! Simulated backend data keyed by query type. Stands in for a real user
//! data store so the system is runnable and testable end to end.

use serde_json::{json, Value};

/// Simulated data lookup for a user
pub fn mock_user_data(msisdn: &str, query: &str) -> Value {
    tracing::info!(%msisdn, %query, "looking up user data");

    let result = match query {
        "car_details" => json!({
            "make": "Mazda",
            "model": "MX-5 Grand Touring",
            "year": 2021,
            "color": "Gray Metallic",
            "registration": "PA-01-AB-1234"
        }),
        "recent_orders" => json!([
            {"order_id": "12345", "item": "Product A", "date": "2026-01-01"},
            {"order_id": "12346", "item": "Product B", "date": "2026-01-03"}
        ]),
        "profile" => json!({
            "name": "John Doe",
            "email": "john@example.com",
            "address": "123 Main St"
        }),
        other => json!(format!("No data found for query: {}", other)),
    };

    json!({
        "msisdn": msisdn,
        "query": query,
        "result": result
    })
}

/// Parameter schema for the `lookup_user_data` tool
pub fn lookup_user_data_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "msisdn": {
                "type": "string",
                "description": "The phone number of the user (e.g., +919916103095)"
            },
            "query": {
                "type": "string",
                "description": "The type of data to retrieve (e.g., 'car_details', 'recent_orders', 'profile')"
            }
        },
        "required": ["msisdn", "query"]
    })
}
