// Integration tests for the catalog service wire format and dispatch.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
    let response = data_connector::router("http://localhost:3333")
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(path: &str, payload: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = data_connector::router("http://localhost:3333")
        .oneshot(request)
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_catalog_uses_function_calling_format() {
    let (status, catalog) = get_json("/tools").await;
    assert_eq!(status, StatusCode::OK);

    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry["type"], "function");
    assert_eq!(entry["function"]["name"], "lookup_user_data");
    assert_eq!(
        entry["function"]["direct_endpoint"],
        "http://localhost:3333/api/lookup_user_data"
    );

    let required = entry["function"]["parameters"]["required"].as_array().unwrap();
    assert!(required.contains(&serde_json::json!("msisdn")));
    assert!(required.contains(&serde_json::json!("query")));
}

#[tokio::test]
async fn test_simple_listing_flattens_schema() {
    let (status, listing) = get_json("/tools/simple").await;
    assert_eq!(status, StatusCode::OK);

    let entry = &listing.as_array().unwrap()[0];
    assert_eq!(entry["name"], "lookup_user_data");
    assert_eq!(entry["input_schema"]["msisdn"]["type"], "string");
}

#[tokio::test]
async fn test_proxy_invocation_returns_mock_record() {
    let (status, result) = post_json(
        "/tools/lookup_user_data",
        r#"{"msisdn": "+919916103095", "query": "car_details"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["result"]["make"], "Mazda");
    assert_eq!(result["result"]["model"], "MX-5 Grand Touring");
    // The proxy path does not stamp the service field
    assert!(result.get("service").is_none());
}

#[tokio::test]
async fn test_direct_endpoint_stamps_service_field() {
    let (status, result) = post_json(
        "/api/lookup_user_data",
        r#"{"msisdn": "u1", "query": "profile"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["result"]["name"], "John Doe");
    assert_eq!(result["service"], "data-connector");
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let (status, body) = post_json("/tools/does_not_exist", r#"{}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("does_not_exist"));
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let (status, _body) = post_json("/tools/lookup_user_data", r#"{"msisdn": "u1"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
