mod common;

use common::TestApp;
use planet_service::handlers::planet::LOOKUP_FAILED_BODY;
use planet_service::services::DisconnectedStore;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn known_id_returns_stored_record() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "id": 3 })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body,
        json!({
            "name": "Mars",
            "id": 3,
            "description": "Red planet",
            "image": "mars.png",
            "velocity": "24.1 km/s",
            "distance": "227.9M km"
        })
    );
}

#[tokio::test]
async fn sparse_record_omits_missing_fields() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app
        .post_planet(json!({ "id": 1 }))
        .await
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(body, json!({ "name": "Mercury", "id": 1 }));
}

#[tokio::test]
async fn unknown_id_returns_empty_ok_response() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "id": 999 })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.is_empty(), "expected empty body, got {:?}", body);
}

#[tokio::test]
async fn integral_float_id_finds_the_record() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "id": 3.0 })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["name"], "Mars");
}

#[tokio::test]
async fn fractional_id_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "id": 3.5 })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_integer_id_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "id": "three" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_id_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_planet(json!({ "name": "Mars" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_returns_plain_text_500() {
    let app =
        TestApp::spawn_with_store(Arc::new(DisconnectedStore::new("connection refused")), None)
            .await;

    let response = app.post_planet(json!({ "id": 3 })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = response
        .headers()
        .get("content-type")
        .expect("Missing content-type header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(response.text().await.unwrap(), LOOKUP_FAILED_BODY);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/planet", app.address))
        .header("x-request-id", "lookup-42")
        .json(&json!({ "id": 3 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "lookup-42");
}
