// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests.
//!
//! Invalid input must be rejected with 400 before anything touches the
//! database; the offline test database would otherwise answer 500.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wastefleet::middleware::auth::Role;

mod common;
use common::{bearer, create_test_app};

async fn send(method: &str, uri: &str, role: Role, body: Value) -> Response {
    let (app, state) = create_test_app();
    let auth = bearer(&state, "user-1", role);
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_location_out_of_range() {
    let response = send(
        "POST",
        "/api/me/location",
        Role::Collector,
        json!({ "latitude": 123.0, "longitude": 10.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pickup_weight_must_be_positive() {
    let response = send(
        "POST",
        "/api/me/collections",
        Role::Collector,
        json!({ "zone": "Zone 3A", "weightKg": -10.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["details"].as_str().unwrap_or_default().contains("weight_kg"));
}

#[tokio::test]
async fn test_pickup_requires_zone() {
    let response = send(
        "POST",
        "/api/me/collections",
        Role::Collector,
        json!({ "zone": "", "weightKg": 120.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_message_too_short() {
    let response = send(
        "POST",
        "/api/reports",
        Role::Resident,
        json!({ "zone": "Zone 1", "messages": "hi" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedule_day_must_be_weekday() {
    let response = send(
        "PUT",
        "/api/admin/schedules/s1",
        Role::Admin,
        json!({ "zone": "Zone 1", "location": "Poblacion", "day": "Funday" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_truck_capacity_must_be_positive() {
    let response = send(
        "POST",
        "/api/admin/trucks",
        Role::Admin,
        json!({
            "id": "T-01",
            "plateNumber": "ABC 123",
            "capacityKg": 0.0,
            "fuelType": "diesel"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_truck_id_rejected() {
    for id in ["   ", "T/01"] {
        let response = send(
            "POST",
            "/api/admin/trucks",
            Role::Admin,
            json!({
                "id": id,
                "plateNumber": "ABC 123",
                "capacityKg": 1000.0,
                "fuelType": "diesel"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{:?}", id);
    }
}

#[tokio::test]
async fn test_blank_collector_id_rejected() {
    let response = send(
        "POST",
        "/api/admin/collectors",
        Role::Admin,
        json!({ "id": "  ", "firstName": "Juan", "lastName": "Dela Cruz" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_future_oil_change_rejected() {
    let response = send(
        "POST",
        "/api/admin/trucks/T-01/oil-change",
        Role::Admin,
        json!({ "date": "2999-01-01" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_search_needs_no_database() {
    let (app, state) = create_test_app();
    let auth = bearer(&state, "admin-1", Role::Admin);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/search?q=%20%20")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["focus"], Value::Null);
}
