// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use wastefleet::error::AppError;
use wastefleet::services::fleet::FleetError;

#[test]
fn test_business_conflicts_map_to_409() {
    let err = AppError::Conflict("Truck T-01 is already assigned to juan01".to_string());
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

    let err: AppError = FleetError::AlreadyRecorded {
        zone: "Zone 3A".to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    }
    .into();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}

#[test]
fn test_invalid_weight_maps_to_400() {
    let err: AppError = FleetError::InvalidWeight(-5.0).into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_database_errors_hide_details() {
    let err = AppError::Database("connection reset".to_string());
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_forbidden_role() {
    assert_eq!(
        AppError::Forbidden.into_response().status(),
        StatusCode::FORBIDDEN
    );
}

#[test]
fn test_geocoding_failure_is_bad_gateway() {
    let err: AppError = wastefleet::services::geocode::GeocodeError::NoResults.into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
}
