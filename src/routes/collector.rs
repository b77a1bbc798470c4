// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector app routes (`/api/me/...`).

use crate::db::firestore::{PickupOutcome, ShiftOutcome};
use crate::error::Result;
use crate::middleware::auth::{require_role, AuthUser, Role};
use crate::models::{CollectorReport, GeoPoint};
use crate::services::correlation::ScheduleOverview;
use crate::services::fleet::NewPickup;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Collector routes. JWT auth is applied in routes/mod.rs; this router
/// additionally requires the collector role.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me/schedules", get(get_my_schedules))
        .route("/api/me/location", post(push_location))
        .route("/api/me/shift/start", post(start_shift))
        .route("/api/me/shift/end", post(end_shift))
        .route("/api/me/collections", post(record_collection))
        .route("/api/me/maintenance-reports", post(file_maintenance_report))
        .route_layer(middleware::from_fn_with_state(Role::Collector, require_role))
}

// ─── Schedules ───────────────────────────────────────────────

async fn get_my_schedules(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ScheduleOverview>> {
    let overview = state.correlation.overview(&user.user_id, Utc::now()).await?;
    Ok(Json(overview))
}

// ─── Location & Shift ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub truck_id: Option<String>,
}

async fn push_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LocationRequest>,
) -> Result<Json<LocationResponse>> {
    body.validate()?;
    let truck_id = state
        .tracking
        .push_location(
            &user.user_id,
            GeoPoint::new(body.latitude, body.longitude),
            Utc::now(),
        )
        .await?;
    Ok(Json(LocationResponse { truck_id }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    #[serde(flatten)]
    pub shift: ShiftOutcome,
    /// How often the app should push its location while on shift
    pub location_push_interval_secs: Option<u64>,
}

async fn start_shift(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ShiftResponse>> {
    let shift = state.tracking.start_shift(&user.user_id, Utc::now()).await?;
    tracing::info!(collector_id = %user.user_id, truck_id = ?shift.truck_id, "Shift started");
    Ok(Json(ShiftResponse {
        shift,
        location_push_interval_secs: Some(state.config.location_push_interval_secs),
    }))
}

async fn end_shift(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ShiftResponse>> {
    let shift = state.tracking.end_shift(&user.user_id, Utc::now()).await?;
    tracing::info!(collector_id = %user.user_id, truck_id = ?shift.truck_id, "Shift ended");
    Ok(Json(ShiftResponse {
        shift,
        location_push_interval_secs: None,
    }))
}

// ─── Pickups ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub schedule_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub zone: String,
    #[validate(range(exclusive_min = 0.0))]
    pub weight_kg: f64,
    pub location: Option<GeoPoint>,
}

async fn record_collection(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CollectionRequest>,
) -> Result<(StatusCode, Json<PickupOutcome>)> {
    body.validate()?;
    let outcome = state
        .fleet
        .record_pickup(
            NewPickup {
                collector_id: user.user_id,
                schedule_id: body.schedule_id,
                zone: body.zone,
                weight_kg: body.weight_kg,
                location: body.location,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Maintenance Reports ─────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReportRequest {
    #[validate(length(min = 1, max = 50))]
    pub report_type: String,
    #[validate(length(min = 5, max = 2000))]
    pub message: String,
    pub maintenance_date: Option<NaiveDate>,
}

async fn file_maintenance_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<MaintenanceReportRequest>,
) -> Result<(StatusCode, Json<CollectorReport>)> {
    body.validate()?;
    let report = state
        .reports
        .create_maintenance_report(
            &user.user_id,
            &body.report_type,
            &body.message,
            body.maintenance_date,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_request_rejects_zero_weight() {
        let req = CollectionRequest {
            schedule_id: None,
            zone: "Zone 1".to_string(),
            weight_kg: 0.0,
            location: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_location_request_range() {
        let ok = LocationRequest {
            latitude: 10.7,
            longitude: 122.9,
        };
        assert!(ok.validate().is_ok());
        let bad = LocationRequest {
            latitude: 91.0,
            longitude: 122.9,
        };
        assert!(bad.validate().is_err());
    }
}
