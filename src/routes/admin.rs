// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin dashboard routes (`/api/admin/...`).

use crate::db::firestore::AssignmentOutcome;
use crate::error::{AppError, Result};
use crate::middleware::auth::{require_role, Role};
use crate::models::truck::next_oil_change;
use crate::models::{
    Collector, CollectorReport, CollectorStatus, MaintenanceStatus, Notification, Report,
    ReportStatus, Schedule, Truck, TruckStatus,
};
use crate::services::dashboard::{map_to_geojson, MapSnapshot};
use crate::services::fleet::TruckIndicators;
use crate::services::search::SearchOutcome;
use crate::time_utils::weekday_name;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc, Weekday};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Admin routes. JWT auth is applied in routes/mod.rs; this router
/// additionally requires the admin role.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/search", get(search))
        .route("/api/admin/map", get(map))
        .route("/api/admin/map.geojson", get(map_geojson))
        .route("/api/admin/fleet", get(fleet))
        .route("/api/admin/trucks", post(create_truck))
        .route("/api/admin/trucks/{id}/collectors", get(truck_collectors))
        .route("/api/admin/trucks/{id}/dump", post(dump_truck))
        .route("/api/admin/trucks/{id}/oil-change", post(record_oil_change))
        .route("/api/admin/collectors", post(create_collector))
        .route("/api/admin/collectors/{id}/truck", post(assign_truck))
        .route("/api/admin/schedules", get(list_schedules))
        .route("/api/admin/schedules/{id}", put(upsert_schedule))
        .route("/api/admin/reports", get(list_reports))
        .route("/api/admin/reports/{id}/response", post(respond_to_report))
        .route("/api/admin/maintenance-reports", get(list_maintenance_reports))
        .route(
            "/api/admin/maintenance-reports/{id}/status",
            post(set_maintenance_status),
        )
        .route("/api/admin/notifications", get(list_notifications))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchOutcome>> {
    Ok(Json(state.dashboard.search(&params.q).await?))
}

async fn map(State(state): State<Arc<AppState>>) -> Result<Json<MapSnapshot>> {
    Ok(Json(state.dashboard.map(Utc::now()).await?))
}

async fn map_geojson(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let snapshot = state.dashboard.map(Utc::now()).await?;
    let body = serde_json::to_string(&map_to_geojson(&snapshot))
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(([(header::CONTENT_TYPE, "application/geo+json")], body))
}

async fn truck_collectors(
    State(state): State<Arc<AppState>>,
    Path(truck_id): Path<String>,
) -> Result<Json<Vec<Collector>>> {
    Ok(Json(state.dashboard.truck_collectors(&truck_id).await?))
}

// ─── Fleet ───────────────────────────────────────────────────

async fn fleet(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TruckIndicators>>> {
    Ok(Json(state.fleet.overview(Utc::now()).await?))
}

async fn dump_truck(
    State(state): State<Arc<AppState>>,
    Path(truck_id): Path<String>,
) -> Result<Json<TruckIndicators>> {
    Ok(Json(state.fleet.dump_truck(&truck_id, Utc::now()).await?))
}

#[derive(Debug, Default, Deserialize)]
struct OilChangeRequest {
    #[serde(default)]
    date: Option<NaiveDate>,
}

async fn record_oil_change(
    State(state): State<Arc<AppState>>,
    Path(truck_id): Path<String>,
    Json(body): Json<OilChangeRequest>,
) -> Result<Json<TruckIndicators>> {
    Ok(Json(
        state
            .fleet
            .record_oil_change(&truck_id, body.date, Utc::now())
            .await?,
    ))
}

/// IDs become Firestore document keys after trimming.
fn validate_document_id(id: &str) -> std::result::Result<(), ValidationError> {
    let id = id.trim();
    let reserved = id == "." || id == ".." || (id.starts_with("__") && id.ends_with("__"));
    if id.is_empty() || id.contains('/') || reserved {
        Err(ValidationError::new("document_id"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTruckRequest {
    #[validate(length(min = 1, max = 40), custom(function = "validate_document_id"))]
    pub id: String,
    #[validate(length(min = 2, max = 20))]
    pub plate_number: String,
    #[validate(range(exclusive_min = 0.0))]
    pub capacity_kg: f64,
    #[validate(length(min = 2, max = 20))]
    pub fuel_type: String,
    pub last_oil_change: Option<NaiveDate>,
}

async fn create_truck(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTruckRequest>,
) -> Result<(StatusCode, Json<Truck>)> {
    body.validate()?;
    let truck = Truck {
        id: body.id.trim().to_string(),
        plate_number: body.plate_number.trim().to_string(),
        capacity_kg: body.capacity_kg,
        fuel_type: body.fuel_type.trim().to_string(),
        status: TruckStatus::Active,
        current_load_kg: 0.0,
        needs_dumping: false,
        collection_history: vec![],
        last_oil_change: body.last_oil_change,
        next_oil_change: body.last_oil_change.and_then(next_oil_change),
        location: None,
    };
    state.db.create_truck(&truck).await?;
    Ok((StatusCode::CREATED, Json(truck)))
}

// ─── Collectors ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCollectorRequest {
    #[validate(length(min = 1, max = 128), custom(function = "validate_document_id"))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 7, max = 20))]
    pub contact_number: Option<String>,
}

async fn create_collector(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewCollectorRequest>,
) -> Result<(StatusCode, Json<Collector>)> {
    body.validate()?;
    let collector = Collector {
        id: body.id.trim().to_string(),
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        assigned_truck_id: None,
        status: CollectorStatus::Offline,
        location: None,
        last_active: None,
        contact_number: body.contact_number,
        created_at: Some(Utc::now()),
    };
    state.db.create_collector(&collector).await?;
    Ok((StatusCode::CREATED, Json(collector)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignTruckRequest {
    /// `null` clears the assignment
    truck_id: Option<String>,
    /// Take the truck from whoever holds it
    #[serde(default)]
    force: bool,
}

async fn assign_truck(
    State(state): State<Arc<AppState>>,
    Path(collector_id): Path<String>,
    Json(body): Json<AssignTruckRequest>,
) -> Result<Json<AssignmentOutcome>> {
    let outcome = state
        .tracking
        .assign_truck(&collector_id, body.truck_id.as_deref(), body.force)
        .await?;
    Ok(Json(outcome))
}

// ─── Schedules ───────────────────────────────────────────────

fn validate_weekday(day: &str) -> std::result::Result<(), ValidationError> {
    let known = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .any(|d| weekday_name(d).eq_ignore_ascii_case(day.trim()));
    if known {
        Ok(())
    } else {
        Err(ValidationError::new("weekday"))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[validate(length(min = 1, max = 100))]
    pub zone: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(custom(function = "validate_weekday"))]
    pub day: String,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub collector_id: Option<String>,
}

async fn list_schedules(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Schedule>>> {
    Ok(Json(state.db.list_schedules().await?))
}

async fn upsert_schedule(
    State(state): State<Arc<AppState>>,
    Path(schedule_id): Path<String>,
    Json(body): Json<ScheduleRequest>,
) -> Result<Json<Schedule>> {
    body.validate()?;
    let schedule = Schedule {
        id: schedule_id,
        zone: body.zone.trim().to_string(),
        location: body.location.trim().to_string(),
        day: body.day.trim().to_string(),
        time: body.time.trim().to_string(),
        group_name: body.group_name.trim().to_string(),
        driver: body.driver.trim().to_string(),
        members: body.members,
        collector_id: body
            .collector_id
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };
    state.db.upsert_schedule(&schedule).await?;
    Ok(Json(schedule))
}

// ─── Reports ─────────────────────────────────────────────────

async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Report>>> {
    Ok(Json(state.reports.all_reports().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RespondRequest {
    #[validate(length(min = 1, max = 2000))]
    pub response: String,
    pub status: Option<ReportStatus>,
}

async fn respond_to_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<Report>> {
    body.validate()?;
    Ok(Json(
        state
            .reports
            .respond(&report_id, &body.response, body.status)
            .await?,
    ))
}

async fn list_maintenance_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CollectorReport>>> {
    Ok(Json(state.reports.maintenance_reports().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaintenanceStatusRequest {
    status: MaintenanceStatus,
    #[serde(default)]
    maintenance_date: Option<NaiveDate>,
}

async fn set_maintenance_status(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Json(body): Json<MaintenanceStatusRequest>,
) -> Result<Json<CollectorReport>> {
    Ok(Json(
        state
            .reports
            .set_maintenance_status(&report_id, body.status, body.maintenance_date)
            .await?,
    ))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Notification>>> {
    let mut notifications = state.db.list_notifications().await?;
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(notifications))
}
