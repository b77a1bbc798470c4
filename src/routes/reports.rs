// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resident complaint routes.

use crate::error::Result;
use crate::middleware::auth::{require_role, AuthUser, Role};
use crate::models::Report;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports", post(create_report))
        .route("/api/reports/mine", get(my_reports))
        .route_layer(middleware::from_fn_with_state(Role::Resident, require_role))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewReportRequest {
    #[validate(length(min = 1, max = 100))]
    pub zone: String,
    #[validate(length(min = 5, max = 2000))]
    pub messages: String,
    #[serde(default)]
    #[validate(length(max = 5))]
    pub images: Vec<String>,
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewReportRequest>,
) -> Result<(StatusCode, Json<Report>)> {
    body.validate()?;
    let report = state
        .reports
        .create_report(
            &user.user_id,
            &body.zone,
            &body.messages,
            body.images,
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn my_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Report>>> {
    Ok(Json(state.reports.reports_for_user(&user.user_id).await?))
}
