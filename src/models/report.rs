// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Resident complaints, collector maintenance reports and admin notifications.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

/// Resident complaint (`reports` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    pub user_id: String,
    pub zone: String,
    pub messages: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    #[default]
    Pending,
    Scheduled,
    Done,
}

/// Collector maintenance report (`collector_reports` collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CollectorReport {
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    pub collector_id: String,
    #[serde(rename = "reporttype")]
    pub report_type: String,
    pub report_message: String,
    #[serde(default)]
    pub maintenance_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: MaintenanceStatus,
    pub created_at: DateTime<Utc>,
}

/// Admin-facing notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    /// e.g. "truck_full"
    pub kind: String,
    #[serde(default)]
    pub truck_id: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}
