// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resident complaints and collector maintenance reports.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{CollectorReport, MaintenanceStatus, Report, ReportStatus};
use chrono::{DateTime, NaiveDate, Utc};

/// Document ID for a report: author plus creation time in milliseconds.
///
/// Reports are inserted, never upserted, so a second filing by the same
/// author within one millisecond is a conflict rather than an overwrite.
pub fn report_document_id(author_id: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}",
        urlencoding::encode(author_id),
        created_at.timestamp_millis()
    )
}

#[derive(Clone)]
pub struct ReportService {
    db: FirestoreDb,
}

impl ReportService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn create_report(
        &self,
        user_id: &str,
        zone: &str,
        messages: &str,
        images: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        let report = Report {
            id: report_document_id(user_id, now),
            user_id: user_id.to_string(),
            zone: zone.trim().to_string(),
            messages: messages.trim().to_string(),
            images,
            status: ReportStatus::Pending,
            response: None,
            created_at: now,
        };
        self.db.insert_report(&report).await?;
        tracing::info!(report_id = %report.id, zone = %report.zone, "Report filed");
        Ok(report)
    }

    /// A resident's own reports, newest first.
    pub async fn reports_for_user(&self, user_id: &str) -> Result<Vec<Report>> {
        let mut reports = self.db.list_reports_for_user(user_id).await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub async fn all_reports(&self) -> Result<Vec<Report>> {
        let mut reports = self.db.list_reports().await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Admin response; marks the report in progress unless a status is given.
    pub async fn respond(
        &self,
        report_id: &str,
        response: &str,
        status: Option<ReportStatus>,
    ) -> Result<Report> {
        let mut report = self
            .db
            .get_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

        report.response = Some(response.trim().to_string());
        report.status = status.unwrap_or(ReportStatus::InProgress);
        self.db.set_report(&report).await?;
        tracing::info!(report_id, status = ?report.status, "Report answered");
        Ok(report)
    }

    pub async fn create_maintenance_report(
        &self,
        collector_id: &str,
        report_type: &str,
        message: &str,
        maintenance_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<CollectorReport> {
        if self.db.get_collector(collector_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Collector {} not found",
                collector_id
            )));
        }

        let report = CollectorReport {
            id: report_document_id(collector_id, now),
            collector_id: collector_id.to_string(),
            report_type: report_type.trim().to_string(),
            report_message: message.trim().to_string(),
            maintenance_date,
            status: MaintenanceStatus::Pending,
            created_at: now,
        };
        self.db.insert_collector_report(&report).await?;
        tracing::info!(report_id = %report.id, collector_id, "Maintenance report filed");
        Ok(report)
    }

    pub async fn maintenance_reports(&self) -> Result<Vec<CollectorReport>> {
        let mut reports = self.db.list_collector_reports().await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub async fn set_maintenance_status(
        &self,
        report_id: &str,
        status: MaintenanceStatus,
        maintenance_date: Option<NaiveDate>,
    ) -> Result<CollectorReport> {
        let mut report = self
            .db
            .get_collector_report(report_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Maintenance report {} not found", report_id))
            })?;

        report.status = status;
        if maintenance_date.is_some() {
            report.maintenance_date = maintenance_date;
        }
        self.db.set_collector_report(&report).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_document_id() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(report_document_id("user 7", at), "user%207_1714550400000");
    }

    #[tokio::test]
    async fn test_offline_create_is_database_error() {
        let service = ReportService::new(FirestoreDb::new_mock());
        let err = service
            .create_report("u1", "Zone 1", "Missed pickup", vec![], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
