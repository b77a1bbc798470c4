// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Collectors, trucks and schedules (the fleet roster)
//! - Collections (pickups) and notifications
//! - Resident reports and collector maintenance reports
//!
//! The "at most one" rules (one collector per truck, one pickup per zone per
//! day) and the collector/truck location mirror run inside transactions so
//! concurrent admin or device sessions cannot interleave their writes.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    CollectionRecord, Collector, CollectorReport, CollectorStatus, GeoPoint, LoadUpdate,
    Notification, Report, Schedule, Truck, TruckStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Result of an atomic truck assignment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub collector_id: String,
    pub truck_id: Option<String>,
    /// Truck the collector held before
    pub previous_truck_id: Option<String>,
    /// Collectors whose assignment was cleared by a forced reassignment
    pub released_collector_ids: Vec<String>,
}

/// Result of a shift start/end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOutcome {
    pub collector_id: String,
    pub status: CollectorStatus,
    pub truck_id: Option<String>,
    pub truck_status: Option<TruckStatus>,
}

/// Result of an atomic pickup write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOutcome {
    pub record: CollectionRecord,
    pub load: LoadUpdate,
    pub truck_status: TruckStatus,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Query documents where `field == value`.
    async fn query_eq<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a document, failing with `Conflict` if the ID is taken.
    async fn create_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let existing: Option<T> = tx_db
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!(
                "{} with ID {} already exists",
                collection, id
            )));
        }

        client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add insert to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    // ─── Collector Operations ────────────────────────────────────

    pub async fn get_collector(&self, collector_id: &str) -> Result<Option<Collector>, AppError> {
        self.get_doc(collections::COLLECTORS, collector_id).await
    }

    pub async fn list_collectors(&self) -> Result<Vec<Collector>, AppError> {
        self.list_docs(collections::COLLECTORS).await
    }

    /// Create a collector; duplicate IDs are a conflict.
    pub async fn create_collector(&self, collector: &Collector) -> Result<(), AppError> {
        self.create_doc(collections::COLLECTORS, &collector.id, collector)
            .await?;
        tracing::info!(collector_id = %collector.id, "Collector created");
        Ok(())
    }

    // ─── Truck Operations ────────────────────────────────────────

    pub async fn get_truck(&self, truck_id: &str) -> Result<Option<Truck>, AppError> {
        self.get_doc(collections::TRUCKS, truck_id).await
    }

    pub async fn list_trucks(&self) -> Result<Vec<Truck>, AppError> {
        self.list_docs(collections::TRUCKS).await
    }

    /// Create a truck; duplicate IDs are a conflict.
    pub async fn create_truck(&self, truck: &Truck) -> Result<(), AppError> {
        self.create_doc(collections::TRUCKS, &truck.id, truck).await?;
        tracing::info!(truck_id = %truck.id, "Truck created");
        Ok(())
    }

    /// Read-modify-write a truck inside a transaction.
    pub async fn modify_truck_atomic<F>(&self, truck_id: &str, modify: F) -> Result<Truck, AppError>
    where
        F: FnOnce(&mut Truck),
    {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let truck: Option<Truck> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::TRUCKS)
            .obj()
            .one(truck_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(mut truck) = truck else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Truck {} not found", truck_id)));
        };

        modify(&mut truck);

        client
            .fluent()
            .update()
            .in_col(collections::TRUCKS)
            .document_id(truck_id)
            .object(&truck)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add truck to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(truck)
    }

    // ─── Schedule Operations ─────────────────────────────────────

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>, AppError> {
        self.list_docs(collections::SCHEDULES).await
    }

    /// Schedules whose `groupName` is the given truck ID.
    pub async fn get_schedules_by_group(&self, truck_id: &str) -> Result<Vec<Schedule>, AppError> {
        self.query_eq(collections::SCHEDULES, "groupName", truck_id)
            .await
    }

    /// Schedules explicitly linked to a collector.
    pub async fn get_schedules_by_collector(
        &self,
        collector_id: &str,
    ) -> Result<Vec<Schedule>, AppError> {
        self.query_eq(collections::SCHEDULES, "collectorId", collector_id)
            .await
    }

    pub async fn upsert_schedule(&self, schedule: &Schedule) -> Result<(), AppError> {
        self.set_doc(collections::SCHEDULES, &schedule.id, schedule)
            .await
    }

    // ─── Report Operations ───────────────────────────────────────

    pub async fn get_report(&self, report_id: &str) -> Result<Option<Report>, AppError> {
        self.get_doc(collections::REPORTS, report_id).await
    }

    /// Insert a new report; an existing ID is a conflict.
    pub async fn insert_report(&self, report: &Report) -> Result<(), AppError> {
        self.create_doc(collections::REPORTS, &report.id, report)
            .await
    }

    pub async fn set_report(&self, report: &Report) -> Result<(), AppError> {
        self.set_doc(collections::REPORTS, &report.id, report).await
    }

    pub async fn list_reports(&self) -> Result<Vec<Report>, AppError> {
        self.list_docs(collections::REPORTS).await
    }

    pub async fn list_reports_for_user(&self, user_id: &str) -> Result<Vec<Report>, AppError> {
        self.query_eq(collections::REPORTS, "userId", user_id).await
    }

    pub async fn get_collector_report(
        &self,
        report_id: &str,
    ) -> Result<Option<CollectorReport>, AppError> {
        self.get_doc(collections::COLLECTOR_REPORTS, report_id).await
    }

    pub async fn insert_collector_report(
        &self,
        report: &CollectorReport,
    ) -> Result<(), AppError> {
        self.create_doc(collections::COLLECTOR_REPORTS, &report.id, report)
            .await
    }

    pub async fn set_collector_report(&self, report: &CollectorReport) -> Result<(), AppError> {
        self.set_doc(collections::COLLECTOR_REPORTS, &report.id, report)
            .await
    }

    pub async fn list_collector_reports(&self) -> Result<Vec<CollectorReport>, AppError> {
        self.list_docs(collections::COLLECTOR_REPORTS).await
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, AppError> {
        self.list_docs(collections::NOTIFICATIONS).await
    }

    // ─── Atomic Fleet Operations ─────────────────────────────────

    /// Assign (or clear, with `None`) a collector's truck.
    ///
    /// A truck may be held by at most one collector. If another collector
    /// holds it, the call fails with `Conflict` unless `force` is set, in
    /// which case the other assignment is cleared in the same transaction.
    pub async fn assign_truck_atomic(
        &self,
        collector_id: &str,
        truck_id: Option<&str>,
        force: bool,
    ) -> Result<AssignmentOutcome, AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let collector: Option<Collector> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::COLLECTORS)
            .obj()
            .one(collector_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut collector) = collector else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Collector {} not found",
                collector_id
            )));
        };

        let previous_truck_id = collector.assigned_truck().map(String::from);
        let mut released = Vec::new();

        if let Some(truck_id) = truck_id {
            let truck: Option<Truck> = tx_db
                .fluent()
                .select()
                .by_id_in(collections::TRUCKS)
                .obj()
                .one(truck_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            if truck.is_none() {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Truck {} not found", truck_id)));
            }

            let holders: Vec<Collector> = tx_db
                .fluent()
                .select()
                .from(collections::COLLECTORS)
                .filter(|q| q.for_all([q.field("assignedTruckId").eq(truck_id)]))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let others: Vec<Collector> = holders
                .into_iter()
                .filter(|c| c.id != collector.id)
                .collect();

            if !others.is_empty() && !force {
                let _ = transaction.rollback().await;
                let names: Vec<String> = others.iter().map(|c| c.full_name()).collect();
                return Err(AppError::Conflict(format!(
                    "Truck {} is already assigned to {}",
                    truck_id,
                    names.join(", ")
                )));
            }

            for mut other in others {
                other.assigned_truck_id = None;
                client
                    .fluent()
                    .update()
                    .in_col(collections::COLLECTORS)
                    .document_id(&other.id)
                    .object(&other)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add released collector to transaction: {}",
                            e
                        ))
                    })?;
                released.push(other.id);
            }
        }

        collector.assigned_truck_id = truck_id.map(String::from);
        client
            .fluent()
            .update()
            .in_col(collections::COLLECTORS)
            .document_id(collector_id)
            .object(&collector)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add collector to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            collector_id,
            truck_id = ?truck_id,
            previous = ?previous_truck_id,
            released = ?released,
            "Truck assignment updated"
        );

        Ok(AssignmentOutcome {
            collector_id: collector_id.to_string(),
            truck_id: truck_id.map(String::from),
            previous_truck_id,
            released_collector_ids: released,
        })
    }

    /// Write a device location to the collector and mirror it to their truck.
    ///
    /// Returns the truck ID that was updated, if any.
    pub async fn push_location_atomic(
        &self,
        collector_id: &str,
        location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let collector: Option<Collector> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::COLLECTORS)
            .obj()
            .one(collector_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut collector) = collector else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Collector {} not found",
                collector_id
            )));
        };

        collector.location = Some(location);
        collector.last_active = Some(now);
        collector.status = CollectorStatus::Online;

        let mut mirrored = None;
        if let Some(truck_id) = collector.assigned_truck() {
            let truck: Option<Truck> = tx_db
                .fluent()
                .select()
                .by_id_in(collections::TRUCKS)
                .obj()
                .one(truck_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            match truck {
                Some(mut truck) => {
                    truck.location = Some(location);
                    client
                        .fluent()
                        .update()
                        .in_col(collections::TRUCKS)
                        .document_id(truck_id)
                        .object(&truck)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add truck to transaction: {}",
                                e
                            ))
                        })?;
                    mirrored = Some(truck_id.to_string());
                }
                None => {
                    tracing::warn!(collector_id, truck_id, "Assigned truck not found");
                }
            }
        }

        client
            .fluent()
            .update()
            .in_col(collections::COLLECTORS)
            .document_id(collector_id)
            .object(&collector)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add collector to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(mirrored)
    }

    /// Start (`online = true`) or end a collector's shift.
    ///
    /// The truck follows as `active`/`logged_out` unless it is in
    /// maintenance or waiting to dump.
    pub async fn set_shift_atomic(
        &self,
        collector_id: &str,
        online: bool,
        now: DateTime<Utc>,
    ) -> Result<ShiftOutcome, AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let collector: Option<Collector> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::COLLECTORS)
            .obj()
            .one(collector_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut collector) = collector else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Collector {} not found",
                collector_id
            )));
        };

        collector.status = if online {
            CollectorStatus::Online
        } else {
            CollectorStatus::Offline
        };
        collector.last_active = Some(now);

        let truck_id = collector.assigned_truck().map(String::from);
        let mut truck_status = None;
        if let Some(truck_id) = truck_id.as_deref() {
            let truck: Option<Truck> = tx_db
                .fluent()
                .select()
                .by_id_in(collections::TRUCKS)
                .obj()
                .one(truck_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if let Some(mut truck) = truck {
                if !truck.status.is_held() {
                    truck.status = if online {
                        TruckStatus::Active
                    } else {
                        TruckStatus::LoggedOut
                    };
                    client
                        .fluent()
                        .update()
                        .in_col(collections::TRUCKS)
                        .document_id(truck_id)
                        .object(&truck)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add truck to transaction: {}",
                                e
                            ))
                        })?;
                }
                truck_status = Some(truck.status);
            }
        }

        client
            .fluent()
            .update()
            .in_col(collections::COLLECTORS)
            .document_id(collector_id)
            .object(&collector)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add collector to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(collector_id, online, truck_id = ?truck_id, "Shift status updated");

        Ok(ShiftOutcome {
            collector_id: collector_id.to_string(),
            status: collector.status,
            truck_id,
            truck_status,
        })
    }

    /// Count a pickup against the collector's truck and store the record.
    ///
    /// Rejects a second pickup for the same zone on the same local date.
    /// When the pickup fills the truck, a `truck_full` notification is
    /// written in the same transaction.
    pub async fn record_pickup_atomic(
        &self,
        mut record: CollectionRecord,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<PickupOutcome, AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let tx_db = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let collector: Option<Collector> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::COLLECTORS)
            .obj()
            .one(&record.collector_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(collector) = collector else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Collector {} not found",
                record.collector_id
            )));
        };
        let Some(truck_id) = collector.assigned_truck().map(String::from) else {
            let _ = transaction.rollback().await;
            return Err(AppError::BadRequest(format!(
                "Collector {} has no assigned truck",
                collector.id
            )));
        };

        let truck: Option<Truck> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::TRUCKS)
            .obj()
            .one(&truck_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut truck) = truck else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Truck {} not found", truck_id)));
        };

        let load = match truck.record_collection(&record.zone, date, record.weight_kg) {
            Ok(load) => load,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e.into());
            }
        };

        record.truck_id = Some(truck_id.clone());
        record.id = pickup_document_id(&truck_id, date, &record.zone);

        client
            .fluent()
            .update()
            .in_col(collections::TRUCKS)
            .document_id(&truck_id)
            .object(&truck)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add truck to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::COLLECTIONS)
            .document_id(&record.id)
            .object(&record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add collection to transaction: {}", e))
            })?;

        if load.became_full {
            let notification = Notification {
                id: format!("truck_full_{}_{}", truck_id, now.timestamp_millis()),
                kind: "truck_full".to_string(),
                truck_id: Some(truck_id.clone()),
                message: format!(
                    "Truck {} reached capacity ({:.0} kg) and needs dumping",
                    truck_id, truck.current_load_kg
                ),
                created_at: now,
                read: false,
            };
            client
                .fluent()
                .update()
                .in_col(collections::NOTIFICATIONS)
                .document_id(&notification.id)
                .object(&notification)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add notification to transaction: {}",
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            collector_id = %record.collector_id,
            truck_id = %truck_id,
            zone = %record.zone,
            %date,
            load_pct = load.load_percentage,
            became_full = load.became_full,
            "Pickup recorded atomically"
        );

        Ok(PickupOutcome {
            record,
            load,
            truck_status: truck.status,
        })
    }
}

/// One pickup document per truck, date and zone.
pub fn pickup_document_id(truck_id: &str, date: NaiveDate, zone: &str) -> String {
    let zone = zone.trim().to_lowercase();
    format!(
        "{}_{}_{}",
        urlencoding::encode(truck_id),
        date.format("%Y-%m-%d"),
        urlencoding::encode(&zone)
    )
}
