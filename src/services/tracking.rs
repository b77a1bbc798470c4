// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector sessions: location pushes, shift transitions, truck assignment.

use crate::db::firestore::{AssignmentOutcome, ShiftOutcome};
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::GeoPoint;
use crate::services::live::{FleetEvent, LiveHub};
use chrono::{DateTime, Utc};

/// Writes collector/truck session state and announces it to live subscribers.
#[derive(Clone)]
pub struct TrackingService {
    db: FirestoreDb,
    live: LiveHub,
}

impl TrackingService {
    pub fn new(db: FirestoreDb, live: LiveHub) -> Self {
        Self { db, live }
    }

    /// Store a device location for the collector and their truck.
    pub async fn push_location(
        &self,
        collector_id: &str,
        location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        if !location.is_valid() {
            return Err(AppError::BadRequest(format!(
                "Invalid coordinate ({}, {})",
                location.latitude, location.longitude
            )));
        }

        let truck_id = self
            .db
            .push_location_atomic(collector_id, location, now)
            .await?;

        tracing::debug!(collector_id, truck_id = ?truck_id, "Location pushed");
        self.live.publish(FleetEvent::LocationUpdated {
            collector_id: collector_id.to_string(),
            truck_id: truck_id.clone(),
            location,
            at: now,
        });
        Ok(truck_id)
    }

    pub async fn start_shift(&self, collector_id: &str, now: DateTime<Utc>) -> Result<ShiftOutcome> {
        self.set_shift(collector_id, true, now).await
    }

    pub async fn end_shift(&self, collector_id: &str, now: DateTime<Utc>) -> Result<ShiftOutcome> {
        self.set_shift(collector_id, false, now).await
    }

    async fn set_shift(
        &self,
        collector_id: &str,
        online: bool,
        now: DateTime<Utc>,
    ) -> Result<ShiftOutcome> {
        let outcome = self.db.set_shift_atomic(collector_id, online, now).await?;
        self.live.publish(FleetEvent::ShiftChanged {
            collector_id: outcome.collector_id.clone(),
            online,
            truck_id: outcome.truck_id.clone(),
            truck_status: outcome.truck_status,
        });
        Ok(outcome)
    }

    /// Assign a truck (or clear with `None`), enforcing one collector per truck.
    pub async fn assign_truck(
        &self,
        collector_id: &str,
        truck_id: Option<&str>,
        force: bool,
    ) -> Result<AssignmentOutcome> {
        let truck_id = truck_id.map(str::trim).filter(|t| !t.is_empty());
        let outcome = self
            .db
            .assign_truck_atomic(collector_id, truck_id, force)
            .await?;
        self.live.publish(FleetEvent::AssignmentChanged {
            collector_id: outcome.collector_id.clone(),
            truck_id: outcome.truck_id.clone(),
            released_collector_ids: outcome.released_collector_ids.clone(),
        });
        Ok(outcome)
    }
}
