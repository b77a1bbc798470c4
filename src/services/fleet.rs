// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fleet page indicators and truck load/maintenance operations.

use crate::db::firestore::PickupOutcome;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{CollectionRecord, CollectionStatus, GeoPoint, Truck, TruckStatus};
use crate::services::live::{FleetEvent, LiveHub};
use crate::time_utils::local_date;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub use crate::models::truck::FleetError;

impl From<FleetError> for AppError {
    fn from(err: FleetError) -> Self {
        match err {
            FleetError::AlreadyRecorded { .. } => AppError::Conflict(err.to_string()),
            FleetError::InvalidWeight(_) | FleetError::MissingZone => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

/// One row of the fleet page.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TruckIndicators {
    pub id: String,
    pub plate_number: String,
    pub status: TruckStatus,
    pub capacity_kg: f64,
    pub current_load_kg: f64,
    pub load_percentage: u8,
    pub needs_dumping: bool,
    pub last_oil_change: Option<NaiveDate>,
    pub next_oil_change: Option<NaiveDate>,
    pub oil_change_due: bool,
}

impl TruckIndicators {
    pub fn for_truck(truck: &Truck, today: NaiveDate) -> Self {
        Self {
            id: truck.id.clone(),
            plate_number: truck.plate_number.clone(),
            status: truck.status,
            capacity_kg: truck.capacity_kg,
            current_load_kg: truck.current_load_kg,
            load_percentage: truck.load_percentage(),
            needs_dumping: truck.needs_dumping,
            last_oil_change: truck.last_oil_change,
            next_oil_change: truck.next_oil_change_date(),
            oil_change_due: truck.oil_change_due(today),
        }
    }
}

/// A pickup submitted from the collector app.
#[derive(Debug, Clone)]
pub struct NewPickup {
    pub collector_id: String,
    pub schedule_id: Option<String>,
    pub zone: String,
    pub weight_kg: f64,
    pub location: Option<GeoPoint>,
}

/// Truck load and maintenance operations.
#[derive(Clone)]
pub struct FleetService {
    db: FirestoreDb,
    live: LiveHub,
    utc_offset: FixedOffset,
}

impl FleetService {
    pub fn new(db: FirestoreDb, live: LiveHub, utc_offset: FixedOffset) -> Self {
        Self {
            db,
            live,
            utc_offset,
        }
    }

    /// Indicators for every truck, ordered by ID.
    pub async fn overview(&self, now: DateTime<Utc>) -> Result<Vec<TruckIndicators>> {
        let today = local_date(now, self.utc_offset);
        let mut rows: Vec<TruckIndicators> = self
            .db
            .list_trucks()
            .await?
            .iter()
            .map(|t| TruckIndicators::for_truck(t, today))
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    /// Record a completed pickup for the collector's truck.
    pub async fn record_pickup(&self, pickup: NewPickup, now: DateTime<Utc>) -> Result<PickupOutcome> {
        let date = local_date(now, self.utc_offset);
        let record = CollectionRecord {
            id: String::new(),
            collector_id: pickup.collector_id,
            schedule_id: pickup.schedule_id,
            truck_id: None,
            status: CollectionStatus::Collected,
            weight_kg: pickup.weight_kg,
            started_at: now,
            completed_at: Some(now),
            zone: pickup.zone.trim().to_string(),
            location: pickup.location,
        };

        let outcome = self.db.record_pickup_atomic(record, date, now).await?;

        if let Some(truck_id) = outcome.record.truck_id.clone() {
            self.live.publish(FleetEvent::TruckLoadChanged {
                truck_id,
                load: outcome.load,
                status: outcome.truck_status,
            });
        }
        Ok(outcome)
    }

    /// Empty a truck after a dump run.
    pub async fn dump_truck(&self, truck_id: &str, now: DateTime<Utc>) -> Result<TruckIndicators> {
        let truck = self.db.modify_truck_atomic(truck_id, Truck::dump).await?;
        tracing::info!(truck_id, "Truck dumped");

        self.live.publish(FleetEvent::TruckLoadChanged {
            truck_id: truck.id.clone(),
            load: crate::models::LoadUpdate {
                current_load_kg: truck.current_load_kg,
                load_percentage: truck.load_percentage(),
                became_full: false,
            },
            status: truck.status,
        });
        Ok(TruckIndicators::for_truck(
            &truck,
            local_date(now, self.utc_offset),
        ))
    }

    /// Record an oil change on `date` (today when `None`).
    pub async fn record_oil_change(
        &self,
        truck_id: &str,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<TruckIndicators> {
        let today = local_date(now, self.utc_offset);
        let date = date.unwrap_or(today);
        if date > today {
            return Err(AppError::BadRequest(
                "Oil change date cannot be in the future".to_string(),
            ));
        }

        let truck = self
            .db
            .modify_truck_atomic(truck_id, |t| t.record_oil_change(date))
            .await?;
        tracing::info!(truck_id, %date, next = ?truck.next_oil_change, "Oil change recorded");
        Ok(TruckIndicators::for_truck(&truck, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicators_for_zero_capacity_truck() {
        let truck = Truck {
            id: "T-09".to_string(),
            plate_number: "XYZ 999".to_string(),
            capacity_kg: 0.0,
            fuel_type: "diesel".to_string(),
            status: TruckStatus::Inactive,
            current_load_kg: 120.0,
            needs_dumping: false,
            collection_history: vec![],
            last_oil_change: NaiveDate::from_ymd_opt(2024, 1, 15),
            next_oil_change: None,
            location: None,
        };
        let row = TruckIndicators::for_truck(&truck, NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        assert_eq!(row.load_percentage, 0);
        assert_eq!(row.next_oil_change, NaiveDate::from_ymd_opt(2024, 4, 15));
        assert!(row.oil_change_due);
    }

    #[test]
    fn test_duplicate_pickup_is_conflict() {
        let err: AppError = FleetError::AlreadyRecorded {
            zone: "Zone 3A".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
        .into();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("already recorded")));
    }

    #[tokio::test]
    async fn test_future_oil_change_rejected_before_db() {
        let service = FleetService::new(
            FirestoreDb::new_mock(),
            LiveHub::new(),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        );
        let now = Utc::now();
        let tomorrow = local_date(now, FixedOffset::east_opt(8 * 3600).unwrap())
            .succ_opt()
            .unwrap();
        let err = service
            .record_oil_change("T-01", Some(tomorrow), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
