// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fleet truck model and its derived indicators.

use crate::models::GeoPoint;
use crate::time_utils::add_calendar_months;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Months between oil changes.
pub const OIL_CHANGE_INTERVAL_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum TruckStatus {
    #[default]
    Active,
    Maintenance,
    ToDump,
    LoggedOut,
    Inactive,
}

impl TruckStatus {
    /// Statuses that shift start/end must not overwrite.
    pub fn is_held(self) -> bool {
        matches!(self, TruckStatus::Maintenance | TruckStatus::ToDump)
    }
}

/// One pickup counted against the truck's load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollectionEntry {
    pub zone: String,
    #[serde(rename = "dateYMD")]
    pub date: NaiveDate,
    pub kg: f64,
}

/// Truck document stored in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    #[serde(default)]
    pub plate_number: String,
    #[serde(default)]
    pub capacity_kg: f64,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub status: TruckStatus,
    #[serde(default)]
    pub current_load_kg: f64,
    #[serde(default)]
    pub needs_dumping: bool,
    #[serde(default)]
    pub collection_history: Vec<CollectionEntry>,
    #[serde(default)]
    pub last_oil_change: Option<NaiveDate>,
    #[serde(default)]
    pub next_oil_change: Option<NaiveDate>,
    /// Mirrored from the assigned collector's device
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl Truck {
    /// Load as a whole percentage of capacity, clamped to 0..=100.
    ///
    /// A truck without a positive capacity reports 0.
    pub fn load_percentage(&self) -> u8 {
        if self.capacity_kg.is_nan() || self.capacity_kg <= 0.0 || !self.current_load_kg.is_finite() {
            return 0;
        }
        let pct = (self.current_load_kg / self.capacity_kg * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// A truck with no capacity on file is full as soon as it carries anything.
    pub fn is_at_capacity(&self) -> bool {
        self.current_load_kg >= self.capacity_kg
    }

    /// Stored next oil change, or one derived from the last change.
    pub fn next_oil_change_date(&self) -> Option<NaiveDate> {
        self.next_oil_change
            .or_else(|| self.last_oil_change.and_then(next_oil_change))
    }

    pub fn oil_change_due(&self, today: NaiveDate) -> bool {
        self.next_oil_change_date().is_some_and(|next| today >= next)
    }

    /// Whether a pickup for `zone` on `date` is already counted.
    pub fn has_collection_on(&self, zone: &str, date: NaiveDate) -> bool {
        let zone = zone.trim().to_lowercase();
        self.collection_history
            .iter()
            .any(|e| e.date == date && e.zone.trim().to_lowercase() == zone)
    }
}

/// Rejections when counting a pickup against a truck.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FleetError {
    #[error("Collection for {zone} on {date} is already recorded")]
    AlreadyRecorded { zone: String, date: NaiveDate },

    #[error("Invalid collection weight: {0}")]
    InvalidWeight(f64),

    #[error("Zone is required")]
    MissingZone,
}

/// Load state after a pickup was counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LoadUpdate {
    pub current_load_kg: f64,
    pub load_percentage: u8,
    /// True only on the pickup that reached capacity
    pub became_full: bool,
}

impl Truck {
    /// Count a pickup: at most one entry per zone per local date.
    ///
    /// Reaching capacity sets `needs_dumping` and forces `to_dump`.
    pub fn record_collection(
        &mut self,
        zone: &str,
        date: NaiveDate,
        kg: f64,
    ) -> Result<LoadUpdate, FleetError> {
        let zone = zone.trim();
        if zone.is_empty() {
            return Err(FleetError::MissingZone);
        }
        if !kg.is_finite() || kg <= 0.0 {
            return Err(FleetError::InvalidWeight(kg));
        }
        if self.has_collection_on(zone, date) {
            return Err(FleetError::AlreadyRecorded {
                zone: zone.to_string(),
                date,
            });
        }

        let was_full = self.needs_dumping;
        self.collection_history.push(CollectionEntry {
            zone: zone.to_string(),
            date,
            kg,
        });
        self.current_load_kg += kg;

        if self.is_at_capacity() {
            self.needs_dumping = true;
            self.status = TruckStatus::ToDump;
        }

        Ok(LoadUpdate {
            current_load_kg: self.current_load_kg,
            load_percentage: self.load_percentage(),
            became_full: self.needs_dumping && !was_full,
        })
    }

    /// Empty the truck at the dump site. History is kept for dedup.
    pub fn dump(&mut self) {
        self.current_load_kg = 0.0;
        self.needs_dumping = false;
        if self.status == TruckStatus::ToDump {
            self.status = TruckStatus::Active;
        }
    }

    pub fn record_oil_change(&mut self, date: NaiveDate) {
        self.last_oil_change = Some(date);
        self.next_oil_change = next_oil_change(date);
    }
}

/// Date of the next oil change: three calendar months after `last`.
pub fn next_oil_change(last: NaiveDate) -> Option<NaiveDate> {
    add_calendar_months(last, OIL_CHANGE_INTERVAL_MONTHS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truck(capacity: f64, load: f64) -> Truck {
        Truck {
            id: "T-01".to_string(),
            plate_number: "ABC 123".to_string(),
            capacity_kg: capacity,
            fuel_type: "diesel".to_string(),
            status: TruckStatus::Active,
            current_load_kg: load,
            needs_dumping: false,
            collection_history: vec![],
            last_oil_change: None,
            next_oil_change: None,
            location: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_capacity_is_zero_percent() {
        assert_eq!(truck(0.0, 500.0).load_percentage(), 0);
    }

    #[test]
    fn test_full_truck_is_hundred_percent() {
        assert_eq!(truck(3000.0, 3000.0).load_percentage(), 100);
        assert_eq!(truck(3000.0, 4500.0).load_percentage(), 100);
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(truck(3000.0, 1000.0).load_percentage(), 33);
        assert_eq!(truck(3000.0, 2000.0).load_percentage(), 67);
        assert_eq!(truck(3000.0, -10.0).load_percentage(), 0);
    }

    #[test]
    fn test_oil_change_uses_calendar_months() {
        assert_eq!(next_oil_change(date(2024, 1, 15)), Some(date(2024, 4, 15)));
        // 90 days after Jan 15 would be Apr 14 in a leap year.
        assert_ne!(
            next_oil_change(date(2024, 1, 15)),
            date(2024, 1, 15).checked_add_days(chrono::Days::new(90))
        );
        assert_eq!(next_oil_change(date(2024, 11, 30)), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_oil_change_due_on_boundary() {
        let mut t = truck(3000.0, 0.0);
        t.last_oil_change = Some(date(2024, 1, 15));
        assert!(!t.oil_change_due(date(2024, 4, 14)));
        assert!(t.oil_change_due(date(2024, 4, 15)));
        assert!(t.oil_change_due(date(2024, 6, 1)));
    }

    #[test]
    fn test_stored_next_oil_change_wins() {
        let mut t = truck(3000.0, 0.0);
        t.last_oil_change = Some(date(2024, 1, 15));
        t.next_oil_change = Some(date(2024, 3, 1));
        assert!(t.oil_change_due(date(2024, 3, 1)));
    }

    #[test]
    fn test_reaching_capacity_flips_to_dump() {
        let mut t = truck(3000.0, 2900.0);
        let update = t
            .record_collection("Zone 3A", date(2024, 5, 1), 100.0)
            .unwrap();
        assert_eq!(update.load_percentage, 100);
        assert!(update.became_full);
        assert!(t.needs_dumping);
        assert_eq!(t.status, TruckStatus::ToDump);

        let again = t
            .record_collection("Zone 4", date(2024, 5, 1), 50.0)
            .unwrap();
        assert!(!again.became_full);
    }

    #[test]
    fn test_below_capacity_stays_active() {
        let mut t = truck(3000.0, 0.0);
        let update = t
            .record_collection("Zone 1", date(2024, 5, 1), 1500.0)
            .unwrap();
        assert_eq!(update.load_percentage, 50);
        assert!(!t.needs_dumping);
        assert_eq!(t.status, TruckStatus::Active);
    }

    #[test]
    fn test_same_zone_same_day_rejected() {
        let mut t = truck(3000.0, 0.0);
        t.record_collection("Zone 3A", date(2024, 5, 1), 100.0)
            .unwrap();
        let err = t
            .record_collection(" zone 3a ", date(2024, 5, 1), 80.0)
            .unwrap_err();
        assert!(matches!(err, FleetError::AlreadyRecorded { .. }));
        assert!(err.to_string().contains("already recorded"));
        assert_eq!(t.collection_history.len(), 1);
        assert_eq!(t.current_load_kg, 100.0);

        // Next day is fine.
        assert!(t
            .record_collection("Zone 3A", date(2024, 5, 2), 80.0)
            .is_ok());
    }

    #[test]
    fn test_zone_dedup_folds_non_ascii_case() {
        let mut t = truck(3000.0, 0.0);
        t.record_collection("Zone Ñ", date(2024, 5, 1), 100.0)
            .unwrap();
        let err = t
            .record_collection("zone ñ", date(2024, 5, 1), 80.0)
            .unwrap_err();
        assert!(matches!(err, FleetError::AlreadyRecorded { .. }));
        assert_eq!(t.current_load_kg, 100.0);
    }

    #[test]
    fn test_zero_capacity_truck_needs_dumping() {
        let mut t = truck(0.0, 0.0);
        let update = t
            .record_collection("Zone 1", date(2024, 5, 1), 10.0)
            .unwrap();
        assert!(update.became_full);
        assert!(t.needs_dumping);
        assert_eq!(t.status, TruckStatus::ToDump);
        assert_eq!(update.load_percentage, 0);
    }

    #[test]
    fn test_invalid_pickups_rejected() {
        let mut t = truck(3000.0, 0.0);
        assert_eq!(
            t.record_collection("", date(2024, 5, 1), 10.0),
            Err(FleetError::MissingZone)
        );
        assert!(matches!(
            t.record_collection("Zone 1", date(2024, 5, 1), 0.0),
            Err(FleetError::InvalidWeight(_))
        ));
        assert!(t.collection_history.is_empty());
    }

    #[test]
    fn test_dump_resets_load() {
        let mut t = truck(100.0, 0.0);
        t.record_collection("Zone 1", date(2024, 5, 1), 150.0)
            .unwrap();
        t.dump();
        assert_eq!(t.current_load_kg, 0.0);
        assert!(!t.needs_dumping);
        assert_eq!(t.status, TruckStatus::Active);
        assert_eq!(t.collection_history.len(), 1);
    }

    #[test]
    fn test_record_oil_change_sets_next() {
        let mut t = truck(100.0, 0.0);
        t.record_oil_change(date(2024, 1, 15));
        assert_eq!(t.next_oil_change, Some(date(2024, 4, 15)));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TruckStatus::ToDump).unwrap();
        assert_eq!(json, "\"to_dump\"");
        let s: TruckStatus = serde_json::from_str("\"logged_out\"").unwrap();
        assert_eq!(s, TruckStatus::LoggedOut);
    }

    #[test]
    fn test_history_entry_wire_format() {
        let entry = CollectionEntry {
            zone: "Zone 3A".to_string(),
            date: date(2024, 5, 1),
            kg: 120.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["dateYMD"], "2024-05-01");
    }
}
