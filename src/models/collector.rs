// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Collector (field worker) model.

use crate::models::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Whether a collector currently has an active mobile session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum CollectorStatus {
    Online,
    #[default]
    Offline,
}

/// Collector document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    /// Login ID. Read from the document key; a body `id` is ignored.
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Truck document ID this collector drives
    #[serde(default)]
    pub assigned_truck_id: Option<String>,
    #[serde(default)]
    pub status: CollectorStatus,
    /// Last reported device location
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Collector {
    /// "First Last" as entered by the admin.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// The assigned truck ID, treating blank strings as unassigned.
    pub fn assigned_truck(&self) -> Option<&str> {
        self.assigned_truck_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn is_online(&self) -> bool {
        self.status == CollectorStatus::Online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(truck: Option<&str>) -> Collector {
        Collector {
            id: "c-1".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Dela Cruz".to_string(),
            assigned_truck_id: truck.map(String::from),
            status: CollectorStatus::Offline,
            location: None,
            last_active: None,
            contact_number: None,
            created_at: None,
        }
    }

    #[test]
    fn test_blank_truck_is_unassigned() {
        assert_eq!(collector(Some("  ")).assigned_truck(), None);
        assert_eq!(collector(None).assigned_truck(), None);
        assert_eq!(collector(Some("T-01")).assigned_truck(), Some("T-01"));
    }

    #[test]
    fn test_deserializes_client_document() {
        let doc = serde_json::json!({
            "_firestore_id": "juan01",
            "firstName": "Juan",
            "lastName": "Dela Cruz",
            "assignedTruckId": "T-01",
            "status": "online",
            "location": {"latitude": 10.7, "longitude": 122.9}
        });
        let c: Collector = serde_json::from_value(doc).unwrap();
        assert_eq!(c.full_name(), "Juan Dela Cruz");
        assert!(c.is_online());
        assert_eq!(c.id, "juan01");
        assert_eq!(c.location, Some(GeoPoint::new(10.7, 122.9)));
    }

    #[test]
    fn test_partial_document_takes_key_as_id() {
        let doc = serde_json::json!({
            "_firestore_id": "maria02",
            "id": "stale-copy",
            "firstName": "Maria"
        });
        let c: Collector = serde_json::from_value(doc).unwrap();
        assert_eq!(c.id, "maria02");
        assert_eq!(c.last_name, "");
        assert_eq!(c.full_name(), "Maria");
    }
}
