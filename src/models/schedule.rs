// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recurring collection schedule model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A weekly collection assignment.
///
/// `group_name` conventionally holds the truck document ID. `driver` and
/// `members` are free text; older documents have no `collector_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename(deserialize = "_firestore_id"), default)]
    pub id: String,
    #[serde(default)]
    pub zone: String,
    /// Place name, not coordinates
    #[serde(default)]
    pub location: String,
    /// Weekday name, e.g. "Monday"
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub members: Vec<String>,
    /// Explicit link to the collector, set by the admin form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_id: Option<String>,
}

impl Schedule {
    /// Case-insensitive comparison of `day` against an en-US weekday name.
    pub fn is_on(&self, weekday_name: &str) -> bool {
        self.day.trim().eq_ignore_ascii_case(weekday_name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_document_without_body_id() {
        let doc = serde_json::json!({
            "_firestore_id": "Xk2Qp9",
            "zone": "Zone 3A",
            "day": "Monday",
            "groupName": "T-01"
        });
        let s: Schedule = serde_json::from_value(doc).unwrap();
        assert_eq!(s.id, "Xk2Qp9");
        assert!(s.is_on("monday"));
        assert!(s.members.is_empty());
    }

    #[test]
    fn test_serializes_id_for_clients() {
        let s = Schedule {
            id: "s1".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["id"], "s1");
        assert!(json.get("_firestore_id").is_none());
    }
}
