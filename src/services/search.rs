// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard search across trucks, schedules and collectors.
//!
//! Tiers run in order and their results accumulate:
//! 1. truck ID
//! 2. schedule driver
//! 3. schedule zone / location / group name
//! 4. collector name
//!
//! Only when all four find nothing is the query split into words and each
//! word longer than two characters tried against zone / location / group.

use crate::models::{Collector, GeoPoint, Schedule, Truck};
use crate::services::correlation::{
    collectors_for_schedule, collectors_for_truck, normalize, resolve_schedules,
    truck_for_schedule,
};
use crate::services::dashboard::FleetSnapshot;
use serde::Serialize;
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    TruckId,
    Driver,
    Area,
    Collector,
    PartialWord,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub schedule: Option<Schedule>,
    pub assigned_collectors: Vec<Collector>,
    pub truck: Option<Truck>,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Where the map should recentre: the first matched truck with a location
    pub focus: Option<GeoPoint>,
}

/// Accumulates results, dropping repeats of `(schedule, first collector)`.
struct Collected<'a> {
    snapshot: &'a FleetSnapshot,
    seen: HashSet<(String, String)>,
    results: Vec<SearchResult>,
}

impl<'a> Collected<'a> {
    fn new(snapshot: &'a FleetSnapshot) -> Self {
        Self {
            snapshot,
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn push(&mut self, result: SearchResult) {
        let schedule_key = match (&result.schedule, &result.truck) {
            (Some(s), _) => s.id.clone(),
            (None, Some(t)) => format!("truck:{}", t.id),
            (None, None) => String::new(),
        };
        let collector_key = result
            .assigned_collectors
            .first()
            .map(|c| c.id.clone())
            .unwrap_or_default();
        if self.seen.insert((schedule_key, collector_key)) {
            self.results.push(result);
        }
    }

    fn push_schedule(&mut self, schedule: &Schedule, match_type: MatchType) {
        let collectors = collectors_for_schedule(schedule, &self.snapshot.collectors)
            .into_iter()
            .cloned()
            .collect();
        let truck = truck_for_schedule(schedule, &self.snapshot.trucks).cloned();
        self.push(SearchResult {
            schedule: Some(schedule.clone()),
            assigned_collectors: collectors,
            truck,
            match_type,
        });
    }
}

fn area_matches(schedule: &Schedule, needle: &str) -> bool {
    [&schedule.zone, &schedule.location, &schedule.group_name]
        .iter()
        .any(|field| normalize(field).contains(needle))
}

/// Run the tiered dashboard search over an in-memory snapshot.
pub fn search(query: &str, snapshot: &FleetSnapshot) -> SearchOutcome {
    let raw = query.trim();
    let lowered = raw.to_lowercase();
    let normalized = normalize(raw);
    let mut collected = Collected::new(snapshot);

    if !normalized.is_empty() {
        // 1. truck IDs
        for truck in &snapshot.trucks {
            let id = truck.id.to_lowercase();
            if id != lowered && !id.contains(&lowered) {
                continue;
            }
            let grouped: Vec<&Schedule> = snapshot
                .schedules
                .iter()
                .filter(|s| s.group_name.trim() == truck.id)
                .collect();
            if grouped.is_empty() {
                let crew = collectors_for_truck(&truck.id, &snapshot.collectors)
                    .into_iter()
                    .cloned()
                    .collect();
                collected.push(SearchResult {
                    schedule: None,
                    assigned_collectors: crew,
                    truck: Some(truck.clone()),
                    match_type: MatchType::TruckId,
                });
            } else {
                for schedule in grouped {
                    collected.push_schedule(schedule, MatchType::TruckId);
                }
            }
        }

        // 2. driver, either direction
        for schedule in &snapshot.schedules {
            let driver = schedule.driver.trim().to_lowercase();
            if !driver.is_empty() && (driver.contains(&lowered) || lowered.contains(&driver)) {
                collected.push_schedule(schedule, MatchType::Driver);
            }
        }

        // 3. zone / location / group
        for schedule in &snapshot.schedules {
            if area_matches(schedule, &normalized) {
                collected.push_schedule(schedule, MatchType::Area);
            }
        }

        // 4. collector names
        for collector in &snapshot.collectors {
            let first = collector.first_name.to_lowercase();
            let last = collector.last_name.to_lowercase();
            let full = collector.full_name().to_lowercase();
            let hit = [first, last, full]
                .iter()
                .any(|name| !name.trim().is_empty() && name.contains(&lowered));
            if !hit {
                continue;
            }
            let resolution = resolve_schedules(collector, &snapshot.schedules);
            if resolution.schedules.is_empty() {
                let truck = collector
                    .assigned_truck()
                    .and_then(|id| snapshot.trucks.iter().find(|t| t.id == id))
                    .cloned();
                collected.push(SearchResult {
                    schedule: None,
                    assigned_collectors: vec![collector.clone()],
                    truck,
                    match_type: MatchType::Collector,
                });
            } else {
                for schedule in &resolution.schedules {
                    collected.push_schedule(schedule, MatchType::Collector);
                }
            }
        }

        // 5. per-word fallback
        if collected.results.is_empty() {
            let words: Vec<&str> = normalized
                .split_whitespace()
                .filter(|w| w.chars().count() > 2)
                .collect();
            for schedule in &snapshot.schedules {
                if words.iter().any(|w| area_matches(schedule, w)) {
                    collected.push_schedule(schedule, MatchType::PartialWord);
                }
            }
        }
    }

    let results = collected.results;
    let focus = results
        .iter()
        .find_map(|r| r.truck.as_ref().and_then(|t| t.location));

    tracing::debug!(query = raw, results = results.len(), "Dashboard search");

    SearchOutcome {
        query: raw.to_string(),
        results,
        focus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectorStatus, TruckStatus};

    fn collector(id: &str, first: &str, last: &str, truck: Option<&str>) -> Collector {
        Collector {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            assigned_truck_id: truck.map(String::from),
            status: CollectorStatus::Online,
            location: None,
            last_active: None,
            contact_number: None,
            created_at: None,
        }
    }

    fn truck(id: &str, location: Option<GeoPoint>) -> Truck {
        Truck {
            id: id.to_string(),
            plate_number: format!("PLT-{}", id),
            capacity_kg: 3000.0,
            fuel_type: "diesel".to_string(),
            status: TruckStatus::Active,
            current_load_kg: 0.0,
            needs_dumping: false,
            collection_history: vec![],
            last_oil_change: None,
            next_oil_change: None,
            location,
        }
    }

    fn schedule(id: &str, zone: &str, location: &str, group: &str, driver: &str) -> Schedule {
        Schedule {
            id: id.to_string(),
            zone: zone.to_string(),
            location: location.to_string(),
            day: "Monday".to_string(),
            time: "07:00".to_string(),
            group_name: group.to_string(),
            driver: driver.to_string(),
            members: vec![],
            collector_id: None,
        }
    }

    fn snapshot() -> FleetSnapshot {
        FleetSnapshot {
            collectors: vec![
                collector("c1", "Juan", "Dela Cruz", Some("T-01")),
                collector("c2", "Maria", "Santos", None),
            ],
            trucks: vec![
                truck("T-01", Some(GeoPoint::new(10.74, 122.97))),
                truck("T-02", None),
            ],
            schedules: vec![
                schedule("s1", "Zone 3A", "Brgy. Mandalagan (North)", "T-01", "Juan Dela Cruz"),
                schedule("s2", "Zone 5", "Tangub Market", "T-02", "Maria Santos"),
            ],
        }
    }

    #[test]
    fn test_truck_id_match_recentres_map() {
        let outcome = search("t-01", &snapshot());
        assert_eq!(outcome.results[0].match_type, MatchType::TruckId);
        assert_eq!(
            outcome.results[0].schedule.as_ref().map(|s| s.id.as_str()),
            Some("s1")
        );
        assert_eq!(outcome.results[0].assigned_collectors[0].id, "c1");
        assert_eq!(outcome.focus, Some(GeoPoint::new(10.74, 122.97)));
    }

    #[test]
    fn test_results_are_deduplicated_across_tiers() {
        // "juan" hits tier 2 (driver) and tier 4 (collector) for the same schedule.
        let outcome = search("juan", &snapshot());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].match_type, MatchType::Driver);
    }

    #[test]
    fn test_area_match_ignores_punctuation() {
        let outcome = search("brgy mandalagan north", &snapshot());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].match_type, MatchType::Area);
    }

    #[test]
    fn test_reverse_driver_containment() {
        // Query longer than the driver text still matches.
        let outcome = search("driver maria santos please", &snapshot());
        assert!(outcome
            .results
            .iter()
            .any(|r| r.match_type == MatchType::Driver
                && r.schedule.as_ref().map(|s| s.id.as_str()) == Some("s2")));
    }

    #[test]
    fn test_partial_word_fallback() {
        let outcome = search("near tangub somewhere", &snapshot());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].match_type, MatchType::PartialWord);
        assert!(outcome.focus.is_none());
    }

    #[test]
    fn test_short_words_are_ignored_in_fallback() {
        let outcome = search("zz 5a", &snapshot());
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_truck_without_schedule_still_listed() {
        let mut snap = snapshot();
        snap.trucks.push(truck("T-99", None));
        let outcome = search("T-99", &snap);
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].schedule.is_none());
        assert_eq!(
            outcome.results[0].truck.as_ref().map(|t| t.id.as_str()),
            Some("T-99")
        );
    }

    #[test]
    fn test_blank_query_finds_nothing() {
        assert!(search("   ", &snapshot()).results.is_empty());
    }
}
