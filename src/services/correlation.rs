// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schedule/truck/collector correlation.
//!
//! Schedules carry no reliable link to collectors. Resolution order:
//! 1. explicit `collectorId` on the schedule
//! 2. `groupName` equal to the collector's assigned truck ID
//! 3. legacy name matching against the free-text `driver`/`members` fields
//!
//! Name matching is substring containment on normalised text, so short or
//! common names can match unintended schedules.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Collector, Schedule, Truck};
use crate::services::geocode::{GeocodedPoint, Geocoder};
use crate::time_utils::local_weekday_name;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Shown to collectors when nothing is scheduled for today.
pub const NO_ACTIVE_SCHEDULE: &str = "No active schedule";

/// Lower-case, turn `(`, `)`, `.`, `,` and other punctuation into spaces,
/// and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Which form of the collector's name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    FullName,
    ReverseName,
    FirstName,
    LastName,
}

/// Pre-normalised name forms for one collector.
#[derive(Debug, Clone)]
pub struct NameKeys {
    first: String,
    last: String,
    full: Option<String>,
    reverse: Option<String>,
}

impl NameKeys {
    pub fn for_collector(collector: &Collector) -> Self {
        let first = normalize(&collector.first_name);
        let last = normalize(&collector.last_name);
        let (full, reverse) = if first.is_empty() || last.is_empty() {
            (None, None)
        } else {
            (
                Some(format!("{} {}", first, last)),
                Some(format!("{} {}", last, first)),
            )
        };
        Self {
            first,
            last,
            full,
            reverse,
        }
    }

    /// Test already-normalised `text`, strongest form first.
    fn match_normalized(&self, text: &str) -> Option<NameMatch> {
        if text.is_empty() {
            return None;
        }
        if self.full.as_deref().is_some_and(|k| text.contains(k)) {
            return Some(NameMatch::FullName);
        }
        if self.reverse.as_deref().is_some_and(|k| text.contains(k)) {
            return Some(NameMatch::ReverseName);
        }
        if !self.first.is_empty() && text.contains(&self.first) {
            return Some(NameMatch::FirstName);
        }
        if !self.last.is_empty() && text.contains(&self.last) {
            return Some(NameMatch::LastName);
        }
        None
    }

    pub fn match_text(&self, text: &str) -> Option<NameMatch> {
        self.match_normalized(&normalize(text))
    }
}

/// Does free text (a driver or member entry) name this collector?
pub fn match_collector_name(collector: &Collector, text: &str) -> Option<NameMatch> {
    NameKeys::for_collector(collector).match_text(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    Driver,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleMatch {
    pub field: MatchedField,
    pub tier: NameMatch,
}

fn match_schedule_with(keys: &NameKeys, schedule: &Schedule) -> Option<ScheduleMatch> {
    if let Some(tier) = keys.match_text(&schedule.driver) {
        return Some(ScheduleMatch {
            field: MatchedField::Driver,
            tier,
        });
    }
    schedule
        .members
        .iter()
        .find_map(|m| keys.match_text(m))
        .map(|tier| ScheduleMatch {
            field: MatchedField::Member,
            tier,
        })
}

/// Name-match a schedule's driver, then its members.
pub fn schedule_matches_collector(
    schedule: &Schedule,
    collector: &Collector,
) -> Option<ScheduleMatch> {
    match_schedule_with(&NameKeys::for_collector(collector), schedule)
}

/// How a collector's schedules were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    CollectorId,
    TruckGroup,
    NameMatch,
    None,
}

/// Schedules that apply to one collector, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub source: ResolutionSource,
    pub schedules: Vec<Schedule>,
}

impl Resolution {
    fn empty() -> Self {
        Self {
            source: ResolutionSource::None,
            schedules: vec![],
        }
    }

    /// First match; what the collector app shows by default.
    pub fn primary(&self) -> Option<&Schedule> {
        self.schedules.first()
    }
}

fn by_collector_id(collector: &Collector, schedules: &[Schedule]) -> Vec<Schedule> {
    schedules
        .iter()
        .filter(|s| s.collector_id.as_deref() == Some(collector.id.as_str()))
        .cloned()
        .collect()
}

fn by_truck_group(truck_id: &str, schedules: &[Schedule]) -> Vec<Schedule> {
    schedules
        .iter()
        .filter(|s| s.group_name.trim() == truck_id)
        .cloned()
        .collect()
}

/// Legacy fallback: every schedule whose driver or members name the collector.
pub fn resolve_by_name(collector: &Collector, schedules: &[Schedule]) -> Resolution {
    let keys = NameKeys::for_collector(collector);
    let matched: Vec<Schedule> = schedules
        .iter()
        .filter(|s| match_schedule_with(&keys, s).is_some())
        .cloned()
        .collect();
    if matched.is_empty() {
        Resolution::empty()
    } else {
        Resolution {
            source: ResolutionSource::NameMatch,
            schedules: matched,
        }
    }
}

/// Resolve the schedules for a collector from an in-memory list.
pub fn resolve_schedules(collector: &Collector, schedules: &[Schedule]) -> Resolution {
    let explicit = by_collector_id(collector, schedules);
    if !explicit.is_empty() {
        return Resolution {
            source: ResolutionSource::CollectorId,
            schedules: explicit,
        };
    }

    if let Some(truck_id) = collector.assigned_truck() {
        let grouped = by_truck_group(truck_id, schedules);
        if !grouped.is_empty() {
            return Resolution {
                source: ResolutionSource::TruckGroup,
                schedules: grouped,
            };
        }
    }

    resolve_by_name(collector, schedules)
}

/// First schedule whose `day` is `weekday_name`, case-insensitively.
pub fn todays_schedule<'a>(schedules: &'a [Schedule], weekday_name: &str) -> Option<&'a Schedule> {
    schedules.iter().find(|s| s.is_on(weekday_name))
}

/// Collectors whose `assignedTruckId` is `truck_id`.
pub fn collectors_for_truck<'a>(truck_id: &str, collectors: &'a [Collector]) -> Vec<&'a Collector> {
    let truck_id = truck_id.trim();
    collectors
        .iter()
        .filter(|c| c.assigned_truck() == Some(truck_id))
        .collect()
}

/// Collectors working a schedule: the truck's crew if any, else by
/// explicit ID or by name.
pub fn collectors_for_schedule<'a>(
    schedule: &Schedule,
    collectors: &'a [Collector],
) -> Vec<&'a Collector> {
    let group = schedule.group_name.trim();
    if !group.is_empty() {
        let crew = collectors_for_truck(group, collectors);
        if !crew.is_empty() {
            return crew;
        }
    }

    collectors
        .iter()
        .filter(|c| {
            schedule.collector_id.as_deref() == Some(c.id.as_str())
                || schedule_matches_collector(schedule, c).is_some()
        })
        .collect()
}

/// The truck a schedule's `groupName` refers to.
pub fn truck_for_schedule<'a>(schedule: &Schedule, trucks: &'a [Truck]) -> Option<&'a Truck> {
    let group = schedule.group_name.trim();
    if group.is_empty() {
        return None;
    }
    trucks.iter().find(|t| t.id == group)
}

/// Everything the collector app needs about "my schedules".
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOverview {
    pub source: ResolutionSource,
    pub schedules: Vec<Schedule>,
    pub primary: Option<Schedule>,
    pub weekday: String,
    pub today: Option<Schedule>,
    /// Map point for today's location
    pub today_point: Option<GeocodedPoint>,
    /// Set when there is nothing to do today
    pub message: Option<String>,
}

/// Firestore-backed correlation for a signed-in collector.
#[derive(Clone)]
pub struct CorrelationService {
    db: FirestoreDb,
    geocoder: Geocoder,
    utc_offset: FixedOffset,
}

impl CorrelationService {
    pub fn new(db: FirestoreDb, geocoder: Geocoder, utc_offset: FixedOffset) -> Self {
        Self {
            db,
            geocoder,
            utc_offset,
        }
    }

    /// Resolve schedules with targeted queries before scanning everything.
    pub async fn schedules_for_collector(&self, collector: &Collector) -> Result<Resolution> {
        let explicit = self.db.get_schedules_by_collector(&collector.id).await?;
        if !explicit.is_empty() {
            return Ok(Resolution {
                source: ResolutionSource::CollectorId,
                schedules: explicit,
            });
        }

        if let Some(truck_id) = collector.assigned_truck() {
            let grouped = self.db.get_schedules_by_group(truck_id).await?;
            if !grouped.is_empty() {
                tracing::debug!(
                    collector_id = %collector.id,
                    truck_id,
                    count = grouped.len(),
                    "Schedules resolved by truck group"
                );
                return Ok(Resolution {
                    source: ResolutionSource::TruckGroup,
                    schedules: grouped,
                });
            }
        }

        let all = self.db.list_schedules().await?;
        let resolution = resolve_by_name(collector, &all);
        tracing::debug!(
            collector_id = %collector.id,
            scanned = all.len(),
            matched = resolution.schedules.len(),
            "Schedules resolved by name"
        );
        Ok(resolution)
    }

    /// Schedules plus today's selection and its map point.
    pub async fn overview(&self, collector_id: &str, now: DateTime<Utc>) -> Result<ScheduleOverview> {
        let collector = self
            .db
            .get_collector(collector_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Collector {} not found", collector_id)))?;

        let resolution = self.schedules_for_collector(&collector).await?;
        let weekday = local_weekday_name(now, self.utc_offset);
        let today = todays_schedule(&resolution.schedules, weekday).cloned();

        let today_point = match &today {
            Some(s) => Some(self.geocoder.geocode(&s.location).await),
            None => None,
        };

        Ok(ScheduleOverview {
            source: resolution.source,
            primary: resolution.primary().cloned(),
            message: today.is_none().then(|| NO_ACTIVE_SCHEDULE.to_string()),
            schedules: resolution.schedules,
            weekday: weekday.to_string(),
            today,
            today_point,
        })
    }
}
