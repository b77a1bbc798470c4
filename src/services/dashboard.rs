// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin dashboard: fleet snapshot, live map reconciliation, search.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Collector, CollectorStatus, GeoPoint, Schedule, Truck, TruckStatus};
use crate::services::correlation::{collectors_for_truck, resolve_schedules, todays_schedule};
use crate::services::geocode::{GeocodedPoint, Geocoder};
use crate::services::search::{self, SearchOutcome};
use crate::time_utils::local_weekday_name;
use chrono::{DateTime, FixedOffset, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Everything the dashboard correlates, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub collectors: Vec<Collector>,
    pub trucks: Vec<Truck>,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CollectorPin {
    pub id: String,
    pub name: String,
    pub status: CollectorStatus,
    pub location: Option<GeoPoint>,
    pub last_active: Option<DateTime<Utc>>,
}

impl From<&Collector> for CollectorPin {
    fn from(c: &Collector) -> Self {
        Self {
            id: c.id.clone(),
            name: c.full_name(),
            status: c.status,
            location: c.location,
            last_active: c.last_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TruckMarker {
    pub truck_id: String,
    pub plate_number: String,
    pub status: TruckStatus,
    pub location: Option<GeoPoint>,
    pub load_percentage: u8,
    pub needs_dumping: bool,
    pub collectors: Vec<CollectorPin>,
    pub today_schedule: Option<Schedule>,
    pub schedule_point: Option<GeocodedPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    pub weekday: String,
    pub trucks: Vec<TruckMarker>,
    /// Online collectors with no truck assigned
    pub unassigned_online: Vec<CollectorPin>,
}

/// Today's schedule for a truck: its own group first, then its crew's.
fn truck_schedule_today(
    truck: &Truck,
    crew: &[&Collector],
    schedules: &[Schedule],
    weekday: &str,
) -> Option<Schedule> {
    let grouped: Vec<Schedule> = schedules
        .iter()
        .filter(|s| s.group_name.trim() == truck.id)
        .cloned()
        .collect();
    if let Some(s) = todays_schedule(&grouped, weekday) {
        return Some(s.clone());
    }
    crew.iter().find_map(|c| {
        let resolution = resolve_schedules(c, schedules);
        todays_schedule(&resolution.schedules, weekday).cloned()
    })
}

/// Reconcile trucks, collectors and schedules into map markers.
///
/// Schedule points are left empty; [`DashboardService::map`] fills them in.
pub fn build_map(snapshot: &FleetSnapshot, weekday: &str) -> MapSnapshot {
    let mut trucks: Vec<TruckMarker> = snapshot
        .trucks
        .iter()
        .map(|truck| {
            let crew = collectors_for_truck(&truck.id, &snapshot.collectors);
            TruckMarker {
                truck_id: truck.id.clone(),
                plate_number: truck.plate_number.clone(),
                status: truck.status,
                location: truck.location,
                load_percentage: truck.load_percentage(),
                needs_dumping: truck.needs_dumping,
                today_schedule: truck_schedule_today(truck, &crew, &snapshot.schedules, weekday),
                collectors: crew.into_iter().map(CollectorPin::from).collect(),
                schedule_point: None,
            }
        })
        .collect();
    trucks.sort_by(|a, b| a.truck_id.cmp(&b.truck_id));

    // A collector pointing at a truck that no longer exists counts as unassigned.
    let unassigned_online = snapshot
        .collectors
        .iter()
        .filter(|c| c.is_online())
        .filter(|c| match c.assigned_truck() {
            None => true,
            Some(id) => !snapshot.trucks.iter().any(|t| t.id == id),
        })
        .map(CollectorPin::from)
        .collect();

    MapSnapshot {
        weekday: weekday.to_string(),
        trucks,
        unassigned_online,
    }
}

fn point_feature(point: GeoPoint, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            point.longitude,
            point.latitude,
        ]))),
        id: None,
        properties,
        foreign_members: None,
    }
}

/// GeoJSON export of the map: truck markers, schedule points and loose collectors.
pub fn map_to_geojson(map: &MapSnapshot) -> FeatureCollection {
    let mut features = Vec::new();

    for marker in &map.trucks {
        let crew: Vec<&str> = marker.collectors.iter().map(|c| c.name.as_str()).collect();
        if let Some(location) = marker.location {
            features.push(point_feature(
                location,
                json!({
                    "kind": "truck",
                    "truckId": marker.truck_id,
                    "plateNumber": marker.plate_number,
                    "status": marker.status,
                    "loadPercentage": marker.load_percentage,
                    "needsDumping": marker.needs_dumping,
                    "collectors": crew,
                }),
            ));
        }
        if let (Some(schedule), Some(point)) = (&marker.today_schedule, marker.schedule_point) {
            features.push(point_feature(
                point.point,
                json!({
                    "kind": "schedule",
                    "truckId": marker.truck_id,
                    "scheduleId": schedule.id,
                    "zone": schedule.zone,
                    "location": schedule.location,
                    "time": schedule.time,
                    "source": point.source,
                }),
            ));
        }
    }

    for pin in &map.unassigned_online {
        if let Some(location) = pin.location {
            features.push(point_feature(
                location,
                json!({
                    "kind": "collector",
                    "collectorId": pin.id,
                    "name": pin.name,
                }),
            ));
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Firestore-backed dashboard reads.
#[derive(Clone)]
pub struct DashboardService {
    db: FirestoreDb,
    geocoder: Geocoder,
    utc_offset: FixedOffset,
}

impl DashboardService {
    pub fn new(db: FirestoreDb, geocoder: Geocoder, utc_offset: FixedOffset) -> Self {
        Self {
            db,
            geocoder,
            utc_offset,
        }
    }

    pub async fn snapshot(&self) -> Result<FleetSnapshot> {
        let (collectors, trucks, schedules) = tokio::try_join!(
            self.db.list_collectors(),
            self.db.list_trucks(),
            self.db.list_schedules(),
        )?;
        Ok(FleetSnapshot {
            collectors,
            trucks,
            schedules,
        })
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Ok(search::search(query, &FleetSnapshot::default()));
        }
        let snapshot = self.snapshot().await?;
        Ok(search::search(query, &snapshot))
    }

    pub async fn map(&self, now: DateTime<Utc>) -> Result<MapSnapshot> {
        let snapshot = self.snapshot().await?;
        let weekday = local_weekday_name(now, self.utc_offset);
        let mut map = build_map(&snapshot, weekday);

        for marker in &mut map.trucks {
            if let Some(schedule) = &marker.today_schedule {
                marker.schedule_point = Some(self.geocoder.geocode(&schedule.location).await);
            }
        }

        tracing::debug!(
            trucks = map.trucks.len(),
            unassigned = map.unassigned_online.len(),
            weekday,
            "Map snapshot built"
        );
        Ok(map)
    }

    /// Collectors attached to a truck.
    pub async fn truck_collectors(&self, truck_id: &str) -> Result<Vec<Collector>> {
        if self.db.get_truck(truck_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Truck {} not found", truck_id)));
        }
        let collectors = self.db.list_collectors().await?;
        Ok(collectors_for_truck(truck_id, &collectors)
            .into_iter()
            .cloned()
            .collect())
    }
}
