// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wastefleet: waste-collection fleet backend
//!
//! Correlates collectors, trucks and collection schedules, tracks trucks
//! live during shifts, and serves the admin dashboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    CorrelationService, DashboardService, FleetService, Geocoder, LiveHub, ReportService,
    TrackingService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub live: LiveHub,
    pub correlation: CorrelationService,
    pub dashboard: DashboardService,
    pub fleet: FleetService,
    pub tracking: TrackingService,
    pub reports: ReportService,
}

impl AppState {
    /// Wire every service onto one database handle and live hub.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let live = LiveHub::new();
        let geocoder = Geocoder::new(config.google_maps_api_key.clone(), config.city_base);
        let offset = config.local_utc_offset;

        Self {
            correlation: CorrelationService::new(db.clone(), geocoder.clone(), offset),
            dashboard: DashboardService::new(db.clone(), geocoder, offset),
            fleet: FleetService::new(db.clone(), live.clone(), offset),
            tracking: TrackingService::new(db.clone(), live.clone()),
            reports: ReportService::new(db.clone()),
            live,
            db,
            config,
        }
    }
}
