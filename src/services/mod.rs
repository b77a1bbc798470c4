// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod correlation;
pub mod dashboard;
pub mod fleet;
pub mod geocode;
pub mod live;
pub mod reports;
pub mod search;
pub mod tracking;

pub use correlation::CorrelationService;
pub use dashboard::{DashboardService, FleetSnapshot};
pub use fleet::FleetService;
pub use geocode::Geocoder;
pub use live::{FleetEvent, LiveHub};
pub use reports::ReportService;
pub use tracking::TrackingService;
