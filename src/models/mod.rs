// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod collection;
pub mod collector;
pub mod location;
pub mod report;
pub mod schedule;
pub mod truck;

pub use collection::{CollectionRecord, CollectionStatus};
pub use collector::{Collector, CollectorStatus};
pub use location::GeoPoint;
pub use report::{CollectorReport, MaintenanceStatus, Notification, Report, ReportStatus};
pub use schedule::Schedule;
pub use truck::{CollectionEntry, FleetError, LoadUpdate, Truck, TruckStatus};
