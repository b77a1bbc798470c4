//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const COLLECTORS: &str = "collectors";
    pub const TRUCKS: &str = "trucks";
    pub const SCHEDULES: &str = "schedules";
    /// Performed pickups
    pub const COLLECTIONS: &str = "collections";
    /// Resident complaints
    pub const REPORTS: &str = "reports";
    pub const COLLECTOR_REPORTS: &str = "collector_reports";
    pub const NOTIFICATIONS: &str = "notifications";
}
