//! # System Constants
//!
//! Defaults and event names shared by the engine, the shipped configuration
//! file and the stores.

/// Domain event names published to notification and audit collaborators
pub mod events {
    pub const WORK_ITEM_ASSIGNED: &str = "work_item.assigned";
    pub const WORK_ITEM_REASSIGNED: &str = "work_item.reassigned";
    /// Emergency maintenance needs immediate attention
    pub const MAINTENANCE_URGENT: &str = "maintenance.urgent";
    /// Prefix for `<type>.<status>` transition events
    pub const WORK_ITEM_TRANSITIONED: &str = "work_item.transitioned";
}

/// Cancellation reason recorded when the caller gives none
pub const DEFAULT_CANCELLATION_REASON: &str = "No reason provided";

/// User id that automation-generated work items are created by
pub const SYSTEM_USER_ID: i64 = 1;

/// Maintenance categories that default to high priority
pub const DEFAULT_EMERGENCY_CATEGORIES: [&str; 5] =
    ["plumbing", "electrical", "heating", "security", "lockout"];

/// Default SLA hours by priority
pub mod sla_hours {
    pub const EMERGENCY: i64 = 2;
    pub const URGENT: i64 = 24;
    pub const HIGH: i64 = 24;
    pub const MEDIUM: i64 = 72;
    pub const LOW: i64 = 168;
}

/// Default trailing window for assignment statistics
pub const DEFAULT_STATS_PERIOD_DAYS: i64 = 30;

/// Longest trailing window accepted for assignment statistics
pub const MAX_STATS_PERIOD_DAYS: i64 = 3650;

/// Default broadcast capacity for the event publisher
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;
