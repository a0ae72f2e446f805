//! # Assignment Engine Configuration
//!
//! Layered configuration for the engine, loaded with the `config` crate:
//!
//! 1. `config/assignment.toml` (required)
//! 2. `config/assignment.<environment>.toml` (optional override)
//! 3. `ASSIGNMENT__<SECTION>__<KEY>` environment variables
//!
//! Every section has defaults, so an override file only needs the keys it
//! changes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use assignment_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let sla_hours = manager.config().sla.hours_for(assignment_core::models::Priority::High);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{
    sla_hours, DEFAULT_CANCELLATION_REASON, DEFAULT_EMERGENCY_CATEGORIES,
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_STATS_PERIOD_DAYS, MAX_STATS_PERIOD_DAYS,
    SYSTEM_USER_ID,
};
use crate::models::Priority;
use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/assignment.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssignmentConfig {
    pub database: DatabaseConfig,
    pub events: EventsConfig,
    pub sla: SlaConfig,
    pub maintenance: MaintenanceConfig,
    pub engine: EngineConfig,
}

/// PostgreSQL store connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    /// Explicit URL, falling back to `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Response-time targets for automation-generated due dates
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SlaConfig {
    pub emergency_hours: i64,
    pub urgent_hours: i64,
    pub high_hours: i64,
    pub medium_hours: i64,
    pub low_hours: i64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            emergency_hours: sla_hours::EMERGENCY,
            urgent_hours: sla_hours::URGENT,
            high_hours: sla_hours::HIGH,
            medium_hours: sla_hours::MEDIUM,
            low_hours: sla_hours::LOW,
        }
    }
}

impl SlaConfig {
    pub fn hours_for(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Emergency => self.emergency_hours,
            Priority::Urgent => self.urgent_hours,
            Priority::High => self.high_hours,
            Priority::Medium => self.medium_hours,
            Priority::Low => self.low_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Categories that default to high priority when none is given
    pub emergency_categories: Vec<String>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            emergency_categories: DEFAULT_EMERGENCY_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Creator of automation-generated items
    pub system_user_id: i64,
    pub default_cancellation_reason: String,
    pub stats_period_days: i64,
    /// Fixed seed for role-based random selection; entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_user_id: SYSTEM_USER_ID,
            default_cancellation_reason: DEFAULT_CANCELLATION_REASON.to_string(),
            stats_period_days: DEFAULT_STATS_PERIOD_DAYS,
            rng_seed: None,
        }
    }
}

impl AssignmentConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                self.database.max_connections,
                "must be greater than zero",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity,
                "must be greater than zero",
            ));
        }

        let sla = [
            ("sla.emergency_hours", self.sla.emergency_hours),
            ("sla.urgent_hours", self.sla.urgent_hours),
            ("sla.high_hours", self.sla.high_hours),
            ("sla.medium_hours", self.sla.medium_hours),
            ("sla.low_hours", self.sla.low_hours),
        ];
        for (field, hours) in sla {
            if hours <= 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    hours,
                    "SLA hours must be positive",
                ));
            }
        }

        if !(1..=MAX_STATS_PERIOD_DAYS).contains(&self.engine.stats_period_days) {
            return Err(ConfigurationError::invalid_value(
                "engine.stats_period_days",
                self.engine.stats_period_days,
                format!("must be between 1 and {MAX_STATS_PERIOD_DAYS}"),
            ));
        }

        Ok(())
    }
}
