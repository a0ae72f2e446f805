use crate::config::{MaintenanceConfig, SlaConfig};
use crate::models::Priority;
use chrono::{DateTime, Duration, Utc};

/// Maintenance priority defaults and SLA due dates
#[derive(Debug, Clone)]
pub struct PriorityDeriver {
    sla: SlaConfig,
    emergency_categories: Vec<String>,
}

impl Default for PriorityDeriver {
    fn default() -> Self {
        Self::new(SlaConfig::default(), MaintenanceConfig::default())
    }
}

impl PriorityDeriver {
    pub fn new(sla: SlaConfig, maintenance: MaintenanceConfig) -> Self {
        Self {
            sla,
            emergency_categories: maintenance.emergency_categories,
        }
    }

    /// Emergency flag, then explicit priority, then category, then medium
    pub fn derive_maintenance_priority(
        &self,
        is_emergency: bool,
        explicit: Option<Priority>,
        category: Option<&str>,
    ) -> Priority {
        if is_emergency {
            return Priority::Emergency;
        }
        if let Some(priority) = explicit {
            return priority;
        }
        match category {
            Some(category) if self.is_emergency_category(category) => Priority::High,
            _ => Priority::Medium,
        }
    }

    pub fn is_emergency_category(&self, category: &str) -> bool {
        self.emergency_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn sla(&self, priority: Priority) -> Duration {
        Duration::hours(self.sla.hours_for(priority))
    }

    pub fn sla_due_date(&self, priority: Priority, from: DateTime<Utc>) -> DateTime<Utc> {
        from + self.sla(priority)
    }
}
