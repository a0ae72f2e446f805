use crate::models::{AssignmentRecord, AssignmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeStats {
    pub assigned: u64,
    pub completed: u64,
}

/// Assignment activity of one company over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub company_id: i64,
    pub period_days: i64,
    pub since: DateTime<Utc>,
    pub total: u64,
    pub auto_assigned: u64,
    pub manual: u64,
    pub by_assignee: BTreeMap<i64, AssigneeStats>,
}

impl AssignmentStats {
    pub fn from_records(
        company_id: i64,
        period_days: i64,
        since: DateTime<Utc>,
        records: &[AssignmentRecord],
    ) -> Self {
        let mut stats = Self {
            company_id,
            period_days,
            since,
            total: 0,
            auto_assigned: 0,
            manual: 0,
            by_assignee: BTreeMap::new(),
        };

        for record in records
            .iter()
            .filter(|r| r.company_id == company_id && r.assigned_at >= since)
        {
            stats.total += 1;
            if record.auto_assigned {
                stats.auto_assigned += 1;
            } else {
                stats.manual += 1;
            }

            let entry = stats.by_assignee.entry(record.assignee_id).or_default();
            entry.assigned += 1;
            if record.status == AssignmentStatus::Completed {
                entry.completed += 1;
            }
        }

        stats
    }

    /// Share of assignments made by rules, 0.0 when there were none
    pub fn auto_assignment_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.auto_assigned as f64 / self.total as f64
        }
    }
}
