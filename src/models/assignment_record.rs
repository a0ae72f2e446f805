//! # Assignment Record Model
//!
//! One row per (work item, owner) period. At most one record per work item is
//! `active`; handing an item to someone else closes the active record as
//! `reassigned` and links the new one back through `previous_assignment_id`.
//!
//! Record lifecycle: `active -> completed | cancelled | reassigned`. Closed
//! records are never reopened.

use super::WorkItemType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Completed,
    Cancelled,
    Reassigned,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Reassigned => "reassigned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Only an active record may be closed, and only into a terminal status
    pub fn can_transition_to(&self, to: AssignmentStatus) -> bool {
        matches!(self, Self::Active) && to.is_terminal()
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "reassigned" => Ok(Self::Reassigned),
            _ => Err(format!("Invalid assignment status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: i64,
    pub work_item_id: i64,
    pub work_item_type: WorkItemType,
    pub company_id: i64,
    pub assignee_id: i64,
    pub assigned_by_id: i64,
    pub assigned_at: DateTime<Utc>,
    pub status: AssignmentStatus,
    /// History back-reference, not ownership
    pub previous_assignment_id: Option<i64>,
    pub auto_assigned: bool,
    pub reason: Option<String>,
}

/// A record to be created; the store fills in `id` and `previous_assignment_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignmentRecord {
    pub work_item_id: i64,
    pub work_item_type: WorkItemType,
    pub company_id: i64,
    pub assignee_id: i64,
    pub assigned_by_id: i64,
    pub assigned_at: DateTime<Utc>,
    pub auto_assigned: bool,
    pub reason: Option<String>,
}

impl NewAssignmentRecord {
    pub fn into_record(self, id: i64, previous_assignment_id: Option<i64>) -> AssignmentRecord {
        AssignmentRecord {
            id,
            work_item_id: self.work_item_id,
            work_item_type: self.work_item_type,
            company_id: self.company_id,
            assignee_id: self.assignee_id,
            assigned_by_id: self.assigned_by_id,
            assigned_at: self.assigned_at,
            status: AssignmentStatus::Active,
            previous_assignment_id,
            auto_assigned: self.auto_assigned,
            reason: self.reason,
        }
    }
}
