//! # Work Item Model
//!
//! A work item is any unit of back-office work that can be owned by a user and
//! moves through a status lifecycle: tasks, maintenance requests, work orders,
//! leases, invoices and rental applications.
//!
//! ## Ownership
//!
//! `assigned_to_id` is written only by the orchestrator. Status is written only
//! through the transition validator, which also stamps the canonical timestamp
//! for the destination status.
//!
//! ## Concurrency
//!
//! `version` starts at 1 and is bumped by every successful write. Stores reject
//! a write whose expected version no longer matches the stored row.

use crate::state_machine::WorkItemStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The entity kinds subject to assignment and lifecycle rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Task,
    MaintenanceRequest,
    WorkOrder,
    Lease,
    Invoice,
    Application,
}

impl WorkItemType {
    pub const ALL: [WorkItemType; 6] = [
        Self::Task,
        Self::MaintenanceRequest,
        Self::WorkOrder,
        Self::Lease,
        Self::Invoice,
        Self::Application,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::MaintenanceRequest => "maintenance_request",
            Self::WorkOrder => "work_order",
            Self::Lease => "lease",
            Self::Invoice => "invoice",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "maintenance_request" => Ok(Self::MaintenanceRequest),
            "work_order" => Ok(Self::WorkOrder),
            "lease" => Ok(Self::Lease),
            "invoice" => Ok(Self::Invoice),
            "application" => Ok(Self::Application),
            _ => Err(format!("Invalid work item type: {s}")),
        }
    }
}

/// Urgency of a work item, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    #[serde(alias = "normal")]
    Medium,
    High,
    Urgent,
    Emergency,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "normal" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            "emergency" => Ok(Self::Emergency),
            other => Err(format!("Invalid priority: {other}")),
        }
    }
}

/// A work item as loaded from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub status: WorkItemStatus,
    pub priority: Priority,
    pub category: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by_id: Option<i64>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by_id: Option<i64>,
    pub cancellation_reason: Option<String>,
    pub metadata: serde_json::Value,
    pub version: i64,
}

impl WorkItem {
    /// Materialize a draft as a fresh item in its type's initial status
    pub fn from_draft(id: i64, draft: WorkItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            company_id: draft.company_id,
            title: draft.title,
            status: WorkItemStatus::initial(draft.item_type),
            priority: draft.priority,
            category: draft.category,
            assigned_to_id: draft.assigned_to_id,
            created_by_id: draft.created_by_id,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
            assigned_at: None,
            started_at: None,
            completed_at: None,
            completed_by_id: None,
            cancelled_at: None,
            cancelled_by_id: None,
            cancellation_reason: None,
            metadata: draft.metadata,
            version: 1,
        }
    }

    pub fn item_type(&self) -> WorkItemType {
        self.status.item_type()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Counts toward the assignee's workload
    pub fn is_active_for(&self, user_id: i64) -> bool {
        self.assigned_to_id == Some(user_id) && !self.is_terminal()
    }
}

/// Input for creating a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemDraft {
    pub item_type: WorkItemType,
    pub company_id: i64,
    pub title: String,
    pub priority: Priority,
    pub category: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl WorkItemDraft {
    pub fn new(item_type: WorkItemType, company_id: i64, title: impl Into<String>) -> Self {
        Self {
            item_type,
            company_id,
            title: title.into(),
            priority: Priority::default(),
            category: None,
            assigned_to_id: None,
            created_by_id: None,
            due_date: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_assignee(mut self, user_id: i64) -> Self {
        self.assigned_to_id = Some(user_id);
        self
    }

    pub fn with_creator(mut self, user_id: i64) -> Self {
        self.created_by_id = Some(user_id);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
