//! Domain events emitted by the orchestrator after a successful commit

use crate::constants::events;
use crate::models::{AssignmentRecord, Priority, WorkItem, WorkItemType};
use crate::state_machine::TransitionEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A work item gained its first owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub event_id: Uuid,
    pub item_id: i64,
    pub item_type: WorkItemType,
    pub company_id: i64,
    pub assignee_id: i64,
    pub assigned_by_id: i64,
    pub record_id: i64,
    pub auto_assigned: bool,
    /// Rule that produced the assignee, when auto-assigned
    pub rule_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

impl AssignmentEvent {
    pub fn from_record(record: &AssignmentRecord, rule_id: Option<i64>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            item_id: record.work_item_id,
            item_type: record.work_item_type,
            company_id: record.company_id,
            assignee_id: record.assignee_id,
            assigned_by_id: record.assigned_by_id,
            record_id: record.id,
            auto_assigned: record.auto_assigned,
            rule_id,
            occurred_at: record.assigned_at,
        }
    }
}

/// Ownership moved from one user to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReassignmentEvent {
    pub event_id: Uuid,
    pub item_id: i64,
    pub item_type: WorkItemType,
    pub company_id: i64,
    pub previous_assignee_id: Option<i64>,
    pub new_assignee_id: i64,
    pub actor_id: i64,
    pub record_id: i64,
    pub previous_record_id: Option<i64>,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// An emergency maintenance request produced a work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgentMaintenanceEvent {
    pub event_id: Uuid,
    /// The maintenance request that raised the alert
    pub request_id: i64,
    /// Work item created for it; equals `request_id` for direct submissions
    pub item_id: i64,
    pub item_type: WorkItemType,
    pub company_id: i64,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

impl UrgentMaintenanceEvent {
    pub fn for_item(request_id: i64, item: &WorkItem, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            request_id,
            item_id: item.id,
            item_type: item.item_type(),
            company_id: item.company_id,
            priority: item.priority,
            assignee_id: item.assigned_to_id,
            due_date: item.due_date,
            occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Assigned(AssignmentEvent),
    Reassigned(ReassignmentEvent),
    Transitioned(TransitionEvent),
    UrgentMaintenance(UrgentMaintenanceEvent),
}

impl DomainEvent {
    /// Routing name for subscribers
    pub fn name(&self) -> String {
        match self {
            Self::Assigned(_) => events::WORK_ITEM_ASSIGNED.to_string(),
            Self::Reassigned(_) => events::WORK_ITEM_REASSIGNED.to_string(),
            Self::Transitioned(event) => event.event_name(),
            Self::UrgentMaintenance(_) => events::MAINTENANCE_URGENT.to_string(),
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            Self::Assigned(e) => e.event_id,
            Self::Reassigned(e) => e.event_id,
            Self::Transitioned(e) => e.event_id,
            Self::UrgentMaintenance(e) => e.event_id,
        }
    }

    pub fn item_id(&self) -> i64 {
        match self {
            Self::Assigned(e) => e.item_id,
            Self::Reassigned(e) => e.item_id,
            Self::Transitioned(e) => e.item_id,
            Self::UrgentMaintenance(e) => e.item_id,
        }
    }

    pub fn company_id(&self) -> i64 {
        match self {
            Self::Assigned(e) => e.company_id,
            Self::Reassigned(e) => e.company_id,
            Self::Transitioned(e) => e.company_id,
            Self::UrgentMaintenance(e) => e.company_id,
        }
    }
}

impl From<AssignmentEvent> for DomainEvent {
    fn from(event: AssignmentEvent) -> Self {
        Self::Assigned(event)
    }
}

impl From<ReassignmentEvent> for DomainEvent {
    fn from(event: ReassignmentEvent) -> Self {
        Self::Reassigned(event)
    }
}

impl From<TransitionEvent> for DomainEvent {
    fn from(event: TransitionEvent) -> Self {
        Self::Transitioned(event)
    }
}

impl From<UrgentMaintenanceEvent> for DomainEvent {
    fn from(event: UrgentMaintenanceEvent) -> Self {
        Self::UrgentMaintenance(event)
    }
}
