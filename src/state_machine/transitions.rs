//! # Transition Table
//!
//! The single source of truth for which status changes each work-item type may
//! make. Task, maintenance request and work order share one shape and differ
//! only in the name of their initial state:
//!
//! ```text
//! <initial> -> assigned -> in_progress -> completed
//!     \            \            \
//!      +------------+------------+--> cancelled
//! ```
//!
//! Lease, invoice and application follow their own graphs. A status is terminal
//! exactly when its successor list is empty.

use super::states::{
    with_status, ApplicationStatus, InvoiceStatus, LeaseStatus, MaintenanceStatus, TaskStatus,
    WorkItemStatus, WorkOrderStatus,
};
use crate::models::WorkItemType;
use serde::{Deserialize, Serialize};

/// Which canonical fields a transition into a status touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEffect {
    /// `assigned_at`
    Assigned,
    /// `started_at`
    Started,
    /// `completed_at` and `completed_by_id`
    Completed,
    /// `cancelled_at`, `cancelled_by_id` and the cancellation reason
    Cancelled,
    /// Status change only
    Marked,
}

/// Graph behaviour shared by every per-type status enum
pub trait Lifecycle: Copy + Eq + 'static {
    const ITEM_TYPE: WorkItemType;
    const INITIAL: Self;
    /// The status an item enters when it gains an owner, if the type has one
    const ASSIGNED: Option<Self>;

    fn successors(self) -> &'static [Self];

    fn effect(self) -> TransitionEffect;

    /// Statuses that only make sense with an assignee
    fn requires_owner(self) -> bool {
        false
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition_to(self, to: Self) -> bool {
        self.successors().contains(&to)
    }
}

impl Lifecycle for TaskStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::Task;
    const INITIAL: Self = Self::Pending;
    const ASSIGNED: Option<Self> = Some(Self::Assigned);

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Pending => TransitionEffect::Marked,
            Self::Assigned => TransitionEffect::Assigned,
            Self::InProgress => TransitionEffect::Started,
            Self::Completed => TransitionEffect::Completed,
            Self::Cancelled => TransitionEffect::Cancelled,
        }
    }

    fn requires_owner(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }
}

impl Lifecycle for MaintenanceStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::MaintenanceRequest;
    const INITIAL: Self = Self::Submitted;
    const ASSIGNED: Option<Self> = Some(Self::Assigned);

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Submitted => TransitionEffect::Marked,
            Self::Assigned => TransitionEffect::Assigned,
            Self::InProgress => TransitionEffect::Started,
            Self::Completed => TransitionEffect::Completed,
            Self::Cancelled => TransitionEffect::Cancelled,
        }
    }

    fn requires_owner(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }
}

impl Lifecycle for WorkOrderStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::WorkOrder;
    const INITIAL: Self = Self::Created;
    const ASSIGNED: Option<Self> = Some(Self::Assigned);

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Created => &[Self::Assigned, Self::Cancelled],
            Self::Assigned => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Created => TransitionEffect::Marked,
            Self::Assigned => TransitionEffect::Assigned,
            Self::InProgress => TransitionEffect::Started,
            Self::Completed => TransitionEffect::Completed,
            Self::Cancelled => TransitionEffect::Cancelled,
        }
    }

    fn requires_owner(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }
}

impl Lifecycle for LeaseStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::Lease;
    const INITIAL: Self = Self::Draft;
    const ASSIGNED: Option<Self> = None;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::PendingSignature],
            Self::PendingSignature => &[Self::Active],
            Self::Active => &[Self::Expired, Self::Terminated, Self::Renewed],
            Self::Expired | Self::Terminated | Self::Renewed => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Draft | Self::PendingSignature => TransitionEffect::Marked,
            Self::Active => TransitionEffect::Started,
            Self::Expired | Self::Renewed => TransitionEffect::Completed,
            Self::Terminated => TransitionEffect::Cancelled,
        }
    }
}

impl Lifecycle for InvoiceStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::Invoice;
    const INITIAL: Self = Self::Pending;
    const ASSIGNED: Option<Self> = None;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Sent],
            Self::Sent => &[Self::Viewed],
            Self::Viewed => &[Self::Paid, Self::Overdue, Self::Cancelled],
            Self::Overdue => &[Self::Paid, Self::Cancelled],
            Self::Paid | Self::Cancelled => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Pending | Self::Viewed | Self::Overdue => TransitionEffect::Marked,
            Self::Sent => TransitionEffect::Started,
            Self::Paid => TransitionEffect::Completed,
            Self::Cancelled => TransitionEffect::Cancelled,
        }
    }
}

impl Lifecycle for ApplicationStatus {
    const ITEM_TYPE: WorkItemType = WorkItemType::Application;
    const INITIAL: Self = Self::Submitted;
    const ASSIGNED: Option<Self> = None;

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::UnderReview],
            Self::UnderReview => &[Self::Approved, Self::Rejected, Self::Withdrawn],
            Self::Approved | Self::Rejected | Self::Withdrawn => &[],
        }
    }

    fn effect(self) -> TransitionEffect {
        match self {
            Self::Submitted => TransitionEffect::Marked,
            Self::UnderReview => TransitionEffect::Started,
            Self::Approved | Self::Rejected => TransitionEffect::Completed,
            Self::Withdrawn => TransitionEffect::Cancelled,
        }
    }
}

impl WorkItemStatus {
    /// Initial status of a freshly created item of the given type
    pub fn initial(item_type: WorkItemType) -> Self {
        match item_type {
            WorkItemType::Task => TaskStatus::INITIAL.into(),
            WorkItemType::MaintenanceRequest => MaintenanceStatus::INITIAL.into(),
            WorkItemType::WorkOrder => WorkOrderStatus::INITIAL.into(),
            WorkItemType::Lease => LeaseStatus::INITIAL.into(),
            WorkItemType::Invoice => InvoiceStatus::INITIAL.into(),
            WorkItemType::Application => ApplicationStatus::INITIAL.into(),
        }
    }

    /// The owner-bearing status for types that have one
    pub fn assigned(item_type: WorkItemType) -> Option<Self> {
        match item_type {
            WorkItemType::Task => TaskStatus::ASSIGNED.map(Into::into),
            WorkItemType::MaintenanceRequest => MaintenanceStatus::ASSIGNED.map(Into::into),
            WorkItemType::WorkOrder => WorkOrderStatus::ASSIGNED.map(Into::into),
            WorkItemType::Lease => LeaseStatus::ASSIGNED.map(Into::into),
            WorkItemType::Invoice => InvoiceStatus::ASSIGNED.map(Into::into),
            WorkItemType::Application => ApplicationStatus::ASSIGNED.map(Into::into),
        }
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::initial(self.item_type())
    }

    pub fn is_terminal(&self) -> bool {
        with_status!(*self, s => s.is_terminal())
    }

    pub fn effect(&self) -> TransitionEffect {
        with_status!(*self, s => s.effect())
    }

    pub fn requires_owner(&self) -> bool {
        with_status!(*self, s => s.requires_owner())
    }

    pub fn successors(&self) -> Vec<WorkItemStatus> {
        with_status!(*self, s => s.successors().iter().map(|&next| next.into()).collect())
    }

    /// Edges only exist between statuses of the same entity type
    pub fn can_transition_to(&self, to: WorkItemStatus) -> bool {
        match (*self, to) {
            (Self::Task(from), Self::Task(to)) => from.can_transition_to(to),
            (Self::MaintenanceRequest(from), Self::MaintenanceRequest(to)) => {
                from.can_transition_to(to)
            }
            (Self::WorkOrder(from), Self::WorkOrder(to)) => from.can_transition_to(to),
            (Self::Lease(from), Self::Lease(to)) => from.can_transition_to(to),
            (Self::Invoice(from), Self::Invoice(to)) => from.can_transition_to(to),
            (Self::Application(from), Self::Application(to)) => from.can_transition_to(to),
            _ => false,
        }
    }
}

/// String-level view of the graphs for callers that hold raw status text
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionTable;

impl TransitionTable {
    /// Pre-flight check used by UIs; unknown status names are never reachable
    pub fn can_transition(item_type: WorkItemType, from: &str, to: &str) -> bool {
        match (
            WorkItemStatus::parse(item_type, from),
            WorkItemStatus::parse(item_type, to),
        ) {
            (Ok(from), Ok(to)) => from.can_transition_to(to),
            _ => false,
        }
    }

    pub fn statuses(item_type: WorkItemType) -> Vec<WorkItemStatus> {
        fn all<S: Lifecycle + Into<WorkItemStatus>>(statuses: &[S]) -> Vec<WorkItemStatus> {
            statuses.iter().map(|&s| s.into()).collect()
        }

        match item_type {
            WorkItemType::Task => all(TaskStatus::ALL),
            WorkItemType::MaintenanceRequest => all(MaintenanceStatus::ALL),
            WorkItemType::WorkOrder => all(WorkOrderStatus::ALL),
            WorkItemType::Lease => all(LeaseStatus::ALL),
            WorkItemType::Invoice => all(InvoiceStatus::ALL),
            WorkItemType::Application => all(ApplicationStatus::ALL),
        }
    }

    pub fn terminal_statuses(item_type: WorkItemType) -> Vec<WorkItemStatus> {
        Self::statuses(item_type)
            .into_iter()
            .filter(WorkItemStatus::is_terminal)
            .collect()
    }

    /// Every legal `(from, to)` pair for a type
    pub fn edges(item_type: WorkItemType) -> Vec<(WorkItemStatus, WorkItemStatus)> {
        Self::statuses(item_type)
            .into_iter()
            .flat_map(|from| from.successors().into_iter().map(move |to| (from, to)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_shaped_graphs_allow_cancel_from_every_open_state() {
        for item_type in [
            WorkItemType::Task,
            WorkItemType::MaintenanceRequest,
            WorkItemType::WorkOrder,
        ] {
            for status in TransitionTable::statuses(item_type) {
                let cancelled = WorkItemStatus::parse(item_type, "cancelled").unwrap();
                assert_eq!(
                    status.can_transition_to(cancelled),
                    !status.is_terminal(),
                    "{item_type} {status} -> cancelled"
                );
            }
        }
    }

    #[test]
    fn test_initial_statuses() {
        assert_eq!(WorkItemStatus::initial(WorkItemType::Task).as_str(), "pending");
        assert_eq!(
            WorkItemStatus::initial(WorkItemType::MaintenanceRequest).as_str(),
            "submitted"
        );
        assert_eq!(WorkItemStatus::initial(WorkItemType::WorkOrder).as_str(), "created");
        assert_eq!(WorkItemStatus::initial(WorkItemType::Lease).as_str(), "draft");
        assert_eq!(WorkItemStatus::initial(WorkItemType::Invoice).as_str(), "pending");
        assert_eq!(
            WorkItemStatus::initial(WorkItemType::Application).as_str(),
            "submitted"
        );
    }

    #[test]
    fn test_only_task_shaped_types_have_assigned_state() {
        assert!(WorkItemStatus::assigned(WorkItemType::Task).is_some());
        assert!(WorkItemStatus::assigned(WorkItemType::WorkOrder).is_some());
        assert!(WorkItemStatus::assigned(WorkItemType::Lease).is_none());
        assert!(WorkItemStatus::assigned(WorkItemType::Invoice).is_none());
        assert!(WorkItemStatus::assigned(WorkItemType::Application).is_none());
    }

    #[test]
    fn test_overdue_invoice_is_not_terminal() {
        let overdue = WorkItemStatus::Invoice(InvoiceStatus::Overdue);
        assert!(!overdue.is_terminal());
        assert!(overdue.can_transition_to(InvoiceStatus::Paid.into()));
    }

    #[test]
    fn test_cross_type_transitions_are_rejected() {
        let task = WorkItemStatus::Task(TaskStatus::Pending);
        assert!(!task.can_transition_to(WorkOrderStatus::Assigned.into()));
        assert!(!TransitionTable::can_transition(WorkItemType::Task, "pending", "bogus"));
    }

    #[test]
    fn test_effects() {
        assert_eq!(LeaseStatus::Terminated.effect(), TransitionEffect::Cancelled);
        assert_eq!(InvoiceStatus::Paid.effect(), TransitionEffect::Completed);
        assert_eq!(ApplicationStatus::UnderReview.effect(), TransitionEffect::Started);
        assert_eq!(TaskStatus::Assigned.effect(), TransitionEffect::Assigned);
    }
}
