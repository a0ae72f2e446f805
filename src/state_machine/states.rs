use crate::models::WorkItemType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed status enum with its wire names.
///
/// Each variant is listed once with the snake_case text stored in the
/// `status` column, which keeps `Display`, `FromStr` and serde in agreement.
macro_rules! lifecycle_status {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every status of this lifecycle, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {} status: {s}", $label)),
                }
            }
        }
    };
}

lifecycle_status! {
    /// Task lifecycle
    TaskStatus, "task" {
        /// Created, nobody owns it yet
        Pending => "pending",
        Assigned => "assigned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

lifecycle_status! {
    /// Maintenance request lifecycle
    MaintenanceStatus, "maintenance request" {
        /// Submitted by a tenant or staff member, nobody owns it yet
        Submitted => "submitted",
        Assigned => "assigned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

lifecycle_status! {
    /// Work order lifecycle
    WorkOrderStatus, "work order" {
        Created => "created",
        Assigned => "assigned",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

lifecycle_status! {
    /// Lease lifecycle
    LeaseStatus, "lease" {
        Draft => "draft",
        PendingSignature => "pending_signature",
        Active => "active",
        Expired => "expired",
        /// Ended early by either party
        Terminated => "terminated",
        /// Superseded by a renewal lease
        Renewed => "renewed",
    }
}

lifecycle_status! {
    /// Invoice lifecycle
    InvoiceStatus, "invoice" {
        Pending => "pending",
        Sent => "sent",
        Viewed => "viewed",
        Paid => "paid",
        /// Past due but still collectable
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

lifecycle_status! {
    /// Rental application lifecycle
    ApplicationStatus, "application" {
        Submitted => "submitted",
        UnderReview => "under_review",
        Approved => "approved",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
}

/// Status of any work item, tagged by its entity type.
///
/// The work-item type is carried by the variant, so a lease can never hold an
/// invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "status", rename_all = "snake_case")]
pub enum WorkItemStatus {
    Task(TaskStatus),
    MaintenanceRequest(MaintenanceStatus),
    WorkOrder(WorkOrderStatus),
    Lease(LeaseStatus),
    Invoice(InvoiceStatus),
    Application(ApplicationStatus),
}

/// Runs `$body` with `$s` bound to the inner status of whichever variant matched
macro_rules! with_status {
    ($status:expr, $s:ident => $body:expr) => {
        match $status {
            WorkItemStatus::Task($s) => $body,
            WorkItemStatus::MaintenanceRequest($s) => $body,
            WorkItemStatus::WorkOrder($s) => $body,
            WorkItemStatus::Lease($s) => $body,
            WorkItemStatus::Invoice($s) => $body,
            WorkItemStatus::Application($s) => $body,
        }
    };
}
pub(crate) use with_status;

impl WorkItemStatus {
    pub fn item_type(&self) -> WorkItemType {
        match self {
            Self::Task(_) => WorkItemType::Task,
            Self::MaintenanceRequest(_) => WorkItemType::MaintenanceRequest,
            Self::WorkOrder(_) => WorkItemType::WorkOrder,
            Self::Lease(_) => WorkItemType::Lease,
            Self::Invoice(_) => WorkItemType::Invoice,
            Self::Application(_) => WorkItemType::Application,
        }
    }

    pub fn as_str(&self) -> &'static str {
        with_status!(*self, s => s.as_str())
    }

    /// Parse a stored status string in the context of its entity type
    pub fn parse(item_type: WorkItemType, status: &str) -> Result<Self, String> {
        Ok(match item_type {
            WorkItemType::Task => Self::Task(status.parse()?),
            WorkItemType::MaintenanceRequest => Self::MaintenanceRequest(status.parse()?),
            WorkItemType::WorkOrder => Self::WorkOrder(status.parse()?),
            WorkItemType::Lease => Self::Lease(status.parse()?),
            WorkItemType::Invoice => Self::Invoice(status.parse()?),
            WorkItemType::Application => Self::Application(status.parse()?),
        })
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TaskStatus> for WorkItemStatus {
    fn from(status: TaskStatus) -> Self {
        Self::Task(status)
    }
}

impl From<MaintenanceStatus> for WorkItemStatus {
    fn from(status: MaintenanceStatus) -> Self {
        Self::MaintenanceRequest(status)
    }
}

impl From<WorkOrderStatus> for WorkItemStatus {
    fn from(status: WorkOrderStatus) -> Self {
        Self::WorkOrder(status)
    }
}

impl From<LeaseStatus> for WorkItemStatus {
    fn from(status: LeaseStatus) -> Self {
        Self::Lease(status)
    }
}

impl From<InvoiceStatus> for WorkItemStatus {
    fn from(status: InvoiceStatus) -> Self {
        Self::Invoice(status)
    }
}

impl From<ApplicationStatus> for WorkItemStatus {
    fn from(status: ApplicationStatus) -> Self {
        Self::Application(status)
    }
}
