// Work-item lifecycle state machines
//
// One closed status enum per work-item type, a single transition table over
// all of them, and the validator every status change goes through.

pub mod events;
pub mod states;
pub mod transitions;
pub mod validator;

// Re-export main types for convenient access
pub use events::{TransitionEvent, TransitionMetadata};
pub use states::{
    ApplicationStatus, InvoiceStatus, LeaseStatus, MaintenanceStatus, TaskStatus, WorkItemStatus,
    WorkOrderStatus,
};
pub use transitions::{Lifecycle, TransitionEffect, TransitionTable};
pub use validator::StatusTransitionValidator;
