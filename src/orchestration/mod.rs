//! # Orchestration
//!
//! The engine's public surface.
//!
//! - [`AssignmentOrchestrator`]: assignment, reassignment, status transitions,
//!   history and statistics over an [`AssignmentStore`](crate::persistence::AssignmentStore)
//! - [`AutomationPlanner`]: turns property-management triggers and maintenance
//!   submissions into work-item drafts
//! - [`AssignmentStats`]: trailing-window assignment activity per company

pub mod automation;
pub mod orchestrator;
pub mod stats;

pub use automation::{
    AutomationPlanner, AutomationTrigger, MaintenanceSubmission, TriggerReport, TriggeredItem,
};
pub use orchestrator::{
    AssignmentOrchestrator, AssignmentOutcome, Clock, CreatedWorkItem, ManualClock,
    ReassignmentOutcome, SystemClock, TransitionOutcome,
};
pub use stats::{AssigneeStats, AssignmentStats};
