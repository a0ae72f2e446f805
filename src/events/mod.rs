pub mod dispatch;
pub mod domain;
pub mod publisher;

pub use dispatch::{
    AuditRecorder, CollectingRecorder, DispatchError, NotificationDispatcher, TracingAuditRecorder,
};
pub use domain::{AssignmentEvent, DomainEvent, ReassignmentEvent, UrgentMaintenanceEvent};
pub use publisher::{EventPublisher, PublishedEvent};
