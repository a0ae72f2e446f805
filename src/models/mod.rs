pub mod assignment_record;
pub mod assignment_rule;
pub mod user;
pub mod work_item;

// Re-export core models for easy access
pub use assignment_record::{AssignmentRecord, AssignmentStatus, NewAssignmentRecord};
pub use assignment_rule::{AssignmentRule, AssignmentStrategy, AssignmentType};
pub use user::User;
pub use work_item::{Priority, WorkItem, WorkItemDraft, WorkItemType};
