use crate::models::WorkItemType;
use thiserror::Error;

/// Errors surfaced by the assignment and lifecycle engine
#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Invalid {entity_type} transition from {from} to {to}")]
    InvalidTransition {
        entity_type: WorkItemType,
        from: String,
        to: String,
    },

    #[error("No eligible assignee for {item_type} {item_id}")]
    NoEligibleAssignee {
        item_id: i64,
        item_type: WorkItemType,
    },

    #[error("Cannot reassign work item {item_id}: {reason}")]
    InvalidReassignment { item_id: i64, reason: String },

    #[error(
        "Concurrent modification of work item {item_id}: expected version {expected_version}, found {actual_version}"
    )]
    ConcurrentModification {
        item_id: i64,
        expected_version: i64,
        actual_version: i64,
    },

    #[error("Work item {item_id} cannot enter {to} without an assignee")]
    UnownedWorkItem { item_id: i64, to: String },

    #[error("Work item not found: {0}")]
    WorkItemNotFound(i64),

    #[error(transparent)]
    RuleConfiguration(#[from] RuleConfigurationError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigurationError),
}

impl AssignmentError {
    /// Conflicts are worth one retry with a freshly loaded item
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    /// Errors the caller can recover from by rejecting or queueing the request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::NoEligibleAssignee { .. }
                | Self::InvalidReassignment { .. }
                | Self::ConcurrentModification { .. }
                | Self::UnownedWorkItem { .. }
        )
    }
}

/// A rule row that cannot be turned into a strategy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleConfigurationError {
    #[error("Rule {rule_id} has unknown assignment type '{assignment_type}'")]
    UnknownAssignmentType {
        rule_id: i64,
        assignment_type: String,
    },

    #[error("Rule {rule_id} ({assignment_type}) is missing target_role")]
    MissingTargetRole {
        rule_id: i64,
        assignment_type: String,
    },

    #[error("Rule {rule_id} (user_specific) is missing target_user_id")]
    MissingTargetUser { rule_id: i64 },
}

/// Persistence collaborator failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Version conflict on work item {item_id}: expected {expected}, found {actual}")]
    VersionConflict {
        item_id: i64,
        expected: i64,
        actual: i64,
    },

    #[error("Work item not found: {0}")]
    NotFound(i64),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("No database url configured and DATABASE_URL is unset")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for AssignmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict {
                item_id,
                expected,
                actual,
            } => Self::ConcurrentModification {
                item_id,
                expected_version: expected,
                actual_version: actual,
            },
            StoreError::NotFound(id) => Self::WorkItemNotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssignmentError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict_maps_to_concurrent_modification() {
        let err: AssignmentError = StoreError::VersionConflict {
            item_id: 7,
            expected: 1,
            actual: 2,
        }
        .into();

        assert!(err.is_conflict());
        assert!(err.is_recoverable());
        match err {
            AssignmentError::ConcurrentModification {
                item_id,
                expected_version,
                actual_version,
            } => {
                assert_eq!(item_id, 7);
                assert_eq!(expected_version, 1);
                assert_eq!(actual_version, 2);
            }
            other => panic!("Expected ConcurrentModification, got {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = AssignmentError::InvalidTransition {
            entity_type: WorkItemType::Invoice,
            from: "paid".to_string(),
            to: "sent".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid invoice transition from paid to sent");

        let err = RuleConfigurationError::MissingTargetUser { rule_id: 3 };
        assert_eq!(
            err.to_string(),
            "Rule 3 (user_specific) is missing target_user_id"
        );
    }

    #[test]
    fn test_not_found_is_not_recoverable() {
        let err: AssignmentError = StoreError::NotFound(9).into();
        assert!(matches!(err, AssignmentError::WorkItemNotFound(9)));
        assert!(!err.is_recoverable());
    }
}
