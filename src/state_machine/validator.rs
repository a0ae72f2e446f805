//! # Status Transition Validator
//!
//! Pure gatekeeper for status changes. It checks the requested move against the
//! [`TransitionTable`](super::TransitionTable), stamps the canonical timestamp
//! fields for the destination status and hands back the updated item together
//! with the [`TransitionEvent`] to publish. It performs no I/O; persisting the
//! item and forwarding the event is the orchestrator's job.

use super::events::{TransitionEvent, TransitionMetadata};
use super::transitions::{TransitionEffect, TransitionTable};
use super::WorkItemStatus;
use crate::constants::DEFAULT_CANCELLATION_REASON;
use crate::error::{AssignmentError, Result};
use crate::models::{WorkItem, WorkItemType};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StatusTransitionValidator {
    default_cancellation_reason: String,
}

impl Default for StatusTransitionValidator {
    fn default() -> Self {
        Self::new(DEFAULT_CANCELLATION_REASON)
    }
}

impl StatusTransitionValidator {
    pub fn new(default_cancellation_reason: impl Into<String>) -> Self {
        Self {
            default_cancellation_reason: default_cancellation_reason.into(),
        }
    }

    pub fn can_transition(&self, item_type: WorkItemType, from: &str, to: &str) -> bool {
        TransitionTable::can_transition(item_type, from, to)
    }

    /// Check a move without applying it
    pub fn check(&self, item: &WorkItem, to: WorkItemStatus) -> Result<()> {
        if !item.status.can_transition_to(to) {
            return Err(AssignmentError::InvalidTransition {
                entity_type: item.item_type(),
                from: item.status.to_string(),
                to: to.to_string(),
            });
        }

        if to.requires_owner() && item.assigned_to_id.is_none() {
            return Err(AssignmentError::UnownedWorkItem {
                item_id: item.id,
                to: to.to_string(),
            });
        }

        Ok(())
    }

    /// Apply a move, returning the updated copy and its event
    pub fn apply_transition(
        &self,
        item: &WorkItem,
        to: WorkItemStatus,
        actor_id: i64,
        metadata: &TransitionMetadata,
        now: DateTime<Utc>,
    ) -> Result<(WorkItem, TransitionEvent)> {
        self.check(item, to)?;

        let mut updated = item.clone();
        updated.status = to;
        updated.updated_at = now;

        match to.effect() {
            TransitionEffect::Assigned => {
                updated.assigned_at = Some(now);
            }
            TransitionEffect::Started => {
                updated.started_at = Some(now);
            }
            TransitionEffect::Completed => {
                updated.completed_at = Some(now);
                updated.completed_by_id = Some(actor_id);
            }
            TransitionEffect::Cancelled => {
                updated.cancelled_at = Some(now);
                updated.cancelled_by_id = Some(actor_id);
                updated.cancellation_reason = Some(
                    metadata
                        .reason
                        .clone()
                        .unwrap_or_else(|| self.default_cancellation_reason.clone()),
                );
            }
            TransitionEffect::Marked => {}
        }

        if let Some(notes) = &metadata.notes {
            if !updated.metadata.is_object() {
                updated.metadata = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = &mut updated.metadata {
                map.insert("status_notes".to_string(), Value::String(notes.clone()));
            }
        }

        let event = TransitionEvent {
            event_id: Uuid::new_v4(),
            item_id: item.id,
            item_type: item.item_type(),
            company_id: item.company_id,
            from: item.status,
            to,
            actor_id,
            occurred_at: now,
            metadata: metadata.to_event_context(),
        };

        Ok((updated, event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkItemDraft;
    use crate::state_machine::{InvoiceStatus, LeaseStatus, MaintenanceStatus, TaskStatus};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn item(item_type: WorkItemType) -> WorkItem {
        WorkItem::from_draft(
            100,
            WorkItemDraft::new(item_type, 1, "Fix leaking tap"),
            fixed_now(),
        )
    }

    #[test]
    fn test_assigning_requires_owner() {
        let validator = StatusTransitionValidator::default();
        let task = item(WorkItemType::Task);

        let err = validator
            .apply_transition(
                &task,
                TaskStatus::Assigned.into(),
                7,
                &TransitionMetadata::new(),
                fixed_now(),
            )
            .unwrap_err();
        assert!(matches!(err, AssignmentError::UnownedWorkItem { item_id: 100, .. }));
    }

    #[test]
    fn test_assigned_sets_assigned_at_only() {
        let validator = StatusTransitionValidator::default();
        let mut task = item(WorkItemType::Task);
        task.assigned_to_id = Some(3);

        let (updated, event) = validator
            .apply_transition(
                &task,
                TaskStatus::Assigned.into(),
                7,
                &TransitionMetadata::new(),
                fixed_now(),
            )
            .unwrap();

        assert_eq!(updated.status, TaskStatus::Assigned.into());
        assert_eq!(updated.assigned_at, Some(fixed_now()));
        assert!(updated.started_at.is_none());
        assert!(updated.completed_at.is_none());
        assert_eq!(updated.assigned_to_id, Some(3));
        assert_eq!(updated.version, task.version);
        assert_eq!(event.from, TaskStatus::Pending.into());
        assert_eq!(event.to, TaskStatus::Assigned.into());
        assert_eq!(event.event_name(), "task.assigned");
    }

    #[test]
    fn test_cancel_records_actor_and_default_reason() {
        let validator = StatusTransitionValidator::default();
        let request = item(WorkItemType::MaintenanceRequest);

        let (updated, _) = validator
            .apply_transition(
                &request,
                MaintenanceStatus::Cancelled.into(),
                9,
                &TransitionMetadata::new().with_notes("duplicate"),
                fixed_now(),
            )
            .unwrap();

        assert_eq!(updated.cancelled_at, Some(fixed_now()));
        assert_eq!(updated.cancelled_by_id, Some(9));
        assert_eq!(
            updated.cancellation_reason.as_deref(),
            Some(DEFAULT_CANCELLATION_REASON)
        );
        assert_eq!(updated.metadata["status_notes"], "duplicate");
    }

    #[test]
    fn test_lease_termination_uses_cancel_fields() {
        let validator = StatusTransitionValidator::default();
        let mut lease = item(WorkItemType::Lease);
        lease.status = LeaseStatus::Active.into();

        let (updated, event) = validator
            .apply_transition(
                &lease,
                LeaseStatus::Terminated.into(),
                2,
                &TransitionMetadata::new().with_reason("breach of contract"),
                fixed_now(),
            )
            .unwrap();

        assert_eq!(
            updated.cancellation_reason.as_deref(),
            Some("breach of contract")
        );
        assert_eq!(event.metadata["reason"], "breach of contract");
    }

    #[test]
    fn test_paid_invoice_rejects_sent() {
        let validator = StatusTransitionValidator::default();
        let mut invoice = item(WorkItemType::Invoice);
        invoice.status = InvoiceStatus::Paid.into();

        let err = validator
            .apply_transition(
                &invoice,
                InvoiceStatus::Sent.into(),
                1,
                &TransitionMetadata::new(),
                fixed_now(),
            )
            .unwrap_err();

        match err {
            AssignmentError::InvalidTransition {
                entity_type,
                from,
                to,
            } => {
                assert_eq!(entity_type, WorkItemType::Invoice);
                assert_eq!(from, "paid");
                assert_eq!(to, "sent");
            }
            other => panic!("Expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_type_target_is_invalid() {
        let validator = StatusTransitionValidator::default();
        let task = item(WorkItemType::Task);
        let err = validator
            .apply_transition(
                &task,
                LeaseStatus::PendingSignature.into(),
                1,
                &TransitionMetadata::new(),
                fixed_now(),
            )
            .unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidTransition { .. }));
    }
}
