use crate::models::WorkItemType;
use crate::state_machine::WorkItemStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Caller-supplied context for a status change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionMetadata {
    /// Cancellation or termination reason
    pub reason: Option<String>,
    /// Free-form notes kept on the item as `status_notes`
    pub notes: Option<String>,
    /// Extra context forwarded on the event only
    #[serde(default)]
    pub extra: Value,
}

impl TransitionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }

    /// Flatten into the JSON attached to a transition event
    pub fn to_event_context(&self) -> Value {
        let mut context = serde_json::Map::new();
        if let Some(reason) = &self.reason {
            context.insert("reason".to_string(), Value::String(reason.clone()));
        }
        if let Some(notes) = &self.notes {
            context.insert("notes".to_string(), Value::String(notes.clone()));
        }
        match &self.extra {
            Value::Object(extra) => {
                for (key, value) in extra {
                    context.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            Value::Null => {}
            other => {
                context.insert("extra".to_string(), other.clone());
            }
        }
        Value::Object(context)
    }
}

/// Emitted by the validator for every accepted status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub event_id: Uuid,
    pub item_id: i64,
    pub item_type: WorkItemType,
    pub company_id: i64,
    pub from: WorkItemStatus,
    pub to: WorkItemStatus,
    pub actor_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub metadata: Value,
}

impl TransitionEvent {
    /// Lifecycle event name, e.g. `maintenance_request.completed`
    pub fn event_name(&self) -> String {
        format!("{}.{}", self.item_type, self.to)
    }
}
