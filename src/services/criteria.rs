//! Rule criteria matching.
//!
//! A rule's `criteria` column is opaque JSON to the store. The default matcher
//! understands four keys, all optional and all required to match when present:
//!
//! | key          | value             | matches when                          |
//! |--------------|-------------------|---------------------------------------|
//! | `category`   | string            | item category equals it, any case     |
//! | `categories` | array of strings  | item category is one of them, any case|
//! | `priority`   | string            | item priority equals it               |
//! | `priorities` | array of strings  | item priority is one of them          |
//!
//! Unknown keys are ignored. `null` and `{}` match every item.

use crate::models::{Priority, WorkItem};
use serde_json::Value;

pub trait CriteriaMatcher: Send + Sync {
    fn matches(&self, criteria: &Value, item: &WorkItem) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCriteriaMatcher;

impl JsonCriteriaMatcher {
    fn string_list(value: &Value) -> Vec<&str> {
        match value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn category_matches(allowed: &Value, item: &WorkItem) -> bool {
        let Some(category) = item.category.as_deref() else {
            return false;
        };
        Self::string_list(allowed)
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(category))
    }

    fn priority_matches(allowed: &Value, item: &WorkItem) -> bool {
        Self::string_list(allowed)
            .iter()
            .filter_map(|candidate| candidate.parse::<Priority>().ok())
            .any(|priority| priority == item.priority)
    }
}

impl CriteriaMatcher for JsonCriteriaMatcher {
    fn matches(&self, criteria: &Value, item: &WorkItem) -> bool {
        let map = match criteria {
            Value::Null => return true,
            Value::Object(map) => map,
            // Anything else is a malformed rule; never let it catch every item
            _ => return false,
        };

        map.iter().all(|(key, allowed)| match key.as_str() {
            "category" | "categories" => Self::category_matches(allowed, item),
            "priority" | "priorities" => Self::priority_matches(allowed, item),
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WorkItemDraft, WorkItemType};
    use chrono::Utc;
    use serde_json::json;

    fn request(category: Option<&str>, priority: Priority) -> WorkItem {
        let mut draft =
            WorkItemDraft::new(WorkItemType::MaintenanceRequest, 1, "Drip").with_priority(priority);
        if let Some(category) = category {
            draft = draft.with_category(category);
        }
        WorkItem::from_draft(1, draft, Utc::now())
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let matcher = JsonCriteriaMatcher;
        let item = request(None, Priority::Low);
        assert!(matcher.matches(&json!({}), &item));
        assert!(matcher.matches(&Value::Null, &item));
        assert!(matcher.matches(&json!({"building": "north"}), &item));
    }

    #[test]
    fn test_category_is_case_insensitive() {
        let matcher = JsonCriteriaMatcher;
        let item = request(Some("Plumbing"), Priority::High);
        assert!(matcher.matches(&json!({"category": "plumbing"}), &item));
        assert!(matcher.matches(&json!({"categories": ["electrical", "PLUMBING"]}), &item));
        assert!(!matcher.matches(&json!({"category": "heating"}), &item));
        assert!(!matcher.matches(&json!({"category": "plumbing"}), &request(None, Priority::High)));
    }

    #[test]
    fn test_all_keys_must_match() {
        let matcher = JsonCriteriaMatcher;
        let item = request(Some("plumbing"), Priority::Medium);
        assert!(matcher.matches(&json!({"category": "plumbing", "priority": "normal"}), &item));
        assert!(!matcher.matches(&json!({"category": "plumbing", "priorities": ["high", "urgent"]}), &item));
        assert!(!matcher.matches(&json!(["plumbing"]), &item));
    }
}
