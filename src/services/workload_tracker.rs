use crate::error::Result;
use crate::models::WorkItemType;
use crate::persistence::AssignmentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Live count of a user's open work items
///
/// Counts are read from the store on every call and never cached. Two
/// resolutions racing for the same pool may both see the same minimum; that
/// skew is accepted.
#[derive(Clone)]
pub struct WorkloadTracker {
    store: Arc<dyn AssignmentStore>,
}

impl WorkloadTracker {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn active_count(
        &self,
        user_id: i64,
        item_type: WorkItemType,
        company_id: i64,
    ) -> Result<i64> {
        Ok(self
            .store
            .count_active_items(user_id, item_type, company_id)
            .await?)
    }

    /// One batched query for a whole pool; users with no items map to 0
    pub async fn active_counts(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
        company_id: i64,
    ) -> Result<HashMap<i64, i64>> {
        let mut counts = self
            .store
            .count_active_items_batch(user_ids, item_type, company_id)
            .await?;
        for user_id in user_ids {
            counts.entry(*user_id).or_insert(0);
        }

        debug!(
            item_type = %item_type,
            company_id = company_id,
            candidates = user_ids.len(),
            "Workload counts loaded"
        );
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkItemDraft;
    use crate::persistence::InMemoryAssignmentStore;
    use crate::state_machine::{MaintenanceStatus, WorkItemStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_terminal_items_do_not_count() {
        let store = Arc::new(InMemoryAssignmentStore::new());
        let now = Utc::now();
        for title in ["Leak", "Heater", "Window"] {
            store
                .insert_work_item(
                    WorkItemDraft::new(WorkItemType::MaintenanceRequest, 1, title).with_assignee(4),
                    now,
                )
                .await
                .unwrap();
        }
        let mut done = store.load_work_item(3).await.unwrap().unwrap();
        done.status = WorkItemStatus::MaintenanceRequest(MaintenanceStatus::Completed);
        store.put_work_item(done);

        let tracker = WorkloadTracker::new(store);
        assert_eq!(
            tracker
                .active_count(4, WorkItemType::MaintenanceRequest, 1)
                .await
                .unwrap(),
            2
        );

        let counts = tracker
            .active_counts(&[4, 5], WorkItemType::MaintenanceRequest, 1)
            .await
            .unwrap();
        assert_eq!(counts[&4], 2);
        assert_eq!(counts[&5], 0);
        assert_eq!(
            tracker.active_count(4, WorkItemType::Task, 1).await.unwrap(),
            0
        );
    }
}
