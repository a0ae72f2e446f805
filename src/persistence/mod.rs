//! # Assignment Persistence
//!
//! The narrow storage interface the engine runs against. Everything the
//! strategies, the rule engine and the orchestrator read or write goes through
//! [`AssignmentStore`]; the engine never sees SQL.
//!
//! ## Atomic Commits
//!
//! Every write to a work item is a [`WorkItemCommit`]: the new item state, an
//! optional new assignment record and an optional closing status for the
//! active record. A store applies all of it or none of it, and only if the
//! stored `version` still equals `expected_version`.
//!
//! Implementations:
//! - [`InMemoryAssignmentStore`]: tests and embedding
//! - [`PgAssignmentStore`]: PostgreSQL via sqlx (feature `postgres`)

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use crate::error::StoreResult;
use crate::models::{
    AssignmentRecord, AssignmentRule, AssignmentStatus, NewAssignmentRecord, User, WorkItem,
    WorkItemDraft, WorkItemType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;

pub use memory::InMemoryAssignmentStore;
#[cfg(feature = "postgres")]
pub use postgres::PgAssignmentStore;

/// One atomic write against a single work item
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemCommit {
    /// Desired item state; the store assigns the bumped version
    pub item: WorkItem,
    pub expected_version: i64,
    /// Supersedes the current active record, which becomes `reassigned`
    pub new_record: Option<NewAssignmentRecord>,
    /// Closes whichever record is active once `new_record` has been applied
    pub close_active: Option<AssignmentStatus>,
}

impl WorkItemCommit {
    /// Item-only write guarded by the item's current version
    pub fn item(item: WorkItem) -> Self {
        let expected_version = item.version;
        Self {
            item,
            expected_version,
            new_record: None,
            close_active: None,
        }
    }

    pub fn with_record(mut self, record: NewAssignmentRecord) -> Self {
        self.new_record = Some(record);
        self
    }

    pub fn closing_active(mut self, status: AssignmentStatus) -> Self {
        self.close_active = Some(status);
        self
    }
}

/// What a commit changed
#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    /// Item as stored, carrying its new version
    pub item: WorkItem,
    pub record: Option<AssignmentRecord>,
    /// Prior active record, now `reassigned`
    pub superseded: Option<AssignmentRecord>,
    /// Record closed by `close_active`
    pub closed: Option<AssignmentRecord>,
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn load_work_item(&self, id: i64) -> StoreResult<Option<WorkItem>>;

    /// Persist a new item in its type's initial status with version 1
    async fn insert_work_item(
        &self,
        draft: WorkItemDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<WorkItem>;

    async fn commit(&self, commit: WorkItemCommit) -> StoreResult<CommitResult>;

    async fn save_work_item(&self, item: &WorkItem, expected_version: i64) -> StoreResult<WorkItem> {
        let mut commit = WorkItemCommit::item(item.clone());
        commit.expected_version = expected_version;
        Ok(self.commit(commit).await?.item)
    }

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>>;

    /// Active users of `company_id` holding `role`, ascending id
    async fn query_active_users_by_role(&self, role: &str, company_id: i64)
        -> StoreResult<Vec<User>>;

    /// Active rules for a company and work-item type, unordered
    async fn query_assignment_rules(
        &self,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<Vec<AssignmentRule>>;

    /// Every record for `user_id` on items of `item_type`
    async fn query_assignment_history(
        &self,
        user_id: i64,
        item_type: WorkItemType,
    ) -> StoreResult<Vec<AssignmentRecord>>;

    /// Most recent `assigned_at` per user; users never assigned are absent
    async fn latest_assignment_times(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
    ) -> StoreResult<HashMap<i64, DateTime<Utc>>> {
        let histories = try_join_all(
            user_ids
                .iter()
                .map(|&user_id| self.query_assignment_history(user_id, item_type)),
        )
        .await?;

        Ok(user_ids
            .iter()
            .zip(histories)
            .filter_map(|(&user_id, history)| {
                history
                    .iter()
                    .map(|record| record.assigned_at)
                    .max()
                    .map(|latest| (user_id, latest))
            })
            .collect())
    }

    /// Non-terminal items of the type and company owned by `user_id`
    async fn count_active_items(
        &self,
        user_id: i64,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<i64>;

    /// Batched [`count_active_items`](Self::count_active_items); every user is present
    async fn count_active_items_batch(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<HashMap<i64, i64>> {
        let counts = try_join_all(
            user_ids
                .iter()
                .map(|&user_id| self.count_active_items(user_id, item_type, company_id)),
        )
        .await?;

        Ok(user_ids.iter().copied().zip(counts).collect())
    }

    async fn active_assignment(&self, work_item_id: i64) -> StoreResult<Option<AssignmentRecord>>;

    /// All records for an item, oldest first
    async fn assignment_history_for_item(
        &self,
        work_item_id: i64,
    ) -> StoreResult<Vec<AssignmentRecord>>;

    /// Records of a company assigned at or after `since`
    async fn assignments_since(
        &self,
        company_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<AssignmentRecord>>;
}
