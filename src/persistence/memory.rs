//! In-memory [`AssignmentStore`] for tests and embedding.
//!
//! Items and records live behind one `parking_lot` mutex so a commit is
//! atomic; users and rules are read-mostly and sit in `DashMap`s.

use super::{AssignmentStore, CommitResult, WorkItemCommit};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    AssignmentRecord, AssignmentRule, AssignmentStatus, User, WorkItem, WorkItemDraft,
    WorkItemType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    items: BTreeMap<i64, WorkItem>,
    records: BTreeMap<i64, AssignmentRecord>,
    next_item_id: i64,
    next_record_id: i64,
}

impl Tables {
    fn next_item_id(&mut self) -> i64 {
        self.next_item_id += 1;
        self.next_item_id
    }

    fn next_record_id(&mut self) -> i64 {
        self.next_record_id += 1;
        self.next_record_id
    }

    fn active_record_id(&self, work_item_id: i64) -> Option<i64> {
        self.records
            .values()
            .find(|r| r.work_item_id == work_item_id && r.status == AssignmentStatus::Active)
            .map(|r| r.id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    tables: Mutex<Tables>,
    users: DashMap<i64, User>,
    rules: DashMap<i64, AssignmentRule>,
    rule_queries: AtomicUsize,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_rule(&self, rule: AssignmentRule) {
        self.rules.insert(rule.id, rule);
    }

    /// Store an item exactly as given, keeping its id, status and version
    pub fn put_work_item(&self, item: WorkItem) {
        let mut tables = self.tables.lock();
        tables.next_item_id = tables.next_item_id.max(item.id);
        tables.items.insert(item.id, item);
    }

    /// Store a historical record as given
    pub fn put_assignment_record(&self, record: AssignmentRecord) {
        let mut tables = self.tables.lock();
        tables.next_record_id = tables.next_record_id.max(record.id);
        tables.records.insert(record.id, record);
    }

    /// Number of rule lookups served so far
    pub fn rule_query_count(&self) -> usize {
        self.rule_queries.load(Ordering::SeqCst)
    }

    pub fn work_items(&self) -> Vec<WorkItem> {
        self.tables.lock().items.values().cloned().collect()
    }

    pub fn assignment_records(&self) -> Vec<AssignmentRecord> {
        self.tables.lock().records.values().cloned().collect()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn load_work_item(&self, id: i64) -> StoreResult<Option<WorkItem>> {
        Ok(self.tables.lock().items.get(&id).cloned())
    }

    async fn insert_work_item(
        &self,
        draft: WorkItemDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<WorkItem> {
        let mut tables = self.tables.lock();
        let id = tables.next_item_id();
        let item = WorkItem::from_draft(id, draft, now);
        tables.items.insert(id, item.clone());
        Ok(item)
    }

    async fn commit(&self, commit: WorkItemCommit) -> StoreResult<CommitResult> {
        let WorkItemCommit {
            mut item,
            expected_version,
            new_record,
            close_active,
        } = commit;

        let mut tables = self.tables.lock();

        let actual = tables
            .items
            .get(&item.id)
            .map(|stored| stored.version)
            .ok_or(StoreError::NotFound(item.id))?;
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                item_id: item.id,
                expected: expected_version,
                actual,
            });
        }

        // Everything below is infallible, so the commit cannot half-apply
        item.version = actual + 1;
        tables.items.insert(item.id, item.clone());

        let mut superseded = None;
        let mut record = None;
        if let Some(new_record) = new_record {
            let previous_id = tables.active_record_id(item.id);
            if let Some(previous) = previous_id.and_then(|id| tables.records.get_mut(&id)) {
                previous.status = AssignmentStatus::Reassigned;
                superseded = Some(previous.clone());
            }
            let id = tables.next_record_id();
            let created = new_record.into_record(id, previous_id);
            tables.records.insert(id, created.clone());
            record = Some(created);
        }

        let mut closed = None;
        if let Some(status) = close_active {
            let active_id = tables.active_record_id(item.id);
            if let Some(active) = active_id.and_then(|id| tables.records.get_mut(&id)) {
                active.status = status;
                closed = Some(active.clone());
            }
        }

        // Record snapshot taken before closing may be stale
        if let (Some(created), Some(closed)) = (record.as_mut(), closed.as_ref()) {
            if created.id == closed.id {
                created.status = closed.status;
            }
        }

        debug!(
            item_id = item.id,
            version = item.version,
            new_record = record.as_ref().map(|r| r.id),
            "In-memory commit applied"
        );

        Ok(CommitResult {
            item,
            record,
            superseded,
            closed,
        })
    }

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|user| user.clone()))
    }

    async fn query_active_users_by_role(
        &self,
        role: &str,
        company_id: i64,
    ) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|entry| entry.is_eligible(role, company_id))
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn query_assignment_rules(
        &self,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<Vec<AssignmentRule>> {
        self.rule_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rules
            .iter()
            .filter(|rule| {
                rule.is_active && rule.company_id == company_id && rule.work_item_type == item_type
            })
            .map(|rule| rule.value().clone())
            .collect())
    }

    async fn query_assignment_history(
        &self,
        user_id: i64,
        item_type: WorkItemType,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        Ok(self
            .tables
            .lock()
            .records
            .values()
            .filter(|r| r.assignee_id == user_id && r.work_item_type == item_type)
            .cloned()
            .collect())
    }

    async fn count_active_items(
        &self,
        user_id: i64,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<i64> {
        let count = self
            .tables
            .lock()
            .items
            .values()
            .filter(|item| {
                item.company_id == company_id
                    && item.item_type() == item_type
                    && item.is_active_for(user_id)
            })
            .count();
        Ok(count as i64)
    }

    async fn count_active_items_batch(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<HashMap<i64, i64>> {
        let tables = self.tables.lock();
        let mut counts: HashMap<i64, i64> = user_ids.iter().map(|&id| (id, 0)).collect();
        for item in tables
            .items
            .values()
            .filter(|item| item.company_id == company_id && item.item_type() == item_type)
            .filter(|item| !item.is_terminal())
        {
            if let Some(count) = item.assigned_to_id.and_then(|id| counts.get_mut(&id)) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    async fn active_assignment(&self, work_item_id: i64) -> StoreResult<Option<AssignmentRecord>> {
        let tables = self.tables.lock();
        Ok(tables
            .active_record_id(work_item_id)
            .and_then(|id| tables.records.get(&id).cloned()))
    }

    async fn assignment_history_for_item(
        &self,
        work_item_id: i64,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        let mut history: Vec<AssignmentRecord> = self
            .tables
            .lock()
            .records
            .values()
            .filter(|r| r.work_item_id == work_item_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| (r.assigned_at, r.id));
        Ok(history)
    }

    async fn assignments_since(
        &self,
        company_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        Ok(self
            .tables
            .lock()
            .records
            .values()
            .filter(|r| r.company_id == company_id && r.assigned_at >= since)
            .cloned()
            .collect())
    }
}
