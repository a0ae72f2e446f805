//! Shared fixtures: an orchestrator wired to an in-memory store, a manual
//! clock and collecting notification/audit recorders.

#![allow(dead_code)]

use assignment_core::config::AssignmentConfig;
use assignment_core::events::CollectingRecorder;
use assignment_core::models::{
    AssignmentRule, AssignmentType, User, WorkItem, WorkItemDraft, WorkItemType,
};
use assignment_core::orchestration::{AssignmentOrchestrator, Clock, ManualClock};
use assignment_core::persistence::InMemoryAssignmentStore;
use assignment_core::state_machine::WorkItemStatus;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub const COMPANY_ID: i64 = 7;
pub const OTHER_COMPANY_ID: i64 = 8;
pub const MANAGER_ID: i64 = 100;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

pub struct TestEngine {
    pub store: Arc<InMemoryAssignmentStore>,
    pub clock: Arc<ManualClock>,
    pub notifications: CollectingRecorder,
    pub audit: CollectingRecorder,
    pub orchestrator: AssignmentOrchestrator,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AssignmentConfig) -> Self {
        let store = Arc::new(InMemoryAssignmentStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let notifications = CollectingRecorder::new();
        let audit = CollectingRecorder::new();
        let orchestrator = AssignmentOrchestrator::new(store.clone(), &config)
            .with_clock(clock.clone())
            .with_notifier(Arc::new(notifications.clone()))
            .with_auditor(Arc::new(audit.clone()));
        store.add_user(User::new(MANAGER_ID, COMPANY_ID, &["property_manager"]));

        Self {
            store,
            clock,
            notifications,
            audit,
            orchestrator,
        }
    }

    pub fn add_user(&self, id: i64, roles: &[&str]) {
        self.store.add_user(User::new(id, COMPANY_ID, roles));
    }

    pub fn add_rule(&self, rule: AssignmentRule) {
        self.store.add_rule(rule);
    }

    /// Store an item directly, bypassing assignment
    pub fn seed_item(&self, id: i64, draft: WorkItemDraft) -> WorkItem {
        let item = WorkItem::from_draft(id, draft, self.clock.now());
        self.store.put_work_item(item.clone());
        item
    }

    /// Store an item already sitting in `status`, owned by `assignee`
    pub fn seed_item_in(
        &self,
        id: i64,
        item_type: WorkItemType,
        status: &str,
        assignee: Option<i64>,
    ) -> WorkItem {
        let mut draft = WorkItemDraft::new(item_type, COMPANY_ID, format!("Item {id}"));
        if let Some(assignee) = assignee {
            draft = draft.with_assignee(assignee);
        }
        let mut item = WorkItem::from_draft(id, draft, self.clock.now());
        item.status = WorkItemStatus::parse(item_type, status).unwrap();
        self.store.put_work_item(item.clone());
        item
    }
}

pub fn test_config() -> AssignmentConfig {
    let mut config = AssignmentConfig::default();
    config.engine.rng_seed = Some(42);
    config
}

pub fn rule(id: i64, item_type: WorkItemType, assignment_type: AssignmentType) -> AssignmentRule {
    AssignmentRule::new(id, COMPANY_ID, item_type, assignment_type)
}
