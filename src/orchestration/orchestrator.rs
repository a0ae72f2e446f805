//! # Assignment Orchestrator
//!
//! Public façade of the engine. Every operation follows the same shape:
//!
//! 1. Validate against the caller's snapshot of the item (pure)
//! 2. Write item, assignment record and record supersession in one
//!    [`WorkItemCommit`] guarded by the snapshot's `version`
//! 3. Forward domain events to the notification and audit collaborators
//!
//! Step 3 is best-effort: a failed delivery is logged and the committed result
//! is still returned. A stale snapshot surfaces as
//! [`AssignmentError::ConcurrentModification`] and nothing is written.

use super::automation::{
    AutomationPlanner, AutomationTrigger, MaintenanceSubmission, TriggerReport, TriggeredItem,
};
use super::stats::AssignmentStats;
use crate::config::{AssignmentConfig, ConfigurationError, EngineConfig};
use crate::constants::MAX_STATS_PERIOD_DAYS;
use crate::error::{AssignmentError, Result, StoreError};
use crate::events::{
    AssignmentEvent, AuditRecorder, DomainEvent, EventPublisher, NotificationDispatcher,
    ReassignmentEvent, TracingAuditRecorder, UrgentMaintenanceEvent,
};
use crate::logging::{log_assignment_operation, log_error, log_transition_operation};
use crate::models::{
    AssignmentRecord, AssignmentStatus, NewAssignmentRecord, Priority, WorkItem, WorkItemDraft,
    WorkItemType,
};
use crate::persistence::{AssignmentStore, WorkItemCommit};
use crate::services::{
    AssignmentRuleEngine, AssignmentStrategyResolver, CriteriaMatcher, PriorityDeriver,
};
use crate::state_machine::{
    StatusTransitionValidator, TransitionEffect, TransitionEvent, TransitionMetadata,
    WorkItemStatus,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Source of "now" for timestamps written by the engine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Result of a first assignment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOutcome {
    pub item: WorkItem,
    pub record: AssignmentRecord,
    pub auto_assigned: bool,
    pub rule_id: Option<i64>,
    /// Present when the item moved into its `assigned` status
    pub transition: Option<TransitionEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReassignmentOutcome {
    pub item: WorkItem,
    pub record: AssignmentRecord,
    pub superseded: Option<AssignmentRecord>,
    pub event: ReassignmentEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub item: WorkItem,
    pub event: TransitionEvent,
    /// Active record closed because the item reached a terminal status
    pub closed_record: Option<AssignmentRecord>,
}

/// A freshly inserted item and, if a rule produced one, its assignment
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedWorkItem {
    pub item: WorkItem,
    pub assignment: Option<AssignmentOutcome>,
}

pub struct AssignmentOrchestrator {
    store: Arc<dyn AssignmentStore>,
    rule_engine: AssignmentRuleEngine,
    validator: StatusTransitionValidator,
    planner: AutomationPlanner,
    notifier: Arc<dyn NotificationDispatcher>,
    auditor: Arc<dyn AuditRecorder>,
    clock: Arc<dyn Clock>,
    engine: EngineConfig,
}

impl AssignmentOrchestrator {
    pub fn new(store: Arc<dyn AssignmentStore>, config: &AssignmentConfig) -> Self {
        let resolver = AssignmentStrategyResolver::new(store.clone(), config.engine.rng_seed);
        Self {
            rule_engine: AssignmentRuleEngine::new(store.clone(), resolver),
            validator: StatusTransitionValidator::new(
                config.engine.default_cancellation_reason.clone(),
            ),
            planner: AutomationPlanner::new(
                PriorityDeriver::new(config.sla.clone(), config.maintenance.clone()),
                config.engine.system_user_id,
            ),
            notifier: Arc::new(EventPublisher::new(config.events.channel_capacity)),
            auditor: Arc::new(TracingAuditRecorder),
            clock: Arc::new(SystemClock),
            engine: config.engine.clone(),
            store,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_auditor(mut self, auditor: Arc<dyn AuditRecorder>) -> Self {
        self.auditor = auditor;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_criteria_matcher(mut self, matcher: Arc<dyn CriteriaMatcher>) -> Self {
        let resolver = AssignmentStrategyResolver::new(self.store.clone(), self.engine.rng_seed);
        self.rule_engine = AssignmentRuleEngine::with_matcher(self.store.clone(), resolver, matcher);
        self
    }

    pub fn store(&self) -> &Arc<dyn AssignmentStore> {
        &self.store
    }

    pub fn planner(&self) -> &AutomationPlanner {
        &self.planner
    }

    pub async fn work_item(&self, id: i64) -> Result<WorkItem> {
        self.store
            .load_work_item(id)
            .await?
            .ok_or(AssignmentError::WorkItemNotFound(id))
    }

    /// Give an item its first owner.
    ///
    /// A preset `assigned_to_id` is honored as a manual assignment without
    /// consulting any rule. Otherwise the rule engine picks the assignee, and
    /// [`AssignmentError::NoEligibleAssignee`] leaves the item untouched.
    pub async fn assign_or_create(&self, item: &WorkItem, actor_id: i64) -> Result<AssignmentOutcome> {
        if item.is_terminal() {
            return Err(AssignmentError::InvalidReassignment {
                item_id: item.id,
                reason: format!("work item is already {}", item.status),
            });
        }
        if let Some(active) = self.store.active_assignment(item.id).await? {
            return Err(AssignmentError::InvalidReassignment {
                item_id: item.id,
                reason: format!(
                    "work item already has an active assignment to user {}",
                    active.assignee_id
                ),
            });
        }

        let (assignee_id, rule) = match item.assigned_to_id {
            Some(preset) => (preset, None),
            None => match self.rule_engine.find_assignee(item).await? {
                Some(found) => (found.assignee_id, Some(found.rule)),
                None => {
                    info!(
                        item_id = item.id,
                        item_type = %item.item_type(),
                        company_id = item.company_id,
                        "No assignment rule produced an assignee"
                    );
                    return Err(AssignmentError::NoEligibleAssignee {
                        item_id: item.id,
                        item_type: item.item_type(),
                    });
                }
            },
        };
        let auto_assigned = rule.is_some();
        let rule_id = rule.as_ref().map(|r| r.id);
        let now = self.clock.now();

        let mut owned = item.clone();
        owned.assigned_to_id = Some(assignee_id);
        owned.updated_at = now;
        let (updated, transition) = self.enter_assigned(owned, actor_id, rule_id, now)?;

        let new_record = NewAssignmentRecord {
            work_item_id: item.id,
            work_item_type: item.item_type(),
            company_id: item.company_id,
            assignee_id,
            assigned_by_id: actor_id,
            assigned_at: now,
            auto_assigned,
            reason: rule.as_ref().map(|r| format!("Matched rule: {}", r.name)),
        };

        let result = self
            .store
            .commit(WorkItemCommit::item(updated).with_record(new_record))
            .await?;
        let record = result.record.ok_or_else(missing_record)?;

        log_assignment_operation(
            if auto_assigned { "auto_assign" } else { "manual_assign" },
            item.item_type().as_str(),
            Some(item.id),
            Some(assignee_id),
            "success",
            rule.as_ref().map(|r| r.name.as_str()),
        );

        self.dispatch(AssignmentEvent::from_record(&record, rule_id).into())
            .await;
        if let Some(event) = &transition {
            self.dispatch(event.clone().into()).await;
        }

        Ok(AssignmentOutcome {
            item: result.item,
            record,
            auto_assigned,
            rule_id,
            transition,
        })
    }

    /// Move an owned item into its type's `assigned` status when it is still initial
    fn enter_assigned(
        &self,
        item: WorkItem,
        actor_id: i64,
        rule_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(WorkItem, Option<TransitionEvent>)> {
        match WorkItemStatus::assigned(item.item_type()) {
            Some(assigned) if item.status.is_initial() => {
                let metadata = TransitionMetadata::new().with_extra(json!({
                    "assignment": if rule_id.is_some() { "auto" } else { "manual" },
                    "rule_id": rule_id,
                }));
                let (updated, event) =
                    self.validator
                        .apply_transition(&item, assigned, actor_id, &metadata, now)?;
                Ok((updated, Some(event)))
            }
            // Ownership without a status change
            _ => {
                let mut updated = item;
                updated.assigned_at.get_or_insert(now);
                Ok((updated, None))
            }
        }
    }

    /// Hand an open item to a different active user
    pub async fn reassign(
        &self,
        item: &WorkItem,
        new_assignee_id: i64,
        actor_id: i64,
        reason: Option<String>,
    ) -> Result<ReassignmentOutcome> {
        let reject = |reason: String| AssignmentError::InvalidReassignment {
            item_id: item.id,
            reason,
        };

        if item.is_terminal() {
            return Err(reject(format!("work item is already {}", item.status)));
        }
        if item.assigned_to_id == Some(new_assignee_id) {
            return Err(reject(format!(
                "work item is already assigned to user {new_assignee_id}"
            )));
        }
        match self.store.find_user(new_assignee_id).await? {
            Some(user) if user.is_active && user.company_id == item.company_id => {}
            Some(user) if !user.is_active => {
                return Err(reject(format!("user {new_assignee_id} is inactive")));
            }
            Some(_) => {
                return Err(reject(format!(
                    "user {new_assignee_id} belongs to a different company"
                )));
            }
            None => return Err(reject(format!("user {new_assignee_id} does not exist"))),
        }

        let now = self.clock.now();
        let mut owned = item.clone();
        owned.assigned_to_id = Some(new_assignee_id);
        owned.updated_at = now;
        let (updated, transition) = if item.assigned_to_id.is_none() {
            self.enter_assigned(owned, actor_id, None, now)?
        } else {
            (owned, None)
        };

        let new_record = NewAssignmentRecord {
            work_item_id: item.id,
            work_item_type: item.item_type(),
            company_id: item.company_id,
            assignee_id: new_assignee_id,
            assigned_by_id: actor_id,
            assigned_at: now,
            auto_assigned: false,
            reason: reason.clone(),
        };

        let result = self
            .store
            .commit(WorkItemCommit::item(updated).with_record(new_record))
            .await?;
        let record = result.record.ok_or_else(missing_record)?;

        let event = ReassignmentEvent {
            event_id: Uuid::new_v4(),
            item_id: item.id,
            item_type: item.item_type(),
            company_id: item.company_id,
            previous_assignee_id: item.assigned_to_id,
            new_assignee_id,
            actor_id,
            record_id: record.id,
            previous_record_id: result.superseded.as_ref().map(|r| r.id),
            reason,
            occurred_at: now,
        };

        log_assignment_operation(
            "reassign",
            item.item_type().as_str(),
            Some(item.id),
            Some(new_assignee_id),
            "success",
            event.reason.as_deref(),
        );

        self.dispatch(event.clone().into()).await;
        if let Some(transition) = transition {
            self.dispatch(transition.into()).await;
        }

        Ok(ReassignmentOutcome {
            item: result.item,
            record,
            superseded: result.superseded,
            event,
        })
    }

    /// Change an item's status; terminal statuses close the active assignment
    pub async fn transition(
        &self,
        item: &WorkItem,
        to: WorkItemStatus,
        actor_id: i64,
        metadata: TransitionMetadata,
    ) -> Result<TransitionOutcome> {
        let now = self.clock.now();
        let (updated, event) = self
            .validator
            .apply_transition(item, to, actor_id, &metadata, now)?;

        let mut commit = WorkItemCommit::item(updated);
        if to.is_terminal() {
            commit = commit.closing_active(match to.effect() {
                TransitionEffect::Completed => AssignmentStatus::Completed,
                _ => AssignmentStatus::Cancelled,
            });
        }

        let result = match self.store.commit(commit).await {
            Ok(result) => result,
            Err(err) => {
                let err = AssignmentError::from(err);
                if !err.is_conflict() {
                    log_error(
                        "orchestrator",
                        "transition",
                        &err.to_string(),
                        Some(&format!("item_id={}", item.id)),
                    );
                }
                log_transition_operation(
                    item.item_type().as_str(),
                    item.id,
                    item.status.as_str(),
                    to.as_str(),
                    actor_id,
                    if err.is_conflict() { "conflict" } else { "failed" },
                );
                return Err(err);
            }
        };

        log_transition_operation(
            item.item_type().as_str(),
            item.id,
            item.status.as_str(),
            to.as_str(),
            actor_id,
            "success",
        );

        self.dispatch(event.clone().into()).await;

        Ok(TransitionOutcome {
            item: result.item,
            event,
            closed_record: result.closed,
        })
    }

    pub fn can_transition(&self, item_type: WorkItemType, from: &str, to: &str) -> bool {
        self.validator.can_transition(item_type, from, to)
    }

    /// Every record for an item, oldest first along the supersession chain
    pub async fn assignment_history(&self, work_item_id: i64) -> Result<Vec<AssignmentRecord>> {
        let records = self.store.assignment_history_for_item(work_item_id).await?;
        Ok(order_by_supersession(records))
    }

    /// Insert a draft and auto-assign it; no eligible assignee is not an error here
    pub async fn create_work_item(&self, draft: WorkItemDraft, actor_id: i64) -> Result<CreatedWorkItem> {
        let item = self.store.insert_work_item(draft, self.clock.now()).await?;
        match self.assign_or_create(&item, actor_id).await {
            Ok(outcome) => Ok(CreatedWorkItem {
                item: outcome.item.clone(),
                assignment: Some(outcome),
            }),
            Err(AssignmentError::NoEligibleAssignee { .. }) => Ok(CreatedWorkItem {
                item,
                assignment: None,
            }),
            Err(err) => Err(err),
        }
    }

    /// Create a maintenance request with derived priority and SLA due date
    pub async fn submit_maintenance_request(
        &self,
        company_id: i64,
        submission: &MaintenanceSubmission,
    ) -> Result<CreatedWorkItem> {
        let draft = self
            .planner
            .maintenance_request(company_id, submission, self.clock.now());
        let actor_id = submission
            .requested_by_id
            .unwrap_or(self.engine.system_user_id);
        let created = self.create_work_item(draft, actor_id).await?;
        if created.item.priority == Priority::Emergency {
            self.alert_urgent_maintenance(created.item.id, &created.item)
                .await;
        }
        Ok(created)
    }

    /// Create and auto-assign the follow-up tasks for an automation trigger
    pub async fn execute_trigger(
        &self,
        company_id: i64,
        trigger: &AutomationTrigger,
    ) -> Result<TriggerReport> {
        let drafts = self.planner.plan(company_id, trigger, self.clock.now());
        let mut items = Vec::with_capacity(drafts.len());
        let urgent_request_id = match trigger {
            AutomationTrigger::MaintenanceRequest {
                request_id,
                is_emergency: true,
                ..
            } => Some(*request_id),
            _ => None,
        };

        for draft in drafts {
            let created = self
                .create_work_item(draft, self.engine.system_user_id)
                .await?;
            if let Some(request_id) = urgent_request_id {
                self.alert_urgent_maintenance(request_id, &created.item)
                    .await;
            }
            items.push(TriggeredItem {
                assigned_to_id: created.item.assigned_to_id,
                item: created.item,
            });
        }

        let report = TriggerReport {
            trigger: trigger.name(),
            items,
        };
        info!(
            trigger = report.trigger,
            company_id = company_id,
            created = report.created(),
            assigned = report.assigned(),
            "🤖 AUTOMATION: Trigger executed"
        );
        Ok(report)
    }

    /// Assignment activity over the last `period_days` (configured default when `None`)
    pub async fn assignment_stats(
        &self,
        company_id: i64,
        period_days: Option<i64>,
    ) -> Result<AssignmentStats> {
        let period_days = period_days.unwrap_or(self.engine.stats_period_days);
        let since = (1..=MAX_STATS_PERIOD_DAYS)
            .contains(&period_days)
            .then(|| Duration::try_days(period_days))
            .flatten()
            .and_then(|period| self.clock.now().checked_sub_signed(period))
            .ok_or_else(|| {
                ConfigurationError::invalid_value(
                    "period_days",
                    period_days,
                    format!("must be between 1 and {MAX_STATS_PERIOD_DAYS}"),
                )
            })?;
        let records = self.store.assignments_since(company_id, since).await?;
        Ok(AssignmentStats::from_records(
            company_id,
            period_days,
            since,
            &records,
        ))
    }

    async fn alert_urgent_maintenance(&self, request_id: i64, item: &WorkItem) {
        warn!(
            request_id = request_id,
            item_id = item.id,
            company_id = item.company_id,
            assignee_id = ?item.assigned_to_id,
            "🚨 URGENT: Emergency maintenance request"
        );
        self.dispatch(UrgentMaintenanceEvent::for_item(request_id, item, self.clock.now()).into())
            .await;
    }

    async fn dispatch(&self, event: DomainEvent) {
        if let Err(err) = self.notifier.notify(&event).await {
            warn!(
                event_name = %event.name(),
                item_id = event.item_id(),
                error = %err,
                "⚠️ Notification delivery failed"
            );
        }
        if let Err(err) = self.auditor.record(&event).await {
            warn!(
                event_name = %event.name(),
                item_id = event.item_id(),
                error = %err,
                "⚠️ Audit recording failed"
            );
        }
    }
}

fn missing_record() -> AssignmentError {
    StoreError::CorruptRow {
        table: "assignment_records",
        reason: "commit returned no assignment record".to_string(),
    }
    .into()
}

/// Order records by following `previous_assignment_id` links from the root.
///
/// Input is expected oldest-first; records outside any chain keep that order
/// after the chained ones.
fn order_by_supersession(records: Vec<AssignmentRecord>) -> Vec<AssignmentRecord> {
    let ids: HashSet<i64> = records.iter().map(|r| r.id).collect();
    let mut successor: HashMap<i64, usize> = HashMap::new();
    let mut roots = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match record.previous_assignment_id.filter(|id| ids.contains(id)) {
            Some(previous) => {
                successor.entry(previous).or_insert(index);
            }
            None => roots.push(index),
        }
    }

    let mut placed = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());
    for root in roots {
        let mut cursor = Some(root);
        while let Some(index) = cursor.filter(|&i| !placed[i]) {
            placed[index] = true;
            order.push(index);
            cursor = successor.get(&records[index].id).copied();
        }
    }
    order.extend((0..records.len()).filter(|&i| !placed[i]));

    let mut slots: Vec<Option<AssignmentRecord>> = records.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
