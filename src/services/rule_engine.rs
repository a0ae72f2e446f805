use super::criteria::{CriteriaMatcher, JsonCriteriaMatcher};
use super::strategy_resolver::AssignmentStrategyResolver;
use crate::error::Result;
use crate::models::{AssignmentRule, WorkItem};
use crate::persistence::AssignmentStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// The rule that produced an assignee
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub assignee_id: i64,
    pub rule: AssignmentRule,
}

/// Walks a company's active rules for a work-item type, highest priority
/// first, and returns the first one whose strategy yields a candidate.
///
/// Malformed rules and rules whose criteria do not match the item are skipped.
pub struct AssignmentRuleEngine {
    store: Arc<dyn AssignmentStore>,
    resolver: AssignmentStrategyResolver,
    matcher: Arc<dyn CriteriaMatcher>,
}

impl AssignmentRuleEngine {
    pub fn new(store: Arc<dyn AssignmentStore>, resolver: AssignmentStrategyResolver) -> Self {
        Self::with_matcher(store, resolver, Arc::new(JsonCriteriaMatcher))
    }

    pub fn with_matcher(
        store: Arc<dyn AssignmentStore>,
        resolver: AssignmentStrategyResolver,
        matcher: Arc<dyn CriteriaMatcher>,
    ) -> Self {
        Self {
            store,
            resolver,
            matcher,
        }
    }

    pub fn resolver(&self) -> &AssignmentStrategyResolver {
        &self.resolver
    }

    pub async fn find_assignee(&self, item: &WorkItem) -> Result<Option<RuleMatch>> {
        let mut rules = self
            .store
            .query_assignment_rules(item.item_type(), item.company_id)
            .await?;
        rules.retain(|rule| rule.is_active);
        rules.sort_by(AssignmentRule::evaluation_order);

        debug!(
            item_id = item.id,
            item_type = %item.item_type(),
            company_id = item.company_id,
            rule_count = rules.len(),
            "Evaluating assignment rules"
        );

        for rule in rules {
            let strategy = match rule.strategy() {
                Ok(strategy) => strategy,
                Err(err) => {
                    warn!(
                        rule_id = rule.id,
                        rule_name = %rule.name,
                        error = %err,
                        "⚠️ Skipping misconfigured assignment rule"
                    );
                    continue;
                }
            };

            if !self.matcher.matches(&rule.criteria, item) {
                debug!(rule_id = rule.id, item_id = item.id, "Rule criteria did not match");
                continue;
            }

            if let Some(assignee_id) = self
                .resolver
                .resolve_strategy(&strategy, rule.company_id, item.item_type())
                .await?
            {
                debug!(
                    rule_id = rule.id,
                    item_id = item.id,
                    assignee_id = assignee_id,
                    "Rule produced assignee"
                );
                return Ok(Some(RuleMatch { assignee_id, rule }));
            }

            debug!(rule_id = rule.id, item_id = item.id, "Rule produced no candidate");
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentType, User, WorkItemDraft, WorkItemType};
    use crate::persistence::InMemoryAssignmentStore;
    use chrono::Utc;
    use serde_json::json;

    fn engine(store: Arc<InMemoryAssignmentStore>) -> AssignmentRuleEngine {
        let store: Arc<dyn AssignmentStore> = store;
        AssignmentRuleEngine::new(
            store.clone(),
            AssignmentStrategyResolver::new(store, Some(11)),
        )
    }

    fn plumbing_request() -> WorkItem {
        WorkItem::from_draft(
            1,
            WorkItemDraft::new(WorkItemType::MaintenanceRequest, 1, "Burst pipe")
                .with_category("plumbing"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_misconfigured_and_unmatched_rules_are_skipped() {
        let store = Arc::new(InMemoryAssignmentStore::new());
        store.add_user(User::new(20, 1, &["maintenance_tech"]));
        store.add_user(User::new(30, 1, &["electrician"]));

        let mut broken = AssignmentRule::new(1, 1, WorkItemType::MaintenanceRequest, AssignmentType::RoleBased)
            .with_priority(100);
        broken.assignment_type = "coin_flip".to_string();
        store.add_rule(broken);
        store.add_rule(
            AssignmentRule::new(2, 1, WorkItemType::MaintenanceRequest, AssignmentType::RoleBased)
                .with_role("electrician")
                .with_criteria(json!({"category": "electrical"}))
                .with_priority(50),
        );
        store.add_rule(
            AssignmentRule::new(3, 1, WorkItemType::MaintenanceRequest, AssignmentType::WorkloadBased)
                .with_role("maintenance_tech")
                .with_priority(10),
        );

        let found = engine(store).find_assignee(&plumbing_request()).await.unwrap().unwrap();
        assert_eq!(found.assignee_id, 20);
        assert_eq!(found.rule.id, 3);
    }

    #[tokio::test]
    async fn test_higher_priority_rule_wins_and_empty_pool_falls_through() {
        let store = Arc::new(InMemoryAssignmentStore::new());
        store.add_user(User::new(40, 1, &["supervisor"]));
        store.add_user(User::new(41, 1, &[]).inactive());

        store.add_rule(
            AssignmentRule::new(5, 1, WorkItemType::MaintenanceRequest, AssignmentType::RoleBased)
                .with_role("vendor_coordinator")
                .with_priority(90),
        );
        store.add_rule(
            AssignmentRule::new(6, 1, WorkItemType::MaintenanceRequest, AssignmentType::UserSpecific)
                .with_user(41)
                .with_priority(80),
        );
        store.add_rule(
            AssignmentRule::new(7, 1, WorkItemType::MaintenanceRequest, AssignmentType::UserSpecific)
                .with_user(40)
                .with_priority(70),
        );
        store.add_rule(
            AssignmentRule::new(8, 1, WorkItemType::MaintenanceRequest, AssignmentType::RoleBased)
                .with_role("supervisor")
                .with_priority(70)
                .deactivated(),
        );

        let found = engine(store).find_assignee(&plumbing_request()).await.unwrap().unwrap();
        assert_eq!(found.rule.id, 7);
        assert_eq!(found.assignee_id, 40);
    }

    #[tokio::test]
    async fn test_user_specific_rule_ignores_other_company_user() {
        let store = Arc::new(InMemoryAssignmentStore::new());
        store.add_user(User::new(50, 2, &["maintenance_tech"]));
        store.add_user(User::new(51, 1, &["maintenance_tech"]));

        store.add_rule(
            AssignmentRule::new(9, 1, WorkItemType::MaintenanceRequest, AssignmentType::UserSpecific)
                .with_user(50)
                .with_priority(90),
        );
        let engine = engine(store.clone());
        assert!(engine
            .find_assignee(&plumbing_request())
            .await
            .unwrap()
            .is_none());

        store.add_rule(
            AssignmentRule::new(10, 1, WorkItemType::MaintenanceRequest, AssignmentType::UserSpecific)
                .with_user(51)
                .with_priority(10),
        );
        let found = engine.find_assignee(&plumbing_request()).await.unwrap().unwrap();
        assert_eq!(found.rule.id, 10);
        assert_eq!(found.assignee_id, 51);
    }

    #[tokio::test]
    async fn test_no_rules_yields_none() {
        let store = Arc::new(InMemoryAssignmentStore::new());
        assert!(engine(store)
            .find_assignee(&plumbing_request())
            .await
            .unwrap()
            .is_none());
    }
}
