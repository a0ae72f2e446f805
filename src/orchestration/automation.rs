//! # Automation Triggers
//!
//! Back-office events that generate follow-up tasks. The planner is pure: it
//! turns a trigger into work-item drafts with titles, priorities and due dates
//! fixed per trigger. [`AssignmentOrchestrator::execute_trigger`] inserts and
//! auto-assigns them.
//!
//! | trigger               | condition       | task                            | priority | due            |
//! |-----------------------|-----------------|---------------------------------|----------|----------------|
//! | `lease_expiring`      | ≤ 60 days       | Lease Renewal Notice            | high     | +7 days        |
//! |                       | ≤ 30 days       | Schedule Property Inspection    | medium   | +14 days       |
//! | `maintenance_request` | always          | Maintenance: {title}            | derived  | SLA            |
//! | `payment_overdue`     | ≥ 5 days        | Send Payment Reminder           | medium   | +1 day         |
//! |                       | ≥ 15 days       | Late Fee Assessment             | high     | +1 day         |
//! |                       | ≥ 30 days       | Legal Notice Preparation        | high     | +3 days        |
//! | `property_inspection` | always          | Property Inspection - {type}    | medium   | scheduled date |
//! | `tenant_move_in`      | always          | Welcome Package Preparation     | medium   | move-in − 1 day|
//! |                       |                 | Move-in Inspection              | high     | move-in        |
//!
//! [`AssignmentOrchestrator::execute_trigger`]: super::AssignmentOrchestrator::execute_trigger

use crate::models::{Priority, WorkItem, WorkItemDraft, WorkItemType};
use crate::services::PriorityDeriver;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum AutomationTrigger {
    LeaseExpiring {
        lease_id: i64,
        days_until_expiry: i64,
    },
    MaintenanceRequest {
        request_id: i64,
        title: String,
        category: Option<String>,
        #[serde(default)]
        is_emergency: bool,
        priority: Option<Priority>,
    },
    PaymentOverdue {
        tenant_id: i64,
        days_overdue: i64,
        amount: f64,
    },
    PropertyInspection {
        property_id: i64,
        inspection_type: String,
        scheduled_for: DateTime<Utc>,
    },
    TenantMoveIn {
        tenant_id: i64,
        property_id: i64,
        move_in: DateTime<Utc>,
    },
}

impl AutomationTrigger {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeaseExpiring { .. } => "lease_expiring",
            Self::MaintenanceRequest { .. } => "maintenance_request",
            Self::PaymentOverdue { .. } => "payment_overdue",
            Self::PropertyInspection { .. } => "property_inspection",
            Self::TenantMoveIn { .. } => "tenant_move_in",
        }
    }
}

/// A tenant or staff maintenance submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSubmission {
    pub title: String,
    pub category: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
    pub priority: Option<Priority>,
    pub requested_by_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredItem {
    pub item: WorkItem,
    /// `None` when no rule produced an assignee
    pub assigned_to_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerReport {
    pub trigger: &'static str,
    pub items: Vec<TriggeredItem>,
}

impl TriggerReport {
    pub fn created(&self) -> usize {
        self.items.len()
    }

    pub fn assigned(&self) -> usize {
        self.items
            .iter()
            .filter(|triggered| triggered.assigned_to_id.is_some())
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct AutomationPlanner {
    deriver: PriorityDeriver,
    system_user_id: i64,
}

impl AutomationPlanner {
    pub fn new(deriver: PriorityDeriver, system_user_id: i64) -> Self {
        Self {
            deriver,
            system_user_id,
        }
    }

    pub fn deriver(&self) -> &PriorityDeriver {
        &self.deriver
    }

    fn task(
        &self,
        company_id: i64,
        title: impl Into<String>,
        category: &str,
        priority: Priority,
        due: DateTime<Utc>,
        metadata: serde_json::Value,
    ) -> WorkItemDraft {
        WorkItemDraft::new(WorkItemType::Task, company_id, title)
            .with_category(category)
            .with_priority(priority)
            .with_due_date(due)
            .with_creator(self.system_user_id)
            .with_metadata(metadata)
    }

    /// Drafts for a trigger, in creation order; may be empty
    pub fn plan(
        &self,
        company_id: i64,
        trigger: &AutomationTrigger,
        now: DateTime<Utc>,
    ) -> Vec<WorkItemDraft> {
        let mut drafts = Vec::new();

        match trigger {
            AutomationTrigger::LeaseExpiring {
                lease_id,
                days_until_expiry,
            } => {
                if *days_until_expiry <= 60 {
                    drafts.push(self.task(
                        company_id,
                        "Lease Renewal Notice",
                        "lease_management",
                        Priority::High,
                        now + Duration::days(7),
                        json!({
                            "description": format!("Send lease renewal notice for lease {lease_id}"),
                            "lease_id": lease_id,
                        }),
                    ));
                }
                if *days_until_expiry <= 30 {
                    drafts.push(self.task(
                        company_id,
                        "Schedule Property Inspection",
                        "inspection",
                        Priority::Medium,
                        now + Duration::days(14),
                        json!({
                            "description": format!("Schedule move-out inspection for lease {lease_id}"),
                            "lease_id": lease_id,
                        }),
                    ));
                }
            }
            AutomationTrigger::MaintenanceRequest {
                request_id,
                title,
                category,
                is_emergency,
                priority,
            } => {
                let priority = self.deriver.derive_maintenance_priority(
                    *is_emergency,
                    *priority,
                    category.as_deref(),
                );
                drafts.push(self.task(
                    company_id,
                    format!("Maintenance: {title}"),
                    category.as_deref().unwrap_or("maintenance"),
                    priority,
                    self.deriver.sla_due_date(priority, now),
                    json!({
                        "maintenance_request_id": request_id,
                        "is_emergency": is_emergency,
                    }),
                ));
            }
            AutomationTrigger::PaymentOverdue {
                tenant_id,
                days_overdue,
                amount,
            } => {
                if *days_overdue >= 5 {
                    drafts.push(self.task(
                        company_id,
                        "Send Payment Reminder",
                        "payment_collection",
                        Priority::Medium,
                        now + Duration::days(1),
                        json!({
                            "description": format!("Send payment reminder to tenant ({days_overdue} days overdue)"),
                            "tenant_id": tenant_id,
                        }),
                    ));
                }
                if *days_overdue >= 15 {
                    drafts.push(self.task(
                        company_id,
                        "Late Fee Assessment",
                        "financial",
                        Priority::High,
                        now + Duration::days(1),
                        json!({
                            "description": format!("Assess late fees for overdue payment (${amount:.2})"),
                            "tenant_id": tenant_id,
                        }),
                    ));
                }
                if *days_overdue >= 30 {
                    drafts.push(self.task(
                        company_id,
                        "Legal Notice Preparation",
                        "legal",
                        Priority::High,
                        now + Duration::days(3),
                        json!({
                            "description": format!("Prepare legal notice for tenant {tenant_id}"),
                            "tenant_id": tenant_id,
                        }),
                    ));
                }
            }
            AutomationTrigger::PropertyInspection {
                property_id,
                inspection_type,
                scheduled_for,
            } => {
                drafts.push(self.task(
                    company_id,
                    format!("Property Inspection - {inspection_type}"),
                    "inspection",
                    Priority::Medium,
                    *scheduled_for,
                    json!({
                        "description": format!("Conduct {inspection_type} inspection"),
                        "property_id": property_id,
                    }),
                ));
            }
            AutomationTrigger::TenantMoveIn {
                tenant_id,
                property_id,
                move_in,
            } => {
                drafts.push(self.task(
                    company_id,
                    "Welcome Package Preparation",
                    "tenant_services",
                    Priority::Medium,
                    *move_in - Duration::days(1),
                    json!({
                        "description": "Prepare welcome package for new tenant",
                        "tenant_id": tenant_id,
                        "property_id": property_id,
                    }),
                ));
                drafts.push(self.task(
                    company_id,
                    "Move-in Inspection",
                    "inspection",
                    Priority::High,
                    *move_in,
                    json!({
                        "description": "Conduct move-in inspection with tenant",
                        "tenant_id": tenant_id,
                        "property_id": property_id,
                    }),
                ));
            }
        }

        drafts
    }

    /// Draft for a maintenance request with derived priority and SLA due date
    pub fn maintenance_request(
        &self,
        company_id: i64,
        submission: &MaintenanceSubmission,
        now: DateTime<Utc>,
    ) -> WorkItemDraft {
        let priority = self.deriver.derive_maintenance_priority(
            submission.is_emergency,
            submission.priority,
            submission.category.as_deref(),
        );

        let mut draft =
            WorkItemDraft::new(WorkItemType::MaintenanceRequest, company_id, &submission.title)
                .with_priority(priority)
                .with_due_date(self.deriver.sla_due_date(priority, now))
                .with_metadata(json!({ "is_emergency": submission.is_emergency }));
        if let Some(category) = &submission.category {
            draft = draft.with_category(category);
        }
        if let Some(requested_by) = submission.requested_by_id {
            draft = draft.with_creator(requested_by);
        }
        draft
    }
}
