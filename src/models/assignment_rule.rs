//! # Assignment Rule Model
//!
//! Administrator-configured policies that pick an assignee for new work items.
//! Rules are stored as raw rows; `assignment_type` stays text so a row with an
//! unknown type can still be loaded and reported instead of failing the whole
//! query. [`AssignmentRule::strategy`] turns a row into a typed
//! [`AssignmentStrategy`] or a [`RuleConfigurationError`].

use super::WorkItemType;
use crate::error::RuleConfigurationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Selection algorithm named by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    RoleBased,
    UserSpecific,
    RoundRobin,
    WorkloadBased,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleBased => "role_based",
            Self::UserSpecific => "user_specific",
            Self::RoundRobin => "round_robin",
            Self::WorkloadBased => "workload_based",
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role_based" => Ok(Self::RoleBased),
            "user_specific" => Ok(Self::UserSpecific),
            "round_robin" => Ok(Self::RoundRobin),
            "workload_based" => Ok(Self::WorkloadBased),
            _ => Err(format!("Invalid assignment type: {s}")),
        }
    }
}

/// A validated rule, ready for the strategy resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentStrategy {
    RoleBased { role: String },
    UserSpecific { user_id: i64 },
    RoundRobin { role: String },
    WorkloadBased { role: String },
}

impl AssignmentStrategy {
    pub fn assignment_type(&self) -> AssignmentType {
        match self {
            Self::RoleBased { .. } => AssignmentType::RoleBased,
            Self::UserSpecific { .. } => AssignmentType::UserSpecific,
            Self::RoundRobin { .. } => AssignmentType::RoundRobin,
            Self::WorkloadBased { .. } => AssignmentType::WorkloadBased,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRule {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub work_item_type: WorkItemType,
    pub assignment_type: String,
    /// Matcher over item attributes; interpreted by a `CriteriaMatcher`
    pub criteria: serde_json::Value,
    pub target_role: Option<String>,
    pub target_user_id: Option<i64>,
    /// Higher values are evaluated first
    pub priority: i32,
    pub is_active: bool,
}

impl AssignmentRule {
    pub fn new(
        id: i64,
        company_id: i64,
        work_item_type: WorkItemType,
        assignment_type: AssignmentType,
    ) -> Self {
        Self {
            id,
            company_id,
            name: format!("{assignment_type} rule {id}"),
            work_item_type,
            assignment_type: assignment_type.to_string(),
            criteria: serde_json::json!({}),
            target_role: None,
            target_user_id: None,
            priority: 1,
            is_active: true,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = Some(role.into());
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.target_user_id = Some(user_id);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_criteria(mut self, criteria: serde_json::Value) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Parse the raw row into a strategy
    pub fn strategy(&self) -> Result<AssignmentStrategy, RuleConfigurationError> {
        let assignment_type: AssignmentType = self.assignment_type.parse().map_err(|_| {
            RuleConfigurationError::UnknownAssignmentType {
                rule_id: self.id,
                assignment_type: self.assignment_type.clone(),
            }
        })?;

        let role = || {
            self.target_role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .ok_or_else(|| RuleConfigurationError::MissingTargetRole {
                    rule_id: self.id,
                    assignment_type: assignment_type.to_string(),
                })
        };

        match assignment_type {
            AssignmentType::RoleBased => Ok(AssignmentStrategy::RoleBased { role: role()? }),
            AssignmentType::RoundRobin => Ok(AssignmentStrategy::RoundRobin { role: role()? }),
            AssignmentType::WorkloadBased => {
                Ok(AssignmentStrategy::WorkloadBased { role: role()? })
            }
            AssignmentType::UserSpecific => self
                .target_user_id
                .map(|user_id| AssignmentStrategy::UserSpecific { user_id })
                .ok_or(RuleConfigurationError::MissingTargetUser { rule_id: self.id }),
        }
    }

    /// Evaluation order: priority descending, then id ascending
    pub fn evaluation_order(a: &Self, b: &Self) -> Ordering {
        b.priority.cmp(&a.priority).then(a.id.cmp(&b.id))
    }
}
