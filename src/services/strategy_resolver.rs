//! # Assignment Strategy Resolver
//!
//! Turns a rule's typed [`AssignmentStrategy`] into a concrete assignee.
//!
//! The selection functions ([`pick_random`], [`pick_round_robin`],
//! [`pick_least_loaded`]) are pure over the candidate pool and whatever the
//! store returned for it, so they are tested without I/O. The resolver only
//! gathers inputs and calls them.
//!
//! | strategy         | pool                              | choice                                      |
//! |------------------|-----------------------------------|---------------------------------------------|
//! | `role_based`     | active users with role in company | uniform random (seedable RNG)               |
//! | `user_specific`  | the target user                   | target if it exists, is active and in company |
//! | `round_robin`    | active users with role in company | oldest latest assignment, never-assigned first, then lowest id |
//! | `workload_based` | active users with role in company | fewest open items, then lowest id           |

use super::workload_tracker::WorkloadTracker;
use crate::error::Result;
use crate::models::{AssignmentRule, AssignmentStrategy, User, WorkItem, WorkItemType};
use crate::persistence::AssignmentStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Uniform choice from the pool
pub fn pick_random<R: Rng + ?Sized>(pool: &[User], rng: &mut R) -> Option<i64> {
    pool.choose(rng).map(|user| user.id)
}

/// Least recently assigned candidate; never-assigned users go first
pub fn pick_round_robin(
    pool: &[User],
    latest_assignments: &HashMap<i64, DateTime<Utc>>,
) -> Option<i64> {
    pool.iter()
        .min_by_key(|user| (latest_assignments.get(&user.id).copied(), user.id))
        .map(|user| user.id)
}

/// Candidate with the fewest open items; missing counts are 0
pub fn pick_least_loaded(pool: &[User], active_counts: &HashMap<i64, i64>) -> Option<i64> {
    pool.iter()
        .min_by_key(|user| (active_counts.get(&user.id).copied().unwrap_or(0), user.id))
        .map(|user| user.id)
}

pub struct AssignmentStrategyResolver {
    store: Arc<dyn AssignmentStore>,
    workload: WorkloadTracker,
    rng: Mutex<StdRng>,
}

impl AssignmentStrategyResolver {
    /// `rng_seed` makes role-based picks reproducible
    pub fn new(store: Arc<dyn AssignmentStore>, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            workload: WorkloadTracker::new(store.clone()),
            store,
            rng: Mutex::new(rng),
        }
    }

    pub fn workload(&self) -> &WorkloadTracker {
        &self.workload
    }

    /// Resolve a rule for an item; fails if the rule itself is malformed
    pub async fn resolve(&self, rule: &AssignmentRule, item: &WorkItem) -> Result<Option<i64>> {
        let strategy = rule.strategy()?;
        self.resolve_strategy(&strategy, rule.company_id, item.item_type())
            .await
    }

    pub async fn resolve_strategy(
        &self,
        strategy: &AssignmentStrategy,
        company_id: i64,
        item_type: WorkItemType,
    ) -> Result<Option<i64>> {
        let selected = match strategy {
            AssignmentStrategy::RoleBased { role } => {
                let pool = self.store.query_active_users_by_role(role, company_id).await?;
                pick_random(&pool, &mut *self.rng.lock())
            }
            AssignmentStrategy::UserSpecific { user_id } => self
                .store
                .find_user(*user_id)
                .await?
                .filter(|user| user.is_active && user.company_id == company_id)
                .map(|user| user.id),
            AssignmentStrategy::RoundRobin { role } => {
                let pool = self.store.query_active_users_by_role(role, company_id).await?;
                if pool.is_empty() {
                    return Ok(None);
                }
                let ids: Vec<i64> = pool.iter().map(|user| user.id).collect();
                let latest = self.store.latest_assignment_times(&ids, item_type).await?;
                pick_round_robin(&pool, &latest)
            }
            AssignmentStrategy::WorkloadBased { role } => {
                let pool = self.store.query_active_users_by_role(role, company_id).await?;
                if pool.is_empty() {
                    return Ok(None);
                }
                let ids: Vec<i64> = pool.iter().map(|user| user.id).collect();
                let counts = self
                    .workload
                    .active_counts(&ids, item_type, company_id)
                    .await?;
                pick_least_loaded(&pool, &counts)
            }
        };

        debug!(
            strategy = %strategy.assignment_type(),
            company_id = company_id,
            item_type = %item_type,
            selected = ?selected,
            "Strategy resolved"
        );
        Ok(selected)
    }
}
