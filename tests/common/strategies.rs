//! Proptest strategies for candidate pools

#![allow(dead_code)]

use assignment_core::models::User;
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::HashMap;

/// 1..=12 distinct active users of one company holding `role`
pub fn candidate_pool_strategy(role: &'static str) -> impl Strategy<Value = Vec<User>> {
    btree_set(1i64..10_000, 1..=12).prop_map(move |ids| {
        ids.into_iter()
            .map(|id| User::new(id, 1, &[role]))
            .collect()
    })
}

/// A pool plus an open-item count for some (not necessarily all) of its users
pub fn pool_with_counts_strategy() -> impl Strategy<Value = (Vec<User>, HashMap<i64, i64>)> {
    candidate_pool_strategy("maintenance_tech").prop_flat_map(|pool| {
        let len = pool.len();
        (
            Just(pool),
            vec(proptest::option::of(0i64..50), len),
        )
            .prop_map(|(pool, counts)| {
                let counts = pool
                    .iter()
                    .zip(counts)
                    .filter_map(|(user, count)| count.map(|c| (user.id, c)))
                    .collect();
                (pool, counts)
            })
    })
}
