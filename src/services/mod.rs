//! Assignment services: rule evaluation, candidate selection, workload
//! counting and maintenance priority defaults.

pub mod criteria;
pub mod priority;
pub mod rule_engine;
pub mod strategy_resolver;
pub mod workload_tracker;

pub use criteria::{CriteriaMatcher, JsonCriteriaMatcher};
pub use priority::PriorityDeriver;
pub use rule_engine::{AssignmentRuleEngine, RuleMatch};
pub use strategy_resolver::{
    pick_least_loaded, pick_random, pick_round_robin, AssignmentStrategyResolver,
};
pub use workload_tracker::WorkloadTracker;
