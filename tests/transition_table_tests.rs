//! Exhaustive checks of the status graphs, once per entity type.

use assignment_core::models::WorkItemType;
use assignment_core::state_machine::{TransitionTable, WorkItemStatus};
use std::collections::HashSet;

fn edges(item_type: WorkItemType, expected: &[(&str, &str)]) {
    let allowed: HashSet<(&str, &str)> = expected.iter().copied().collect();
    let statuses = TransitionTable::statuses(item_type);

    for from in &statuses {
        for to in &statuses {
            let pair = (from.as_str(), to.as_str());
            assert_eq!(
                TransitionTable::can_transition(item_type, pair.0, pair.1),
                allowed.contains(&pair),
                "{item_type}: {} -> {}",
                pair.0,
                pair.1
            );
        }
    }

    assert_eq!(TransitionTable::edges(item_type).len(), allowed.len());
}

#[test]
fn task_shaped_graphs() {
    for (item_type, initial) in [
        (WorkItemType::Task, "pending"),
        (WorkItemType::MaintenanceRequest, "submitted"),
        (WorkItemType::WorkOrder, "created"),
    ] {
        edges(
            item_type,
            &[
                (initial, "assigned"),
                (initial, "cancelled"),
                ("assigned", "in_progress"),
                ("assigned", "cancelled"),
                ("in_progress", "completed"),
                ("in_progress", "cancelled"),
            ],
        );
        assert_eq!(WorkItemStatus::initial(item_type).as_str(), initial);
        assert_eq!(
            WorkItemStatus::assigned(item_type).map(|s| s.as_str()),
            Some("assigned")
        );
    }
}

#[test]
fn lease_graph() {
    edges(
        WorkItemType::Lease,
        &[
            ("draft", "pending_signature"),
            ("pending_signature", "active"),
            ("active", "expired"),
            ("active", "terminated"),
            ("active", "renewed"),
        ],
    );
}

#[test]
fn invoice_graph() {
    edges(
        WorkItemType::Invoice,
        &[
            ("pending", "sent"),
            ("sent", "viewed"),
            ("viewed", "paid"),
            ("viewed", "overdue"),
            ("viewed", "cancelled"),
            ("overdue", "paid"),
            ("overdue", "cancelled"),
        ],
    );
}

#[test]
fn application_graph() {
    edges(
        WorkItemType::Application,
        &[
            ("submitted", "under_review"),
            ("under_review", "approved"),
            ("under_review", "rejected"),
            ("under_review", "withdrawn"),
        ],
    );
}

#[test]
fn terminal_statuses_have_no_exits() {
    let expected = [
        (WorkItemType::Task, vec!["completed", "cancelled"]),
        (WorkItemType::MaintenanceRequest, vec!["completed", "cancelled"]),
        (WorkItemType::WorkOrder, vec!["completed", "cancelled"]),
        (WorkItemType::Lease, vec!["expired", "terminated", "renewed"]),
        (WorkItemType::Invoice, vec!["paid", "cancelled"]),
        (WorkItemType::Application, vec!["approved", "rejected", "withdrawn"]),
    ];

    for (item_type, terminals) in expected {
        let found: HashSet<&str> = TransitionTable::terminal_statuses(item_type)
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(found, terminals.iter().copied().collect::<HashSet<_>>());

        for terminal in &terminals {
            for to in TransitionTable::statuses(item_type) {
                assert!(!TransitionTable::can_transition(item_type, terminal, to.as_str()));
            }
        }
    }
}

#[test]
fn unknown_and_foreign_statuses_are_never_reachable() {
    assert!(!TransitionTable::can_transition(WorkItemType::Task, "pending", "done"));
    assert!(!TransitionTable::can_transition(WorkItemType::Task, "draft", "pending_signature"));
    assert!(!TransitionTable::can_transition(WorkItemType::Invoice, "pending", "assigned"));
}
