//! PostgreSQL store tests. Need a reachable database in `DATABASE_URL`:
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/assignment_test cargo test --test postgres_store_tests -- --ignored
//! ```

#![cfg(feature = "postgres")]

use assignment_core::config::DatabaseConfig;
use assignment_core::models::{AssignmentStatus, NewAssignmentRecord, WorkItemDraft, WorkItemType};
use assignment_core::persistence::{AssignmentStore, PgAssignmentStore, WorkItemCommit};
use assignment_core::state_machine::{TaskStatus, WorkItemStatus};
use assignment_core::StoreError;
use chrono::Utc;

/// Company id unique to this run so tests do not see each other's rows
fn scratch_company() -> i64 {
    Utc::now().timestamp_micros() % 1_000_000_000
}

async fn store() -> PgAssignmentStore {
    PgAssignmentStore::connect(&DatabaseConfig::default())
        .await
        .expect("DATABASE_URL must point at a test database")
}

async fn insert_user(store: &PgAssignmentStore, company_id: i64, roles: &[&str]) -> i64 {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    sqlx::query_scalar("INSERT INTO users (company_id, roles) VALUES ($1, $2) RETURNING id")
        .bind(company_id)
        .bind(roles)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

fn record_for(item_id: i64, company_id: i64, assignee_id: i64) -> NewAssignmentRecord {
    NewAssignmentRecord {
        work_item_id: item_id,
        work_item_type: WorkItemType::Task,
        company_id,
        assignee_id,
        assigned_by_id: assignee_id,
        assigned_at: Utc::now(),
        auto_assigned: false,
        reason: None,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn commit_supersedes_and_counts_workload() {
    let store = store().await;
    let company_id = scratch_company();
    let first = insert_user(&store, company_id, &["leasing_agent"]).await;
    let second = insert_user(&store, company_id, &["leasing_agent"]).await;

    let item = store
        .insert_work_item(
            WorkItemDraft::new(WorkItemType::Task, company_id, "Schedule viewing"),
            Utc::now(),
        )
        .await
        .unwrap();

    let mut owned = item.clone();
    owned.assigned_to_id = Some(first);
    owned.status = WorkItemStatus::Task(TaskStatus::Assigned);
    let assigned = store
        .commit(WorkItemCommit::item(owned).with_record(record_for(item.id, company_id, first)))
        .await
        .unwrap();
    assert_eq!(assigned.item.version, item.version + 1);
    assert_eq!(
        store.count_active_items(first, WorkItemType::Task, company_id).await.unwrap(),
        1
    );

    let mut handed = assigned.item.clone();
    handed.assigned_to_id = Some(second);
    let handed = store
        .commit(WorkItemCommit::item(handed).with_record(record_for(item.id, company_id, second)))
        .await
        .unwrap();
    assert_eq!(
        handed.superseded.map(|r| r.status),
        Some(AssignmentStatus::Reassigned)
    );

    let counts = store
        .count_active_items_batch(&[first, second], WorkItemType::Task, company_id)
        .await
        .unwrap();
    assert_eq!(counts[&first], 0);
    assert_eq!(counts[&second], 1);

    let history = store.assignment_history_for_item(item.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].previous_assignment_id, Some(history[0].id));

    let pool = store
        .query_active_users_by_role("leasing_agent", company_id)
        .await
        .unwrap();
    assert_eq!(pool.iter().map(|u| u.id).collect::<Vec<_>>(), vec![first, second]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn stale_version_is_rejected() {
    let store = store().await;
    let company_id = scratch_company();

    let item = store
        .insert_work_item(
            WorkItemDraft::new(WorkItemType::Task, company_id, "Chase deposit"),
            Utc::now(),
        )
        .await
        .unwrap();

    let mut retitled = item.clone();
    retitled.title = "Chase deposit (2nd)".to_string();
    store
        .commit(WorkItemCommit::item(retitled.clone()))
        .await
        .unwrap();

    let err = store.commit(WorkItemCommit::item(retitled)).await.unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { expected: 1, actual: 2, .. }));
}
