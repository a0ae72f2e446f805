//! # PostgreSQL Assignment Store
//!
//! [`AssignmentStore`] over the schema in `migrations/`. Queries are checked at
//! runtime so the crate builds without a live database.
//!
//! A commit runs in one transaction: the item row is locked with
//! `SELECT ... FOR UPDATE`, its version compared, the active record locked and
//! superseded or closed, and the whole thing committed or dropped.

use super::{AssignmentStore, CommitResult, WorkItemCommit};
use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    AssignmentRecord, AssignmentRule, AssignmentStatus, Priority, User, WorkItem, WorkItemDraft,
    WorkItemType,
};
use crate::state_machine::WorkItemStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

const WORK_ITEM_COLUMNS: &str = "id, company_id, item_type, title, status, priority, category, \
     assigned_to_id, created_by_id, due_date, created_at, updated_at, assigned_at, started_at, \
     completed_at, completed_by_id, cancelled_at, cancelled_by_id, cancellation_reason, metadata, \
     version";

const RECORD_COLUMNS: &str = "id, work_item_id, work_item_type, company_id, assignee_id, \
     assigned_by_id, assigned_at, status, previous_assignment_id, auto_assigned, reason";

#[derive(Debug, Clone)]
pub struct PgAssignmentStore {
    pool: PgPool,
}

impl PgAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from configuration and run pending migrations
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .database_url()
            .ok_or(StoreError::MissingDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        info!(
            max_connections = config.max_connections,
            "💾 DATABASE: Assignment store connected"
        );

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_active_record(
        tx: &mut Transaction<'_, Postgres>,
        work_item_id: i64,
    ) -> StoreResult<Option<AssignmentRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM assignment_records \
             WHERE work_item_id = $1 AND status = 'active' FOR UPDATE"
        ))
        .bind(work_item_id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(AssignmentRecord::try_from).transpose()
    }

    async fn set_record_status(
        tx: &mut Transaction<'_, Postgres>,
        record_id: i64,
        status: AssignmentStatus,
    ) -> StoreResult<AssignmentRecord> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "UPDATE assignment_records SET status = $2 WHERE id = $1 RETURNING {RECORD_COLUMNS}"
        ))
        .bind(record_id)
        .bind(status.as_str())
        .fetch_one(&mut **tx)
        .await?;
        AssignmentRecord::try_from(row)
    }
}

#[async_trait]
impl AssignmentStore for PgAssignmentStore {
    async fn load_work_item(&self, id: i64) -> StoreResult<Option<WorkItem>> {
        let row = sqlx::query_as::<_, WorkItemRow>(&format!(
            "SELECT {WORK_ITEM_COLUMNS} FROM work_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(WorkItem::try_from).transpose()
    }

    async fn insert_work_item(
        &self,
        draft: WorkItemDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<WorkItem> {
        let item = WorkItem::from_draft(0, draft, now);
        let row = sqlx::query_as::<_, WorkItemRow>(&format!(
            "INSERT INTO work_items (company_id, item_type, title, status, priority, category, \
             assigned_to_id, created_by_id, due_date, created_at, updated_at, metadata, version, \
             terminal) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $11, 1, $12) \
             RETURNING {WORK_ITEM_COLUMNS}"
        ))
        .bind(item.company_id)
        .bind(item.item_type().as_str())
        .bind(&item.title)
        .bind(item.status.as_str())
        .bind(item.priority.as_str())
        .bind(&item.category)
        .bind(item.assigned_to_id)
        .bind(item.created_by_id)
        .bind(item.due_date)
        .bind(item.created_at)
        .bind(&item.metadata)
        .bind(item.is_terminal())
        .fetch_one(&self.pool)
        .await?;

        let inserted = WorkItem::try_from(row)?;
        debug!(item_id = inserted.id, item_type = %inserted.item_type(), "Work item inserted");
        Ok(inserted)
    }

    async fn commit(&self, commit: WorkItemCommit) -> StoreResult<CommitResult> {
        let WorkItemCommit {
            item,
            expected_version,
            new_record,
            close_active,
        } = commit;

        let mut tx = self.pool.begin().await?;

        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM work_items WHERE id = $1 FOR UPDATE")
                .bind(item.id)
                .fetch_optional(&mut *tx)
                .await?;
        let actual = actual.ok_or(StoreError::NotFound(item.id))?;
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                item_id: item.id,
                expected: expected_version,
                actual,
            });
        }

        let row = sqlx::query_as::<_, WorkItemRow>(&format!(
            "UPDATE work_items SET title = $2, status = $3, priority = $4, category = $5, \
             assigned_to_id = $6, due_date = $7, updated_at = $8, assigned_at = $9, \
             started_at = $10, completed_at = $11, completed_by_id = $12, cancelled_at = $13, \
             cancelled_by_id = $14, cancellation_reason = $15, metadata = $16, \
             version = version + 1, terminal = $17 \
             WHERE id = $1 RETURNING {WORK_ITEM_COLUMNS}"
        ))
        .bind(item.id)
        .bind(&item.title)
        .bind(item.status.as_str())
        .bind(item.priority.as_str())
        .bind(&item.category)
        .bind(item.assigned_to_id)
        .bind(item.due_date)
        .bind(item.updated_at)
        .bind(item.assigned_at)
        .bind(item.started_at)
        .bind(item.completed_at)
        .bind(item.completed_by_id)
        .bind(item.cancelled_at)
        .bind(item.cancelled_by_id)
        .bind(&item.cancellation_reason)
        .bind(&item.metadata)
        .bind(item.is_terminal())
        .fetch_one(&mut *tx)
        .await?;
        let stored = WorkItem::try_from(row)?;

        let mut superseded = None;
        let mut record = None;
        if let Some(new_record) = new_record {
            let previous = Self::lock_active_record(&mut tx, item.id).await?;
            if let Some(previous) = &previous {
                let record =
                    Self::set_record_status(&mut tx, previous.id, AssignmentStatus::Reassigned)
                        .await?;
                superseded = Some(record);
            }

            let row = sqlx::query_as::<_, RecordRow>(&format!(
                "INSERT INTO assignment_records (work_item_id, work_item_type, company_id, \
                 assignee_id, assigned_by_id, assigned_at, status, previous_assignment_id, \
                 auto_assigned, reason) \
                 VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9) \
                 RETURNING {RECORD_COLUMNS}"
            ))
            .bind(new_record.work_item_id)
            .bind(new_record.work_item_type.as_str())
            .bind(new_record.company_id)
            .bind(new_record.assignee_id)
            .bind(new_record.assigned_by_id)
            .bind(new_record.assigned_at)
            .bind(previous.as_ref().map(|p| p.id))
            .bind(new_record.auto_assigned)
            .bind(&new_record.reason)
            .fetch_one(&mut *tx)
            .await?;
            record = Some(AssignmentRecord::try_from(row)?);
        }

        let mut closed = None;
        if let Some(status) = close_active {
            if let Some(active) = Self::lock_active_record(&mut tx, item.id).await? {
                let closed_record = Self::set_record_status(&mut tx, active.id, status).await?;
                if let Some(created) = record.as_mut().filter(|r| r.id == closed_record.id) {
                    created.status = closed_record.status;
                }
                closed = Some(closed_record);
            }
        }

        tx.commit().await?;

        debug!(
            item_id = stored.id,
            version = stored.version,
            new_record = record.as_ref().map(|r| r.id),
            "PostgreSQL commit applied"
        );

        Ok(CommitResult {
            item: stored,
            record,
            superseded,
            closed,
        })
    }

    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, company_id, is_active, roles FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn query_active_users_by_role(
        &self,
        role: &str,
        company_id: i64,
    ) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, company_id, is_active, roles FROM users \
             WHERE company_id = $1 AND is_active AND $2 = ANY(roles) ORDER BY id",
        )
        .bind(company_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn query_assignment_rules(
        &self,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<Vec<AssignmentRule>> {
        let rows = sqlx::query_as::<_, RuleRow>(
            "SELECT id, company_id, name, work_item_type, assignment_type, criteria, target_role, \
             target_user_id, priority, is_active FROM assignment_rules \
             WHERE company_id = $1 AND work_item_type = $2 AND is_active",
        )
        .bind(company_id)
        .bind(item_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AssignmentRule::try_from).collect()
    }

    async fn query_assignment_history(
        &self,
        user_id: i64,
        item_type: WorkItemType,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM assignment_records \
             WHERE assignee_id = $1 AND work_item_type = $2 ORDER BY assigned_at, id"
        ))
        .bind(user_id)
        .bind(item_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AssignmentRecord::try_from).collect()
    }

    async fn latest_assignment_times(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
    ) -> StoreResult<HashMap<i64, DateTime<Utc>>> {
        let rows: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT assignee_id, MAX(assigned_at) FROM assignment_records \
             WHERE assignee_id = ANY($1) AND work_item_type = $2 GROUP BY assignee_id",
        )
        .bind(user_ids)
        .bind(item_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn count_active_items(
        &self,
        user_id: i64,
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_items \
             WHERE assigned_to_id = $1 AND item_type = $2 AND company_id = $3 AND NOT terminal",
        )
        .bind(user_id)
        .bind(item_type.as_str())
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_active_items_batch(
        &self,
        user_ids: &[i64],
        item_type: WorkItemType,
        company_id: i64,
    ) -> StoreResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT assigned_to_id, COUNT(*) FROM work_items \
             WHERE assigned_to_id = ANY($1) AND item_type = $2 AND company_id = $3 \
             AND NOT terminal GROUP BY assigned_to_id",
        )
        .bind(user_ids)
        .bind(item_type.as_str())
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: HashMap<i64, i64> = user_ids.iter().map(|&id| (id, 0)).collect();
        counts.extend(rows);
        Ok(counts)
    }

    async fn active_assignment(&self, work_item_id: i64) -> StoreResult<Option<AssignmentRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM assignment_records \
             WHERE work_item_id = $1 AND status = 'active'"
        ))
        .bind(work_item_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AssignmentRecord::try_from).transpose()
    }

    async fn assignment_history_for_item(
        &self,
        work_item_id: i64,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM assignment_records \
             WHERE work_item_id = $1 ORDER BY assigned_at, id"
        ))
        .bind(work_item_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AssignmentRecord::try_from).collect()
    }

    async fn assignments_since(
        &self,
        company_id: i64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM assignment_records \
             WHERE company_id = $1 AND assigned_at >= $2 ORDER BY assigned_at, id"
        ))
        .bind(company_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AssignmentRecord::try_from).collect()
    }
}

fn corrupt(table: &'static str) -> impl Fn(String) -> StoreError {
    move |reason| StoreError::CorruptRow { table, reason }
}

#[derive(sqlx::FromRow)]
struct WorkItemRow {
    id: i64,
    company_id: i64,
    item_type: String,
    title: String,
    status: String,
    priority: String,
    category: Option<String>,
    assigned_to_id: Option<i64>,
    created_by_id: Option<i64>,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    completed_by_id: Option<i64>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by_id: Option<i64>,
    cancellation_reason: Option<String>,
    metadata: serde_json::Value,
    version: i64,
}

impl TryFrom<WorkItemRow> for WorkItem {
    type Error = StoreError;

    fn try_from(row: WorkItemRow) -> Result<Self, Self::Error> {
        let item_type: WorkItemType = row.item_type.parse().map_err(corrupt("work_items"))?;
        let status = WorkItemStatus::parse(item_type, &row.status).map_err(corrupt("work_items"))?;
        let priority: Priority = row.priority.parse().map_err(corrupt("work_items"))?;

        Ok(WorkItem {
            id: row.id,
            company_id: row.company_id,
            title: row.title,
            status,
            priority,
            category: row.category,
            assigned_to_id: row.assigned_to_id,
            created_by_id: row.created_by_id,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            assigned_at: row.assigned_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            completed_by_id: row.completed_by_id,
            cancelled_at: row.cancelled_at,
            cancelled_by_id: row.cancelled_by_id,
            cancellation_reason: row.cancellation_reason,
            metadata: row.metadata,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    work_item_id: i64,
    work_item_type: String,
    company_id: i64,
    assignee_id: i64,
    assigned_by_id: i64,
    assigned_at: DateTime<Utc>,
    status: String,
    previous_assignment_id: Option<i64>,
    auto_assigned: bool,
    reason: Option<String>,
}

impl TryFrom<RecordRow> for AssignmentRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(AssignmentRecord {
            id: row.id,
            work_item_id: row.work_item_id,
            work_item_type: row
                .work_item_type
                .parse()
                .map_err(corrupt("assignment_records"))?,
            company_id: row.company_id,
            assignee_id: row.assignee_id,
            assigned_by_id: row.assigned_by_id,
            assigned_at: row.assigned_at,
            status: row.status.parse().map_err(corrupt("assignment_records"))?,
            previous_assignment_id: row.previous_assignment_id,
            auto_assigned: row.auto_assigned,
            reason: row.reason,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: i64,
    company_id: i64,
    name: String,
    work_item_type: String,
    assignment_type: String,
    criteria: serde_json::Value,
    target_role: Option<String>,
    target_user_id: Option<i64>,
    priority: i32,
    is_active: bool,
}

impl TryFrom<RuleRow> for AssignmentRule {
    type Error = StoreError;

    /// `assignment_type` stays raw; the rule engine reports unknown values
    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        Ok(AssignmentRule {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            work_item_type: row
                .work_item_type
                .parse()
                .map_err(corrupt("assignment_rules"))?,
            assignment_type: row.assignment_type,
            criteria: row.criteria,
            target_role: row.target_role,
            target_user_id: row.target_user_id,
            priority: row.priority,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    company_id: i64,
    is_active: bool,
    roles: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            company_id: row.company_id,
            is_active: row.is_active,
            roles: row.roles,
        }
    }
}
