//! Entity store: one `Storage` handle over a SQLite pool.
//!
//! The handle is constructed once at startup and passed down through
//! `AppContext`, never reached through a global. Referential integrity
//! between collections is maintained by the callers (see `assignment`
//! and `progress`); the store itself only guarantees atomic
//! single-statement writes.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

// ─── Row types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub progress: i64,
    pub studio: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub color: String,
    pub project_lead: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub project_id: String,
    pub assignee_id: Option<String>,
    pub priority: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamMemberRow {
    pub id: String,
    pub name: String,
    pub role: String,
    pub capacity: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Per-project task counts, grouped in one aggregate query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectTaskSummaryRow {
    pub project_id: String,
    pub total: i64,
    pub completed: i64,
}

// ─── Insert params ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub status: String,
    pub progress: i64,
    pub studio: String,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub color: String,
    pub project_lead: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub status: String,
    pub project_id: String,
    pub assignee_id: Option<String>,
    pub priority: String,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub price: f64,
    pub quantity: i64,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("studiod.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ─── Projects ───────────────────────────────────────────────────────────

    pub async fn create_project(&self, p: NewProject) -> Result<ProjectRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO projects
             (id, name, status, progress, studio, due_date, notes, color, project_lead, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&p.name)
        .bind(&p.status)
        .bind(p.progress)
        .bind(&p.studio)
        .bind(&p.due_date)
        .bind(&p.notes)
        .bind(&p.color)
        .bind(&p.project_lead)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_project(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project not found after insert"))
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<ProjectRow>> {
        Ok(sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Write back every mutable column of a project and return the stored row.
    pub async fn update_project(&self, p: &ProjectRow) -> Result<ProjectRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE projects SET name = ?, status = ?, progress = ?, studio = ?,
             due_date = ?, notes = ?, color = ?, project_lead = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&p.name)
        .bind(&p.status)
        .bind(p.progress)
        .bind(&p.studio)
        .bind(&p.due_date)
        .bind(&p.notes)
        .bind(&p.color)
        .bind(&p.project_lead)
        .bind(&now)
        .bind(&p.id)
        .execute(&self.pool)
        .await?;
        self.get_project(&p.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project not found after update"))
    }

    /// Persist a derived (progress, status) pair and return the updated row.
    /// Returns `None` when the project does not exist.
    pub async fn set_project_progress(
        &self,
        id: &str,
        progress: i64,
        status: &str,
    ) -> Result<Option<ProjectRow>> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE projects SET progress = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(progress)
        .bind(status)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One aggregate pass over tasks: (total, completed) per project.
    pub async fn project_task_summaries(&self) -> Result<Vec<ProjectTaskSummaryRow>> {
        Ok(sqlx::query_as(
            "SELECT project_id,
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN status = 'Complete' THEN 1 ELSE 0 END), 0) AS completed
             FROM tasks GROUP BY project_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn count_project_tasks(&self, project_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn count_project_tasks_complete(&self, project_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE project_id = ? AND status = 'Complete'",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    // ─── Tasks ──────────────────────────────────────────────────────────────

    pub async fn create_task(&self, t: NewTask) -> Result<TaskRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tasks (id, title, status, project_id, assignee_id, priority, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&t.title)
        .bind(&t.status)
        .bind(&t.project_id)
        .bind(&t.assignee_id)
        .bind(&t.priority)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_task(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("task not found after insert"))
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn list_project_tasks(&self, project_id: &str) -> Result<Vec<TaskRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM tasks WHERE project_id = ? ORDER BY created_at DESC")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Tasks in a member's set, via the reverse-reference join table.
    pub async fn list_member_tasks(&self, member_id: &str) -> Result<Vec<TaskRow>> {
        Ok(sqlx::query_as(
            "SELECT t.* FROM tasks t
             JOIN member_tasks mt ON mt.task_id = t.id
             WHERE mt.member_id = ?
             ORDER BY t.created_at DESC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Write back every mutable column of a task and return the stored row.
    pub async fn update_task(&self, t: &TaskRow) -> Result<TaskRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE tasks SET title = ?, status = ?, project_id = ?, assignee_id = ?,
             priority = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&t.title)
        .bind(&t.status)
        .bind(&t.project_id)
        .bind(&t.assignee_id)
        .bind(&t.priority)
        .bind(&now)
        .bind(&t.id)
        .execute(&self.pool)
        .await?;
        self.get_task(&t.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("task not found after update"))
    }

    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_project_task_ids(&self, project_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn delete_project_tasks(&self, project_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Null the assignee on every task pointing at a member. Tasks survive.
    pub async fn clear_member_assignments(&self, member_id: &str) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let result =
            sqlx::query("UPDATE tasks SET assignee_id = NULL, updated_at = ? WHERE assignee_id = ?")
                .bind(&now)
                .bind(member_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    // ─── Team members ───────────────────────────────────────────────────────

    pub async fn create_member(
        &self,
        name: &str,
        role: &str,
        capacity: i64,
    ) -> Result<TeamMemberRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO team_members (id, name, role, capacity, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(role)
        .bind(capacity)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_member(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("team member not found after insert"))
    }

    pub async fn get_member(&self, id: &str) -> Result<Option<TeamMemberRow>> {
        Ok(sqlx::query_as("SELECT * FROM team_members WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_members(&self) -> Result<Vec<TeamMemberRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM team_members ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn member_exists(&self, id: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    pub async fn update_member(&self, m: &TeamMemberRow) -> Result<TeamMemberRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE team_members SET name = ?, role = ?, capacity = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&m.name)
        .bind(&m.role)
        .bind(m.capacity)
        .bind(&now)
        .bind(&m.id)
        .execute(&self.pool)
        .await?;
        self.get_member(&m.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("team member not found after update"))
    }

    pub async fn delete_member(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Member task set ────────────────────────────────────────────────────
    // All mutations are idempotent; a partially applied sequence can be
    // re-run without corrupting the set.

    pub async fn add_member_task(&self, member_id: &str, task_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO member_tasks (member_id, task_id) VALUES (?, ?)")
            .bind(member_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove_member_task(&self, member_id: &str, task_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM member_tasks WHERE member_id = ? AND task_id = ?")
            .bind(member_id)
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop a task id from every member's set (project deletion cascade).
    pub async fn remove_task_refs(&self, task_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM member_tasks WHERE task_id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop a deleted member's entire set.
    pub async fn clear_member_tasks(&self, member_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM member_tasks WHERE member_id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_member_task_ids(&self, member_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT task_id FROM member_tasks WHERE member_id = ?")
                .bind(member_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    // ─── Items ──────────────────────────────────────────────────────────────

    pub async fn create_item(&self, i: NewItem) -> Result<ItemRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO items (id, name, description, category, status, price, quantity, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&i.name)
        .bind(&i.description)
        .bind(&i.category)
        .bind(&i.status)
        .bind(i.price)
        .bind(i.quantity)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_item(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("item not found after insert"))
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<ItemRow>> {
        Ok(sqlx::query_as("SELECT * FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_items(&self) -> Result<Vec<ItemRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM items ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn update_item(&self, i: &ItemRow) -> Result<ItemRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE items SET name = ?, description = ?, category = ?, status = ?,
             price = ?, quantity = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&i.name)
        .bind(&i.description)
        .bind(&i.category)
        .bind(&i.status)
        .bind(i.price)
        .bind(i.quantity)
        .bind(&now)
        .bind(&i.id)
        .execute(&self.pool)
        .await?;
        self.get_item(&i.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("item not found after update"))
    }

    /// Delete an item and return the deleted row (echoed in the response).
    pub async fn delete_item(&self, id: &str) -> Result<Option<ItemRow>> {
        let item = self.get_item(id).await?;
        if item.is_some() {
            sqlx::query("DELETE FROM items WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(item)
    }
}
