use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::auth::repo::User;
use crate::tasks::dto::{SearchParams, TaskCreate, TaskUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Task record in the database. `created_on` and `created_by` are fixed
/// at insert; `last_updated_on` is reassigned server-side on every
/// mutation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub status: TaskStatus,
    pub remarks: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_on: OffsetDateTime,
    pub created_by: String,
    pub last_updated_by: String,
    pub user_id: Option<i64>,
}

const TASK_COLUMNS: &str = "id, title, description, due_date, status, remarks, \
     created_on, last_updated_on, created_by, last_updated_by, user_id";

impl Task {
    pub async fn create(db: &PgPool, fields: TaskCreate, owner: &User) -> anyhow::Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, due_date, status, remarks,
                               created_by, last_updated_by, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
            RETURNING id, title, description, due_date, status, remarks,
                      created_on, last_updated_on, created_by, last_updated_by, user_id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.due_date)
        .bind(fields.status)
        .bind(&fields.remarks)
        .bind(&owner.name)
        .bind(owner.id)
        .fetch_one(db)
        .await?;
        Ok(task)
    }

    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(task)
    }

    /// Offset/limit pagination in stable id order.
    pub async fn list(db: &PgPool, skip: i64, limit: i64) -> anyhow::Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(tasks)
    }

    /// Partial update. Runs as one transaction: the row is locked, each
    /// present field is applied, and the audit columns are reassigned
    /// unconditionally, so an empty body still bumps them.
    pub async fn update(
        db: &PgPool,
        id: i64,
        changes: TaskUpdate,
        editor: &str,
    ) -> anyhow::Result<Option<Task>> {
        let mut tx = db.begin().await?;

        let Some(mut task) = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(remarks) = changes.remarks {
            task.remarks = remarks;
        }

        let updated = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, due_date = $4, status = $5,
                remarks = $6, last_updated_by = $7, last_updated_on = now()
            WHERE id = $1
            RETURNING id, title, description, due_date, status, remarks,
                      created_on, last_updated_on, created_by, last_updated_by, user_id
            "#,
        )
        .bind(id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status)
        .bind(&task.remarks)
        .bind(editor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Returns false when no row with `id` existed.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Filtered search. All provided filters are ANDed; absent filters
    /// impose no constraint. Text matches title or description,
    /// case-insensitively; due-date bounds are inclusive.
    pub async fn search(db: &PgPool, params: SearchParams) -> anyhow::Result<Vec<Task>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE 1 = 1"
        ));

        if let Some(query) = params.query.filter(|q| !q.is_empty()) {
            let pattern = format!("%{query}%");
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(status) = params.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = params.due_date_from {
            qb.push(" AND due_date >= ").push_bind(from);
        }
        if let Some(to) = params.due_date_to {
            qb.push(" AND due_date <= ").push_bind(to);
        }
        qb.push(" ORDER BY id");

        let tasks = qb.build_query_as::<Task>().fetch_all(db).await?;
        Ok(tasks)
    }
}
