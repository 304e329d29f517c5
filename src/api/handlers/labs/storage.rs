//! Database helpers for topics and lab tasks.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::Instrument;

use super::super::auth::utils::unix_now;

#[derive(Debug, Clone)]
pub(crate) struct TopicRecord {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
}

#[derive(Debug, Clone)]
pub(crate) struct LabTaskRecord {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) topic_id: i64,
    pub(crate) file_path: Option<String>,
    pub(crate) solution_file_path: Option<String>,
    pub(crate) created_at: i64,
}

fn task_from_row(row: &SqliteRow) -> LabTaskRecord {
    LabTaskRecord {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        topic_id: row.get("topic_id"),
        file_path: row.get("file_path"),
        solution_file_path: row.get("solution_file_path"),
        created_at: row.get("created_at"),
    }
}

pub(super) async fn list_topics(pool: &SqlitePool) -> Result<Vec<TopicRecord>> {
    let query = "SELECT id, name, description FROM topics ORDER BY id";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list topics")?;

    Ok(rows
        .iter()
        .map(|row| TopicRecord {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
        })
        .collect())
}

pub(super) async fn topic_exists(pool: &SqlitePool, topic_id: i64) -> Result<bool> {
    let query = "SELECT 1 FROM topics WHERE id = ?1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(topic_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check topic existence")?;
    Ok(row.is_some())
}

/// Filter tasks by substring and/or topic. Both filters optional.
pub(super) async fn search_tasks(
    pool: &SqlitePool,
    q: Option<&str>,
    topic_id: Option<i64>,
) -> Result<Vec<LabTaskRecord>> {
    let query = r"
        SELECT id, title, description, topic_id, file_path, solution_file_path, created_at
        FROM lab_tasks
        WHERE (?1 IS NULL OR title LIKE '%' || ?1 || '%' OR description LIKE '%' || ?1 || '%')
          AND (?2 IS NULL OR topic_id = ?2)
        ORDER BY id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(q)
        .bind(topic_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to search tasks")?;

    Ok(rows.iter().map(task_from_row).collect())
}

pub(super) async fn lookup_task(pool: &SqlitePool, task_id: i64) -> Result<Option<LabTaskRecord>> {
    let query = r"
        SELECT id, title, description, topic_id, file_path, solution_file_path, created_at
        FROM lab_tasks
        WHERE id = ?1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(task_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup task")?;

    Ok(row.as_ref().map(task_from_row))
}

pub(super) async fn insert_task(
    pool: &SqlitePool,
    title: &str,
    description: &str,
    topic_id: i64,
) -> Result<LabTaskRecord> {
    let created_at = unix_now();
    let query = r"
        INSERT INTO lab_tasks (title, description, topic_id, created_at)
        VALUES (?1, ?2, ?3, ?4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(title)
        .bind(description)
        .bind(topic_id)
        .bind(created_at)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert task")?;

    Ok(LabTaskRecord {
        id: result.last_insert_rowid(),
        title: title.to_string(),
        description: description.to_string(),
        topic_id,
        file_path: None,
        solution_file_path: None,
        created_at,
    })
}

/// Update title, description and topic; attachments are left untouched.
pub(super) async fn update_task(
    pool: &SqlitePool,
    task_id: i64,
    title: &str,
    description: &str,
    topic_id: i64,
) -> Result<Option<LabTaskRecord>> {
    let query = r"
        UPDATE lab_tasks
        SET title = ?2, description = ?3, topic_id = ?4
        WHERE id = ?1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(task_id)
        .bind(title)
        .bind(description)
        .bind(topic_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update task")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    lookup_task(pool, task_id).await
}

pub(super) async fn delete_task(pool: &SqlitePool, task_id: i64) -> Result<bool> {
    let query = "DELETE FROM lab_tasks WHERE id = ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(task_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete task")?;
    Ok(result.rows_affected() > 0)
}
