//! Generation task persistence
//!
//! One row per submitted session. Only the pipeline that owns a task writes
//! its non-terminal fields, so every update is an independent point write;
//! the `status = 'running'` guard keeps terminal rows immutable and the
//! `max(progress, ?)` guard keeps progress monotonic even if a stale write
//! lands late.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use lexideck_common::Result;

use crate::models::{GenerationTask, SessionOutcome, TaskStatus};

/// Create the task row (status=running, progress=0)
///
/// Must complete before the task id is handed to the caller, so a poll
/// issued right after submission can never observe "task unknown".
pub async fn create(pool: &SqlitePool, task_id: Uuid, message: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO gen_tasks (task_id, status, progress, message, created_at)
        VALUES (?, 'running', 0.0, ?, ?)
        "#,
    )
    .bind(task_id.to_string())
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a task by id
pub async fn load(pool: &SqlitePool, task_id: Uuid) -> Result<Option<GenerationTask>> {
    let row = sqlx::query(
        r#"
        SELECT task_id, status, progress, message, result, error, created_at, ended_at
        FROM gen_tasks
        WHERE task_id = ?
        "#,
    )
    .bind(task_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(task_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Record a progress milestone for a running task
///
/// No-op on terminal rows; a lower progress value than the stored one is
/// ignored by the `max()` guard.
pub async fn update_progress(
    pool: &SqlitePool,
    task_id: Uuid,
    progress: f64,
    message: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE gen_tasks
        SET progress = max(progress, ?), message = ?
        WHERE task_id = ? AND status = 'running'
        "#,
    )
    .bind(progress.clamp(0.0, 100.0))
    .bind(message)
    .bind(task_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Terminal transition: running -> completed
pub async fn complete(
    pool: &SqlitePool,
    task_id: Uuid,
    message: &str,
    outcome: &SessionOutcome,
) -> Result<()> {
    let result = serde_json::to_string(outcome)
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to serialize outcome: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE gen_tasks
        SET status = 'completed', progress = 100.0, message = ?, result = ?, ended_at = ?
        WHERE task_id = ? AND status = 'running'
        "#,
    )
    .bind(message)
    .bind(&result)
    .bind(Utc::now().to_rfc3339())
    .bind(task_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Terminal transition: running -> failed
pub async fn fail(pool: &SqlitePool, task_id: Uuid, error: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE gen_tasks
        SET status = 'failed', message = 'Session failed', error = ?, ended_at = ?
        WHERE task_id = ? AND status = 'running'
        "#,
    )
    .bind(error)
    .bind(Utc::now().to_rfc3339())
    .bind(task_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete terminal tasks older than `max_age`
///
/// Running tasks are never swept. Returns the number of rows removed.
pub async fn sweep_terminal(pool: &SqlitePool, max_age: Duration) -> Result<usize> {
    let cutoff = Utc::now() - max_age;

    let result = sqlx::query(
        r#"
        DELETE FROM gen_tasks
        WHERE status != 'running' AND ended_at IS NOT NULL AND ended_at <= ?
        "#,
    )
    .bind(cutoff.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() as usize)
}

/// Fail tasks interrupted by a process restart
///
/// Any row still 'running' at startup belonged to a previous process whose
/// pipeline died with it and will never progress again.
pub async fn fail_interrupted(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query(
        r#"
        UPDATE gen_tasks
        SET status = 'failed',
            message = 'Session failed',
            error = 'interrupted by service restart',
            ended_at = ?
        WHERE status = 'running'
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() as usize)
}

fn task_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<GenerationTask> {
    let task_id_str: String = row.get("task_id");
    let task_id = Uuid::parse_str(&task_id_str)
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to parse task_id: {}", e)))?;

    let status_str: String = row.get("status");
    let status = match status_str.as_str() {
        "running" => TaskStatus::Running,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        other => {
            return Err(lexideck_common::Error::Internal(format!(
                "Unknown task status: {}",
                other
            )))
        }
    };

    let result: Option<String> = row.get("result");
    let result = result
        .map(|s| serde_json::from_str::<SessionOutcome>(&s))
        .transpose()
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to deserialize outcome: {}", e)))?;

    let created_at = parse_timestamp(row.get("created_at"))?;
    let ended_at: Option<String> = row.get("ended_at");
    let ended_at = ended_at.map(parse_timestamp).transpose()?;

    Ok(GenerationTask {
        task_id,
        status,
        progress: row.get("progress"),
        message: row.get("message"),
        result,
        error: row.get("error"),
        created_at,
        ended_at,
    })
}

fn parse_timestamp(s: String) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to parse timestamp: {}", e)))
}
