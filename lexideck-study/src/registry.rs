//! Async task registry
//!
//! Wraps a session pipeline run as a durable, independently pollable unit
//! of work. `submit` persists the task row BEFORE spawning the pipeline and
//! returning, so a status poll on the returned id can never miss. The only
//! channel from the running pipeline back to callers is the task row.

use std::sync::Arc;
use uuid::Uuid;

use lexideck_common::events::EventBus;
use lexideck_common::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::models::{GenerationTask, SessionRequest};
use crate::services::{SessionPipeline, TextGenerator};

/// Submit a learning session, returning its task id immediately
///
/// The pipeline executes on its own tokio task; the caller is never blocked
/// by generation.
pub async fn submit(
    db: &SqlitePool,
    generator: Arc<dyn TextGenerator>,
    event_bus: EventBus,
    request: SessionRequest,
) -> Result<Uuid> {
    let task_id = Uuid::new_v4();

    // Row must exist before the id is returned
    db::tasks::create(db, task_id, "Session queued").await?;

    tracing::info!(
        task_id = %task_id,
        word_count = request.word_count,
        style = request.style.as_str(),
        "Session task created"
    );

    let db = db.clone();
    tokio::spawn(async move {
        let pipeline = SessionPipeline::new(db.clone(), generator, event_bus.clone());

        if let Err(e) = pipeline.run(task_id, request).await {
            tracing::error!(task_id = %task_id, error = %e, "Session pipeline failed");

            if let Err(mark_error) = db::tasks::fail(&db, task_id, &e.to_string()).await {
                tracing::error!(
                    task_id = %task_id,
                    error = %mark_error,
                    "Failed to mark task as failed - attempting direct database update"
                );

                // Fallback: best-effort direct update so the row does not
                // stay 'running' forever
                let _ = sqlx::query(
                    r#"UPDATE gen_tasks
                       SET status = 'failed', error = ?, ended_at = ?
                       WHERE task_id = ? AND status = 'running'"#,
                )
                .bind(e.to_string())
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(task_id.to_string())
                .execute(&db)
                .await;
            }

            event_bus.emit_lossy(lexideck_common::events::StudyEvent::SessionFailed {
                task_id,
                error: e.to_string(),
                timestamp: chrono::Utc::now(),
            });
        }
    });

    Ok(task_id)
}

/// Point read of a task's durable state
///
/// Safe to call arbitrarily often, from any number of callers. Unknown ids
/// yield `None`.
pub async fn status(db: &SqlitePool, task_id: Uuid) -> Result<Option<GenerationTask>> {
    db::tasks::load(db, task_id).await
}
