//! Learning-session API handlers
//!
//! POST /session/start, GET /session/status/{task_id}, GET /stats

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CompositionStyle, GenerationTask, SessionRequest, TaskStatus, WordStats},
    registry, AppState,
};

/// Largest word count one session may request
const MAX_WORDS_PER_SESSION: usize = 50;

/// Default word count when the request omits it
fn default_word_count() -> usize {
    5
}

/// POST /session/start request
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default = "default_word_count")]
    pub word_count: usize,

    #[serde(default)]
    pub style: CompositionStyle,
}

/// POST /session/start response
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
}

/// POST /session/start
///
/// Submit a learning session. Returns immediately with the task id; the
/// pipeline runs in the background and its state is polled via
/// GET /session/status/{task_id}.
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> ApiResult<Json<StartSessionResponse>> {
    if request.word_count == 0 || request.word_count > MAX_WORDS_PER_SESSION {
        return Err(ApiError::BadRequest(format!(
            "word_count must be between 1 and {}",
            MAX_WORDS_PER_SESSION
        )));
    }

    let task_id = registry::submit(
        &state.db,
        state.generator.clone(),
        state.event_bus.clone(),
        SessionRequest {
            word_count: request.word_count,
            style: request.style,
        },
    )
    .await?;

    Ok(Json(StartSessionResponse {
        task_id,
        status: TaskStatus::Running,
    }))
}

/// GET /session/status/{task_id}
///
/// Poll a session's durable state. Unknown ids are a 404, never a crash.
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<GenerationTask>> {
    let task = registry::status(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session task not found: {}", task_id)))?;

    tracing::debug!(task_id = %task_id, status = ?task.status, "Status query");

    Ok(Json(task))
}

/// GET /stats
///
/// Word-store counters.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<WordStats>> {
    let stats = crate::db::words::stats(&state.db).await?;
    Ok(Json(stats))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/status/:task_id", get(get_session_status))
        .route("/stats", get(get_stats))
}
