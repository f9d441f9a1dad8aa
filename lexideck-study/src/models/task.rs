//! Generation task model
//!
//! One row per submitted learning session. The row is the single source of
//! truth for pipeline progress: the pipeline writes every milestone through
//! the task store, and pollers read the row directly, so status survives
//! process restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Composition, CompositionStyle};

/// Task lifecycle state
///
/// `Running -> Completed` and `Running -> Failed` are the only transitions;
/// both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Wire name (matches the serde representation and the DB column)
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

/// Parameters of one submitted learning session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    /// How many words to select
    pub word_count: usize,

    /// Register of the generated composition
    #[serde(default)]
    pub style: CompositionStyle,
}

/// Outcome for one selected word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordOutcome {
    pub word_id: i64,
    pub word: String,

    /// True when enrichment was generated and persisted
    pub enriched: bool,

    /// Why enrichment was skipped, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result payload of a completed session
///
/// Partial failure lives here, not in the task status: a session where some
/// words failed (or where the composition could not be generated) still
/// completes, with the failures recorded per word and in
/// `composition_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Per-word outcomes, in selection order
    pub words: Vec<WordOutcome>,

    /// Texts of the successfully enriched words, in selection order
    pub enriched_words: Vec<String>,

    /// Persisted composition id, when one was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition_id: Option<i64>,

    /// The generated composition, when one was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<Composition>,

    /// Why no composition was persisted (generation failure, or the
    /// explicit skip marker when no word was enriched)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition_error: Option<String>,

    /// Requested word count
    pub requested: usize,

    /// Number of words the selection policy returned
    pub selected: usize,

    /// Composition style of the session
    pub style: CompositionStyle,
}

impl SessionOutcome {
    /// Outcome of a session where the store had nothing to study
    pub fn empty(request: &SessionRequest) -> Self {
        Self {
            words: Vec::new(),
            enriched_words: Vec::new(),
            composition_id: None,
            composition: None,
            composition_error: Some("no words available to study".to_string()),
            requested: request.word_count,
            selected: 0,
            style: request.style,
        }
    }
}

/// Durable record of one asynchronous pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: Uuid,

    pub status: TaskStatus,

    /// Percentage complete (0.0 - 100.0), monotonically non-decreasing
    pub progress: f64,

    /// Current operation description
    pub message: String,

    /// Present iff status == completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionOutcome>,

    /// Present iff status == failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Set on the terminal transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}
