//! Event types for the Lexideck event system
//!
//! Study-session events are broadcast on an in-process bus so any number of
//! SSE clients can observe a running session. The durable task row remains
//! the source of truth for progress; the bus is best-effort.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Study-session event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StudyEvent {
    /// A learning session was submitted and its pipeline started
    SessionStarted {
        task_id: Uuid,
        word_count: usize,
        style: String,
        timestamp: DateTime<Utc>,
    },

    /// Coarse progress milestone for a running session
    SessionProgress {
        task_id: Uuid,
        progress: f64,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A word was enriched and persisted
    WordEnriched {
        task_id: Uuid,
        word: String,
        timestamp: DateTime<Utc>,
    },

    /// Enrichment failed for one word (the session continues)
    WordFailed {
        task_id: Uuid,
        word: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Session reached the completed state
    SessionCompleted {
        task_id: Uuid,
        words_enriched: usize,
        timestamp: DateTime<Utc>,
    },

    /// Session reached the failed state
    SessionFailed {
        task_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl StudyEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            StudyEvent::SessionStarted { .. } => "SessionStarted",
            StudyEvent::SessionProgress { .. } => "SessionProgress",
            StudyEvent::WordEnriched { .. } => "WordEnriched",
            StudyEvent::WordFailed { .. } => "WordFailed",
            StudyEvent::SessionCompleted { .. } => "SessionCompleted",
            StudyEvent::SessionFailed { .. } => "SessionFailed",
        }
    }
}

/// Broadcast bus for study events
///
/// Cloning shares the underlying channel. Emission is lossy: if no
/// subscriber is listening the event is dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StudyEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<StudyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscribers case
    pub fn emit_lossy(&self, event: StudyEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
