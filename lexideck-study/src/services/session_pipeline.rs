//! Learning-session pipeline
//!
//! Drives one session through Selecting → Enriching → (Composing | skip) →
//! Persisting → Done, writing every milestone through the task store so a
//! poller always sees a consistent, monotonic view.
//!
//! # Error Handling
//! - Per-word enrichment failures are isolated: the word's persisted state
//!   and study counter stay untouched (it remains eligible for a future
//!   session) and the remaining words continue.
//! - The composition step runs only against the words that actually
//!   enriched; with zero successes it is skipped with an explicit marker,
//!   never invoked.
//! - Only storage faults propagate out of `run`; everything else is encoded
//!   in the completed task's outcome.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lexideck_common::events::{EventBus, StudyEvent};
use lexideck_common::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::models::{SessionOutcome, SessionRequest, WordOutcome};
use crate::normalizer;
use crate::services::generator::TextGenerator;

/// Progress milestone after selection
const PROGRESS_SELECTED: f64 = 10.0;

/// Progress milestone after the last word finished enriching
const PROGRESS_ENRICHED: f64 = 75.0;

/// Progress milestone after composition generation
const PROGRESS_COMPOSED: f64 = 90.0;

/// Session pipeline
pub struct SessionPipeline {
    db: SqlitePool,
    generator: Arc<dyn TextGenerator>,
    event_bus: EventBus,
}

impl SessionPipeline {
    pub fn new(db: SqlitePool, generator: Arc<dyn TextGenerator>, event_bus: EventBus) -> Self {
        Self {
            db,
            generator,
            event_bus,
        }
    }

    /// Execute one session run against an existing task row
    ///
    /// Returns `Err` only on storage faults; the caller marks the task
    /// failed in that case.
    pub async fn run(&self, task_id: Uuid, request: SessionRequest) -> Result<()> {
        info!(
            task_id = %task_id,
            word_count = request.word_count,
            style = request.style.as_str(),
            "Starting learning session"
        );

        self.event_bus.emit_lossy(StudyEvent::SessionStarted {
            task_id,
            word_count: request.word_count,
            style: request.style.as_str().to_string(),
            timestamp: Utc::now(),
        });

        // Selecting
        self.report(task_id, 2.0, "Selecting words...").await?;
        let words = db::words::select_for_study(&self.db, request.word_count).await?;

        if words.is_empty() {
            // Nothing to study: a reported empty result, not a failure
            info!(task_id = %task_id, "No words available to study");
            let outcome = SessionOutcome::empty(&request);
            db::tasks::complete(&self.db, task_id, "No words available to study", &outcome)
                .await?;
            self.event_bus.emit_lossy(StudyEvent::SessionCompleted {
                task_id,
                words_enriched: 0,
                timestamp: Utc::now(),
            });
            return Ok(());
        }

        let selected = words.len();
        self.report(
            task_id,
            PROGRESS_SELECTED,
            &format!("Selected {} words", selected),
        )
        .await?;

        // Enriching: per-word isolation
        let mut outcomes = Vec::with_capacity(selected);
        let mut enriched_words = Vec::new();

        for (index, word) in words.iter().enumerate() {
            debug!(task_id = %task_id, word = %word.word, "Enriching word");

            match self.generator.enrich_word(&word.word).await {
                Ok(raw) => {
                    let record = normalizer::normalize_enrichment(&raw);
                    db::words::record_enrichment(&self.db, word.id, &record).await?;
                    db::words::increment_times_studied(&self.db, word.id).await?;

                    enriched_words.push(word.word.clone());
                    outcomes.push(WordOutcome {
                        word_id: word.id,
                        word: word.word.clone(),
                        enriched: true,
                        error: None,
                    });

                    self.event_bus.emit_lossy(StudyEvent::WordEnriched {
                        task_id,
                        word: word.word.clone(),
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => {
                    // The word stays untouched and eligible for re-selection
                    warn!(
                        task_id = %task_id,
                        word = %word.word,
                        error = %e,
                        "Enrichment failed (non-fatal)"
                    );
                    outcomes.push(WordOutcome {
                        word_id: word.id,
                        word: word.word.clone(),
                        enriched: false,
                        error: Some(e.to_string()),
                    });

                    self.event_bus.emit_lossy(StudyEvent::WordFailed {
                        task_id,
                        word: word.word.clone(),
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }

            let done = index + 1;
            let progress = PROGRESS_SELECTED
                + (PROGRESS_ENRICHED - PROGRESS_SELECTED) * done as f64 / selected as f64;
            self.report(
                task_id,
                progress,
                &format!("Enriched {} of {} words", done, selected),
            )
            .await?;
        }

        info!(
            task_id = %task_id,
            enriched = enriched_words.len(),
            selected,
            "Enrichment complete"
        );

        // Composing: only against the successful set, never against zero words
        let mut composition = None;
        let mut composition_id = None;
        let mut composition_error = None;

        if enriched_words.is_empty() {
            info!(task_id = %task_id, "No words enriched, skipping composition");
            composition_error = Some("no words enriched; composition skipped".to_string());
        } else {
            self.report(
                task_id,
                PROGRESS_ENRICHED,
                &format!("Composing from {} words...", enriched_words.len()),
            )
            .await?;

            match self.generator.compose(&enriched_words, request.style).await {
                Ok(raw) => {
                    let comp =
                        normalizer::normalize_composition(&raw, &enriched_words, Utc::now());
                    if comp.body.is_empty() {
                        warn!(task_id = %task_id, "Composition body empty after normalization");
                        composition_error =
                            Some("composition response carried no body text".to_string());
                    } else {
                        // Persisting
                        let id = db::compositions::save(&self.db, &comp).await?;
                        info!(task_id = %task_id, composition_id = id, "Composition saved");
                        composition_id = Some(id);
                        composition = Some(crate::models::Composition { id, ..comp });
                    }
                }
                Err(e) => {
                    // Already-persisted enrichment is not rolled back
                    warn!(task_id = %task_id, error = %e, "Composition generation failed");
                    composition_error = Some(e.to_string());
                }
            }

            self.report(task_id, PROGRESS_COMPOSED, "Composition step finished")
                .await?;
        }

        // Done
        let outcome = SessionOutcome {
            words: outcomes,
            enriched_words: enriched_words.clone(),
            composition_id,
            composition,
            composition_error,
            requested: request.word_count,
            selected,
            style: request.style,
        };

        let message = format!(
            "Session complete: {} of {} words enriched",
            enriched_words.len(),
            selected
        );
        db::tasks::complete(&self.db, task_id, &message, &outcome).await?;

        self.event_bus.emit_lossy(StudyEvent::SessionCompleted {
            task_id,
            words_enriched: enriched_words.len(),
            timestamp: Utc::now(),
        });

        info!(task_id = %task_id, "Learning session completed");
        Ok(())
    }

    /// Write a progress milestone and broadcast it
    async fn report(&self, task_id: Uuid, progress: f64, message: &str) -> Result<()> {
        db::tasks::update_progress(&self.db, task_id, progress, message).await?;
        self.event_bus.emit_lossy(StudyEvent::SessionProgress {
            task_id,
            progress,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
