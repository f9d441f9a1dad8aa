//! Session pipeline integration tests
//!
//! Exercises the full Selecting → Enriching → Composing → Persisting run
//! against a real (temp-file) database and a scripted generator:
//! - per-word error isolation (one failure doesn't abort the others)
//! - failed words keep their state and study counter
//! - composition uses exactly the successful set
//! - zero successes skip composition entirely (compose call count 0)
//! - composition failure doesn't roll back persisted enrichment

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use lexideck_common::events::EventBus;
use lexideck_study::db;
use lexideck_study::models::{CompositionStyle, SessionRequest, TaskStatus};
use lexideck_study::services::{GeneratorError, SessionPipeline, TextGenerator};

/// Helper: fresh database in a temp directory
async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = db::init_database_pool(&dir.path().join("test.db"))
        .await
        .unwrap();
    (dir, pool)
}

/// Scripted generator: configurable per-word failures, counted compose calls
struct MockGenerator {
    fail_words: HashSet<String>,
    fail_compose: bool,
    compose_calls: AtomicUsize,
    composed_with: Mutex<Vec<Vec<String>>>,
}

impl MockGenerator {
    fn new(fail_words: &[&str]) -> Self {
        Self {
            fail_words: fail_words.iter().map(|s| s.to_string()).collect(),
            fail_compose: false,
            compose_calls: AtomicUsize::new(0),
            composed_with: Mutex::new(Vec::new()),
        }
    }

    fn failing_compose(fail_words: &[&str]) -> Self {
        Self {
            fail_compose: true,
            ..Self::new(fail_words)
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn enrich_word(&self, word: &str) -> Result<Value, GeneratorError> {
        if self.fail_words.contains(word) {
            return Err(GeneratorError::Unparseable(format!(
                "scripted failure for {}",
                word
            )));
        }
        Ok(json!({
            "phonetic": "/x/",
            "translations": [format!("meaning of {}", word)],
        }))
    }

    async fn compose(
        &self,
        words: &[String],
        _style: CompositionStyle,
    ) -> Result<Value, GeneratorError> {
        self.compose_calls.fetch_add(1, Ordering::SeqCst);
        self.composed_with.lock().unwrap().push(words.to_vec());

        if self.fail_compose {
            return Err(GeneratorError::Api {
                status: 503,
                body: "scripted compose failure".to_string(),
            });
        }
        Ok(json!({
            "title": "Generated",
            "body": format!("A passage using {}.", words.join(", ")),
            "body_translation": "translation",
        }))
    }
}

/// Helper: run a pipeline to completion against an existing task row
async fn run_session(
    pool: &SqlitePool,
    generator: Arc<MockGenerator>,
    word_count: usize,
) -> lexideck_study::models::GenerationTask {
    let task_id = Uuid::new_v4();
    db::tasks::create(pool, task_id, "queued").await.unwrap();

    let pipeline = SessionPipeline::new(pool.clone(), generator, EventBus::new(16));
    pipeline
        .run(
            task_id,
            SessionRequest {
                word_count,
                style: CompositionStyle::Narrative,
            },
        )
        .await
        .unwrap();

    db::tasks::load(pool, task_id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_partial_failure_isolates_words() {
    let (_dir, pool) = test_pool().await;

    let id_a = db::words::insert_word(&pool, "alpha").await.unwrap();
    let id_b = db::words::insert_word(&pool, "beta").await.unwrap();
    let id_c = db::words::insert_word(&pool, "gamma").await.unwrap();

    let generator = Arc::new(MockGenerator::new(&["beta"]));
    let task = run_session(&pool, generator.clone(), 3).await;

    assert_eq!(task.status, TaskStatus::Completed);
    let outcome = task.result.unwrap();

    // alpha and gamma enriched, counter incremented, record stored
    for id in [id_a, id_c] {
        let word = db::words::load_word(&pool, id).await.unwrap().unwrap();
        assert_eq!(word.times_studied, 1);
        assert!(word.enrichment.is_some());
    }

    // beta untouched: no counter bump, no record, eligible for re-selection
    let beta = db::words::load_word(&pool, id_b).await.unwrap().unwrap();
    assert_eq!(beta.times_studied, 0);
    assert!(beta.enrichment.is_none());

    let failed: Vec<_> = outcome.words.iter().filter(|w| !w.enriched).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].word, "beta");
    assert!(failed[0].error.is_some());

    // Composition ran once, with exactly the successful set
    assert_eq!(generator.compose_calls.load(Ordering::SeqCst), 1);
    let composed_with = generator.composed_with.lock().unwrap();
    let mut words = composed_with[0].clone();
    words.sort();
    assert_eq!(words, vec!["alpha", "gamma"]);
}

#[tokio::test]
async fn test_zero_successes_skip_composition() {
    let (_dir, pool) = test_pool().await;

    for word in ["alpha", "beta", "gamma"] {
        db::words::insert_word(&pool, word).await.unwrap();
    }

    let generator = Arc::new(MockGenerator::new(&["alpha", "beta", "gamma"]));
    let task = run_session(&pool, generator.clone(), 3).await;

    assert_eq!(task.status, TaskStatus::Completed);
    let outcome = task.result.unwrap();

    assert!(outcome.enriched_words.is_empty());
    assert!(outcome.composition.is_none());
    assert!(outcome
        .composition_error
        .as_deref()
        .unwrap()
        .contains("skipped"));

    // Composition must never be attempted against zero words
    assert_eq!(generator.compose_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_store_completes_with_empty_outcome() {
    let (_dir, pool) = test_pool().await;

    let generator = Arc::new(MockGenerator::new(&[]));
    let task = run_session(&pool, generator.clone(), 5).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.progress, 100.0);

    let outcome = task.result.unwrap();
    assert_eq!(outcome.selected, 0);
    assert_eq!(outcome.requested, 5);
    assert!(outcome.composition_error.is_some());
    assert_eq!(generator.compose_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_success_persists_composition() {
    let (_dir, pool) = test_pool().await;

    for word in ["alpha", "beta"] {
        db::words::insert_word(&pool, word).await.unwrap();
    }

    let generator = Arc::new(MockGenerator::new(&[]));
    let task = run_session(&pool, generator, 2).await;

    assert_eq!(task.status, TaskStatus::Completed);
    let outcome = task.result.unwrap();
    assert_eq!(outcome.enriched_words.len(), 2);

    let composition_id = outcome.composition_id.expect("composition persisted");
    let stored = db::compositions::load(&pool, composition_id)
        .await
        .unwrap()
        .expect("composition row exists");
    assert_eq!(stored.title, "Generated");
    assert!(!stored.body.is_empty());

    let mut words = stored.words.clone();
    words.sort();
    assert_eq!(words, vec!["alpha", "beta"]);

    let stats = db::words::stats(&pool).await.unwrap();
    assert_eq!(stats.with_enrichment, 2);
    assert_eq!(stats.never_studied, 0);
    assert_eq!(stats.total_compositions, 1);
}

#[tokio::test]
async fn test_composition_failure_keeps_enrichment() {
    let (_dir, pool) = test_pool().await;

    let id = db::words::insert_word(&pool, "alpha").await.unwrap();

    let generator = Arc::new(MockGenerator::failing_compose(&[]));
    let task = run_session(&pool, generator.clone(), 1).await;

    // Composition failure is encoded in the outcome, not as task failure
    assert_eq!(task.status, TaskStatus::Completed);
    let outcome = task.result.unwrap();
    assert!(outcome.composition.is_none());
    assert!(outcome.composition_error.is_some());
    assert_eq!(generator.compose_calls.load(Ordering::SeqCst), 1);

    // Already-persisted enrichment is not rolled back
    let word = db::words::load_word(&pool, id).await.unwrap().unwrap();
    assert_eq!(word.times_studied, 1);
    assert!(word.enrichment.is_some());

    let stats = db::words::stats(&pool).await.unwrap();
    assert_eq!(stats.total_compositions, 0);
}

#[tokio::test]
async fn test_progress_milestones_are_monotonic() {
    let (_dir, pool) = test_pool().await;

    for i in 0..4 {
        db::words::insert_word(&pool, &format!("word{}", i))
            .await
            .unwrap();
    }

    let task_id = Uuid::new_v4();
    db::tasks::create(&pool, task_id, "queued").await.unwrap();

    // Sample progress from a concurrent poller while the pipeline runs
    let poller_pool = pool.clone();
    let poller = tokio::spawn(async move {
        let mut samples = Vec::new();
        loop {
            let task = db::tasks::load(&poller_pool, task_id).await.unwrap().unwrap();
            samples.push(task.progress);
            if task.status.is_terminal() {
                return samples;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    });

    let pipeline = SessionPipeline::new(
        pool.clone(),
        Arc::new(MockGenerator::new(&[])),
        EventBus::new(16),
    );
    pipeline
        .run(
            task_id,
            SessionRequest {
                word_count: 4,
                style: CompositionStyle::Tale,
            },
        )
        .await
        .unwrap();

    let samples = poller.await.unwrap();
    for pair in samples.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "progress regressed: {} -> {}",
            pair[0],
            pair[1]
        );
    }
    assert_eq!(*samples.last().unwrap(), 100.0);
}

#[tokio::test]
async fn test_empty_composition_body_counts_as_failure() {
    let (_dir, pool) = test_pool().await;

    db::words::insert_word(&pool, "alpha").await.unwrap();

    // Compose succeeds at the transport level but carries no body
    struct EmptyBodyGenerator;

    #[async_trait]
    impl TextGenerator for EmptyBodyGenerator {
        async fn enrich_word(&self, _word: &str) -> Result<Value, GeneratorError> {
            Ok(json!({"translations": ["t"]}))
        }

        async fn compose(
            &self,
            _words: &[String],
            _style: CompositionStyle,
        ) -> Result<Value, GeneratorError> {
            Ok(json!({"title": "only a title"}))
        }
    }

    let task_id = Uuid::new_v4();
    db::tasks::create(&pool, task_id, "queued").await.unwrap();

    let pipeline = SessionPipeline::new(pool.clone(), Arc::new(EmptyBodyGenerator), EventBus::new(16));
    pipeline
        .run(
            task_id,
            SessionRequest {
                word_count: 1,
                style: CompositionStyle::Report,
            },
        )
        .await
        .unwrap();

    let task = db::tasks::load(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let outcome = task.result.unwrap();
    assert!(outcome.composition.is_none());
    assert!(outcome.composition_error.is_some());

    let stats = db::words::stats(&pool).await.unwrap();
    assert_eq!(stats.total_compositions, 0);
}
