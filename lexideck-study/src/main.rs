//! lexideck-study - Learning Session Service
//!
//! Selects vocabulary words, generates study material and a short
//! composition through a text-generation endpoint, and exposes each run as
//! a pollable asynchronous task.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use lexideck_common::events::EventBus;

use lexideck_study::services::ChatGenerator;
use lexideck_study::AppState;

/// Listen address
const BIND_ADDR: &str = "127.0.0.1:5717";

/// Terminal tasks older than this are deleted by the retention sweep
const TASK_RETENTION_DAYS: i64 = 7;

/// Interval between retention sweeps
const SWEEP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting lexideck-study (Learning Session) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve data directory and open the database
    let data_dir = lexideck_common::config::resolve_data_dir(None);
    std::fs::create_dir_all(&data_dir)?;

    let db_path = lexideck_common::config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let db_pool = lexideck_study::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Tasks still 'running' belong to a previous process and will never
    // progress; fail them so pollers see a terminal state.
    let interrupted = lexideck_study::db::tasks::fail_interrupted(&db_pool).await?;
    if interrupted > 0 {
        warn!(count = interrupted, "Failed tasks interrupted by restart");
    }

    // Retention sweep at startup, then hourly
    let swept = lexideck_study::db::tasks::sweep_terminal(
        &db_pool,
        chrono::Duration::days(TASK_RETENTION_DAYS),
    )
    .await?;
    if swept > 0 {
        info!(count = swept, "Swept old terminal tasks");
    }

    let sweep_pool = db_pool.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        interval.tick().await; // first tick fires immediately; already swept above
        loop {
            interval.tick().await;
            match lexideck_study::db::tasks::sweep_terminal(
                &sweep_pool,
                chrono::Duration::days(TASK_RETENTION_DAYS),
            )
            .await
            {
                Ok(0) => {}
                Ok(count) => info!(count, "Swept old terminal tasks"),
                Err(e) => warn!(error = %e, "Retention sweep failed"),
            }
        }
    });

    // Generator settings: database settings -> ENV -> TOML
    let settings = lexideck_study::config::resolve_generator_settings(&db_pool).await?;
    info!(model = %settings.model, "Text-generation endpoint configured");
    let generator = Arc::new(ChatGenerator::new(settings));

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);

    let state = AppState::new(db_pool, event_bus, generator);
    let app = lexideck_study::build_router(state);

    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    info!("Listening on http://{}", BIND_ADDR);
    info!("Health check: http://{}/health", BIND_ADDR);

    axum::serve(listener, app).await?;

    Ok(())
}
