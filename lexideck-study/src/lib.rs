//! lexideck-study library interface
//!
//! Learning-session service: selects vocabulary words under a
//! never-studied-first policy, generates learning material and a short
//! composition through a text-generation endpoint, and tracks each run as a
//! durable, pollable task.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod registry;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use lexideck_common::events::EventBus;

use crate::services::TextGenerator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Text-generation collaborator
    pub generator: Arc<dyn TextGenerator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            db,
            event_bus,
            generator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
