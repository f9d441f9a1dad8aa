//! # Lexideck Common Library
//!
//! Shared code for the Lexideck services:
//! - Error types
//! - Event types (StudyEvent enum) and the broadcast EventBus
//! - Configuration loading and data directory resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
