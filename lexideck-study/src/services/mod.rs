//! Services for lexideck-study

pub mod generator;
pub mod session_pipeline;

pub use generator::{ChatGenerator, GeneratorError, TextGenerator};
pub use session_pipeline::SessionPipeline;
