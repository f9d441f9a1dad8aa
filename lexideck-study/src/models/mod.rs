//! Data models for lexideck-study

pub mod composition;
pub mod enrichment;
pub mod task;
pub mod word;

pub use composition::{Composition, CompositionStyle};
pub use enrichment::{EnrichmentRecord, Etymology, ExamplePair, Phonetic, PhrasePair};
pub use task::{GenerationTask, SessionOutcome, SessionRequest, TaskStatus, WordOutcome};
pub use word::{Word, WordStats};
