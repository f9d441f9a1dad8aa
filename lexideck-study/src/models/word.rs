//! Vocabulary word model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::EnrichmentRecord;

/// A vocabulary entry in the word store
///
/// `times_studied` is the fairness counter: words with a zero counter are
/// prioritized by selection and the counter is only incremented after the
/// word's enrichment was generated and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    /// Row id
    pub id: i64,

    /// The word itself (unique)
    pub word: String,

    /// How many times this word was part of a successful study session
    pub times_studied: i64,

    /// Generated learning material; None until the first successful enrichment
    pub enrichment: Option<EnrichmentRecord>,

    /// Last modification time
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read-only counters over the word and composition stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordStats {
    /// Total words in the store
    pub total_words: i64,

    /// Words never selected into a successful session (tier 0)
    pub never_studied: i64,

    /// Words studied at least once
    pub studied: i64,

    /// Words that carry generated enrichment
    pub with_enrichment: i64,

    /// Total compositions persisted
    pub total_compositions: i64,
}
