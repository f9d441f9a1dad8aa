//! Normalized learning material for one word
//!
//! Every field is always present with a type-correct value. The normalizer
//! (`crate::normalizer`) is the only producer of this record; consumers can
//! rely on the shape without re-validating.

use serde::{Deserialize, Serialize};

/// Regional phonetic transcriptions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phonetic {
    /// British transcription
    #[serde(default)]
    pub uk: String,

    /// American transcription
    #[serde(default)]
    pub us: String,
}

/// A common phrase using the word, with its translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasePair {
    #[serde(default)]
    pub phrase: String,

    #[serde(default)]
    pub translation: String,
}

/// Word-root analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Etymology {
    /// Root or affix the word derives from
    #[serde(default)]
    pub root: String,

    /// Free-text analysis
    #[serde(default)]
    pub analysis: String,
}

/// An example sentence with its translation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    #[serde(default)]
    pub sentence: String,

    #[serde(default)]
    pub translation: String,
}

/// Normalized learning material for one word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    /// Regional phonetic transcriptions
    #[serde(default)]
    pub phonetic: Phonetic,

    /// Syllable breakdown, e.g. `con·tem·po·rary`
    #[serde(default)]
    pub syllables: String,

    /// Grammatical categories, e.g. `["adjective", "noun"]`
    #[serde(default)]
    pub parts_of_speech: Vec<String>,

    /// Ordered common translations
    #[serde(default)]
    pub translations: Vec<String>,

    /// Common phrases with translations
    #[serde(default)]
    pub phrases: Vec<PhrasePair>,

    /// Root/affix analysis
    #[serde(default)]
    pub etymology: Etymology,

    /// Example sentences, bounded to `crate::normalizer::MAX_EXAMPLES`
    #[serde(default)]
    pub examples: Vec<ExamplePair>,
}

impl EnrichmentRecord {
    /// True when nothing was generated for any field
    pub fn is_empty(&self) -> bool {
        self.phonetic.uk.is_empty()
            && self.phonetic.us.is_empty()
            && self.syllables.is_empty()
            && self.parts_of_speech.is_empty()
            && self.translations.is_empty()
            && self.phrases.is_empty()
            && self.etymology.root.is_empty()
            && self.etymology.analysis.is_empty()
            && self.examples.is_empty()
    }
}
