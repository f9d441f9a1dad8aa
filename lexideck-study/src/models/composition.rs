//! Generated composition model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Register the composition is written in
///
/// Wire names are lowercase (`narrative`, `tale`, `report`, `prediction`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionStyle {
    /// A short story
    Narrative,
    /// A fairy-tale register
    Tale,
    /// A news-report register
    Report,
    /// A prophecy/prediction register
    Prediction,
}

impl Default for CompositionStyle {
    fn default() -> Self {
        CompositionStyle::Narrative
    }
}

impl CompositionStyle {
    /// Human-readable register name used in generation prompts
    pub fn register(&self) -> &'static str {
        match self {
            CompositionStyle::Narrative => "short story",
            CompositionStyle::Tale => "fairy tale",
            CompositionStyle::Report => "news report",
            CompositionStyle::Prediction => "prophecy",
        }
    }

    /// Wire name (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionStyle::Narrative => "narrative",
            CompositionStyle::Tale => "tale",
            CompositionStyle::Report => "report",
            CompositionStyle::Prediction => "prediction",
        }
    }
}

/// A short passage generated from a set of successfully enriched words
///
/// Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    /// Row id; 0 until persisted
    #[serde(default)]
    pub id: i64,

    /// Source words, in selection order
    pub words: Vec<String>,

    /// Generated title
    pub title: String,

    /// Passage body
    pub body: String,

    /// Translation of the body
    pub body_translation: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_wire_names() {
        for (style, name) in [
            (CompositionStyle::Narrative, "\"narrative\""),
            (CompositionStyle::Tale, "\"tale\""),
            (CompositionStyle::Report, "\"report\""),
            (CompositionStyle::Prediction, "\"prediction\""),
        ] {
            assert_eq!(serde_json::to_string(&style).unwrap(), name);
        }
    }

    #[test]
    fn test_style_roundtrip() {
        let style: CompositionStyle = serde_json::from_str("\"tale\"").unwrap();
        assert_eq!(style, CompositionStyle::Tale);
        assert_eq!(style.as_str(), "tale");
    }
}
