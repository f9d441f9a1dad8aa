//! Content normalization for model-generated payloads
//!
//! The generation service returns whatever JSON the model felt like writing:
//! fields go missing, strings appear where lists were asked for, objects
//! collapse into bare strings. This module is the single choke point that
//! turns such a payload into an `EnrichmentRecord` with every field present
//! and type-correct. It is a total function: no input, however malformed,
//! produces an error or a partially-normalized record.
//!
//! Per-field fallback policy:
//! - scalar where a list was expected: promoted to a one-element list
//! - list with mixed scalar types: stringified element-wise
//! - bare string where a pair object was expected: becomes the first
//!   component, second component empty
//! - anything unclassifiable: the field's empty default

use serde_json::Value;

use crate::models::{Composition, EnrichmentRecord, Etymology, ExamplePair, Phonetic, PhrasePair};

/// Maximum number of example sentences kept per word
pub const MAX_EXAMPLES: usize = 4;

/// Recognized spellings of the British phonetic key
const UK_KEYS: &[&str] = &["uk", "british", "bre", "en-gb"];

/// Recognized spellings of the American phonetic key
const US_KEYS: &[&str] = &["us", "american", "ame", "en-us"];

/// Normalize a raw enrichment payload into a fully-populated record
pub fn normalize_enrichment(raw: &Value) -> EnrichmentRecord {
    let Some(map) = raw.as_object() else {
        return EnrichmentRecord::default();
    };

    EnrichmentRecord {
        phonetic: normalize_phonetic(map.get("phonetic")),
        syllables: scalar_string(map.get("pronunciation")),
        parts_of_speech: string_list(map.get("part_of_speech")),
        translations: string_list(map.get("translations")),
        phrases: pair_list(map.get("common_phrases"), &["phrase"], &["translation"])
            .into_iter()
            .map(|(phrase, translation)| PhrasePair { phrase, translation })
            .collect(),
        etymology: normalize_etymology(map.get("etymology")),
        examples: pair_list(
            map.get("examples"),
            &["sentence", "example", "english"],
            &["translation", "chinese"],
        )
        .into_iter()
        .take(MAX_EXAMPLES)
        .map(|(sentence, translation)| ExamplePair { sentence, translation })
        .collect(),
    }
}

/// Normalize a raw composition payload
///
/// Returns the composition fields with the same defaulting policy. The
/// caller decides what an empty body means (the pipeline treats it as a
/// failed generation, since there is nothing to persist).
pub fn normalize_composition(
    raw: &Value,
    words: &[String],
    created_at: chrono::DateTime<chrono::Utc>,
) -> Composition {
    let title = raw
        .get("title")
        .map(scalar_string_value)
        .unwrap_or_default();
    let body = first_string(raw, &["body", "english_content"]);
    let body_translation = first_string(raw, &["body_translation", "chinese_translation"]);

    Composition {
        id: 0,
        words: words.to_vec(),
        title,
        body,
        body_translation,
        created_at,
    }
}

/// Phonetic field: string broadcasts to both regions; map is matched per
/// recognized key spellings; anything else yields empty strings.
fn normalize_phonetic(value: Option<&Value>) -> Phonetic {
    match value {
        Some(Value::String(s)) => Phonetic {
            uk: s.clone(),
            us: s.clone(),
        },
        Some(Value::Object(map)) => {
            let mut phonetic = Phonetic::default();
            for (key, entry) in map {
                let key = key.to_ascii_lowercase();
                let text = scalar_string_value(entry);
                if text.is_empty() {
                    continue;
                }
                if UK_KEYS.contains(&key.as_str()) {
                    phonetic.uk = text;
                } else if US_KEYS.contains(&key.as_str()) {
                    phonetic.us = text;
                }
            }
            phonetic
        }
        _ => Phonetic::default(),
    }
}

/// Etymology field: object with root/analysis, or a bare string treated as
/// the analysis.
fn normalize_etymology(value: Option<&Value>) -> Etymology {
    match value {
        Some(Value::String(s)) => Etymology {
            root: String::new(),
            analysis: s.clone(),
        },
        Some(Value::Object(map)) => Etymology {
            root: map.get("root").map(scalar_string_value).unwrap_or_default(),
            analysis: map
                .get("analysis")
                .map(scalar_string_value)
                .unwrap_or_default(),
        },
        _ => Etymology::default(),
    }
}

/// List-shaped field: scalar promotes to a one-element list, list entries
/// are stringified element-wise (non-scalar entries are skipped).
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_string_value)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(v) => {
            let s = scalar_string_value(v);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
        None => Vec::new(),
    }
}

/// Pair-list field: entries may be objects (first key alias found wins per
/// component) or bare strings (second component empty). Non-list input
/// yields an empty list.
fn pair_list(
    value: Option<&Value>,
    first_keys: &[&str],
    second_keys: &[&str],
) -> Vec<(String, String)> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some((s.clone(), String::new())),
            Value::Object(map) => {
                let first = first_keys
                    .iter()
                    .find_map(|k| map.get(*k))
                    .map(scalar_string_value)
                    .unwrap_or_default();
                let second = second_keys
                    .iter()
                    .find_map(|k| map.get(*k))
                    .map(scalar_string_value)
                    .unwrap_or_default();
                if first.is_empty() && second.is_empty() {
                    None
                } else {
                    Some((first, second))
                }
            }
            _ => None,
        })
        .collect()
}

/// Stringify a scalar; objects and arrays yield empty
fn scalar_string(value: Option<&Value>) -> String {
    value.map(scalar_string_value).unwrap_or_default()
}

fn scalar_string_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// First non-empty string among the given key aliases
fn first_string(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .map(scalar_string_value)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_yields_all_defaults() {
        let record = normalize_enrichment(&json!({}));
        assert_eq!(record, EnrichmentRecord::default());
        assert!(record.is_empty());
    }

    #[test]
    fn test_non_object_input_yields_all_defaults() {
        for raw in [json!(null), json!("just text"), json!(42), json!([1, 2])] {
            assert_eq!(normalize_enrichment(&raw), EnrichmentRecord::default());
        }
    }

    #[test]
    fn test_phonetic_string_broadcasts_to_both_regions() {
        let record = normalize_enrichment(&json!({"phonetic": "/kənˈtempəreri/"}));
        assert_eq!(record.phonetic.uk, "/kənˈtempəreri/");
        assert_eq!(record.phonetic.us, "/kənˈtempəreri/");
    }

    #[test]
    fn test_phonetic_map_accepts_key_variants() {
        let record = normalize_enrichment(&json!({
            "phonetic": {"UK": "/a/", "American": "/b/"}
        }));
        assert_eq!(record.phonetic.uk, "/a/");
        assert_eq!(record.phonetic.us, "/b/");

        let record = normalize_enrichment(&json!({
            "phonetic": {"British": "/a/", "us": "/b/"}
        }));
        assert_eq!(record.phonetic.uk, "/a/");
        assert_eq!(record.phonetic.us, "/b/");
    }

    #[test]
    fn test_phonetic_unknown_shape_defaults_to_empty() {
        let record = normalize_enrichment(&json!({"phonetic": [1, 2, 3]}));
        assert_eq!(record.phonetic, Phonetic::default());

        let record = normalize_enrichment(&json!({"phonetic": {"de": "/x/"}}));
        assert_eq!(record.phonetic, Phonetic::default());
    }

    #[test]
    fn test_scalar_promotes_to_one_element_list() {
        let record = normalize_enrichment(&json!({
            "part_of_speech": "adjective",
            "translations": "当代的"
        }));
        assert_eq!(record.parts_of_speech, vec!["adjective"]);
        assert_eq!(record.translations, vec!["当代的"]);
    }

    #[test]
    fn test_mixed_type_list_stringifies_element_wise() {
        let record = normalize_enrichment(&json!({
            "translations": ["one", 2, true, {"nested": "skipped"}]
        }));
        assert_eq!(record.translations, vec!["one", "2", "true"]);
    }

    #[test]
    fn test_list_field_wrong_shape_yields_empty() {
        let record = normalize_enrichment(&json!({
            "part_of_speech": {"a": 1},
            "translations": null
        }));
        assert!(record.parts_of_speech.is_empty());
        assert!(record.translations.is_empty());
    }

    #[test]
    fn test_phrases_accept_objects_and_bare_strings() {
        let record = normalize_enrichment(&json!({
            "common_phrases": [
                {"phrase": "contemporary art", "translation": "当代艺术"},
                "contemporary dance",
            ]
        }));
        assert_eq!(record.phrases.len(), 2);
        assert_eq!(record.phrases[0].phrase, "contemporary art");
        assert_eq!(record.phrases[0].translation, "当代艺术");
        assert_eq!(record.phrases[1].phrase, "contemporary dance");
        assert_eq!(record.phrases[1].translation, "");
    }

    #[test]
    fn test_phrases_non_list_yields_empty() {
        let record = normalize_enrichment(&json!({"common_phrases": "not a list"}));
        assert!(record.phrases.is_empty());
    }

    #[test]
    fn test_etymology_accepts_object_or_bare_string() {
        let record = normalize_enrichment(&json!({
            "etymology": {"root": "tempor", "analysis": "con- + tempor + -ary"}
        }));
        assert_eq!(record.etymology.root, "tempor");
        assert_eq!(record.etymology.analysis, "con- + tempor + -ary");

        let record = normalize_enrichment(&json!({"etymology": "from Latin tempus"}));
        assert_eq!(record.etymology.root, "");
        assert_eq!(record.etymology.analysis, "from Latin tempus");

        let record = normalize_enrichment(&json!({"etymology": 17}));
        assert_eq!(record.etymology, Etymology::default());
    }

    #[test]
    fn test_examples_truncated_to_maximum() {
        let sentences: Vec<_> = (0..10).map(|i| json!(format!("sentence {}", i))).collect();
        let record = normalize_enrichment(&json!({"examples": sentences}));
        assert_eq!(record.examples.len(), MAX_EXAMPLES);
        assert_eq!(record.examples[0].sentence, "sentence 0");
    }

    #[test]
    fn test_example_key_aliases() {
        let record = normalize_enrichment(&json!({
            "examples": [
                {"sentence": "A modern take.", "translation": "现代的手法。"},
                {"example": "Quite contemporary.", "chinese": "相当当代。"},
            ]
        }));
        assert_eq!(record.examples[0].sentence, "A modern take.");
        assert_eq!(record.examples[1].sentence, "Quite contemporary.");
        assert_eq!(record.examples[1].translation, "相当当代。");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let record = normalize_enrichment(&json!({
            "confidence": 0.93,
            "reasoning": "because",
            "translations": ["only this counts"]
        }));
        assert_eq!(record.translations, vec!["only this counts"]);
        assert!(record.parts_of_speech.is_empty());
    }

    #[test]
    fn test_syllables_from_pronunciation_key() {
        let record = normalize_enrichment(&json!({"pronunciation": "con·tem·po·rary"}));
        assert_eq!(record.syllables, "con·tem·po·rary");

        let record = normalize_enrichment(&json!({"pronunciation": ["a", "b"]}));
        assert_eq!(record.syllables, "");
    }

    #[test]
    fn test_full_well_formed_payload() {
        let record = normalize_enrichment(&json!({
            "phonetic": {"uk": "/kənˈtemp(ə)rəri/", "us": "/kənˈtempəreri/"},
            "pronunciation": "con·tem·po·rary",
            "part_of_speech": ["adjective", "noun"],
            "translations": ["当代的", "同时代的"],
            "common_phrases": [{"phrase": "contemporary art", "translation": "当代艺术"}],
            "etymology": {"root": "tempor", "analysis": "con- (together) + tempor (time)"},
            "examples": [{"sentence": "Contemporary music.", "translation": "当代音乐。"}]
        }));
        assert_eq!(record.phonetic.us, "/kənˈtempəreri/");
        assert_eq!(record.parts_of_speech.len(), 2);
        assert_eq!(record.phrases.len(), 1);
        assert_eq!(record.examples.len(), 1);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_composition_normalization_and_aliases() {
        let now = chrono::Utc::now();
        let words = vec!["alpha".to_string(), "beta".to_string()];

        let comp = normalize_composition(
            &json!({
                "title": "The Tale",
                "english_content": "Once upon a time...",
                "chinese_translation": "从前……"
            }),
            &words,
            now,
        );
        assert_eq!(comp.title, "The Tale");
        assert_eq!(comp.body, "Once upon a time...");
        assert_eq!(comp.body_translation, "从前……");
        assert_eq!(comp.words, words);

        // Missing body normalizes to empty (pipeline treats as failure)
        let comp = normalize_composition(&json!({"title": "t"}), &words, now);
        assert!(comp.body.is_empty());
    }
}
