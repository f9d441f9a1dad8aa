//! Text-generation service client
//!
//! Talks to an OpenAI-compatible chat-completions endpoint to generate
//! per-word learning material and the session composition. The service
//! is consumed through the `TextGenerator` trait so the pipeline can be
//! exercised against scripted implementations in tests.
//!
//! Failures here are expected, per-word events: transport errors, non-2xx
//! statuses and unparseable model output all surface as `GeneratorError`
//! and never touch persisted state.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::GeneratorSettings;
use crate::models::CompositionStyle;

/// Default timeout for generation requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Token budget for per-word enrichment
const ENRICH_MAX_TOKENS: u32 = 2000;

/// Token budget for composition generation
const COMPOSE_MAX_TOKENS: u32 = 1500;

/// Sampling temperature for both request kinds
const TEMPERATURE: f64 = 0.7;

/// Text-generation failures
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("generation API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The model's reply was not parseable as the expected JSON shape
    #[error("generation response was not valid JSON: {0}")]
    Unparseable(String),

    /// The reply carried no content at all
    #[error("generation response was empty")]
    Empty,
}

/// Abstract contract of the text-generation collaborator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw learning material for one word
    async fn enrich_word(&self, word: &str) -> Result<Value, GeneratorError>;

    /// Generate a raw composition from the given words in the given style
    async fn compose(&self, words: &[String], style: CompositionStyle)
        -> Result<Value, GeneratorError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

/// OpenAI-compatible chat-completions client
pub struct ChatGenerator {
    http_client: Client,
    settings: GeneratorSettings,
}

impl ChatGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            settings,
        }
    }

    /// Send one chat request and return the parsed content JSON
    async fn request_json(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<Value, GeneratorError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.settings.model, "Sending generation request");

        let response = self
            .http_client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = response.json().await?;
        let content = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or(GeneratorError::Empty)?;

        let content = strip_code_fences(content);
        serde_json::from_str(content).map_err(|e| {
            GeneratorError::Unparseable(format!("{} (content: {:.200})", e, content))
        })
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn enrich_word(&self, word: &str) -> Result<Value, GeneratorError> {
        let system = "You are a language-teaching assistant producing detailed \
                      vocabulary study material.";
        let user = format!(
            "Produce complete study material for the word \"{word}\" as a JSON \
             object with these fields:\n\
             1. phonetic: object with \"uk\" and \"us\" transcriptions\n\
             2. pronunciation: syllable breakdown separated by middle dots \
                (e.g. con\u{b7}tem\u{b7}po\u{b7}rary)\n\
             3. part_of_speech: list of grammatical categories\n\
             4. translations: 2-3 common translations into {lang}\n\
             5. common_phrases: 1-3 objects with \"phrase\" and \"translation\"\n\
             6. etymology: object with \"root\" and \"analysis\"\n\
             7. examples: 2 objects with \"sentence\" and \"translation\"\n\
             Reply with the JSON object only.",
            word = word,
            lang = self.settings.target_language,
        );

        self.request_json(system, &user, ENRICH_MAX_TOKENS).await
    }

    async fn compose(
        &self,
        words: &[String],
        style: CompositionStyle,
    ) -> Result<Value, GeneratorError> {
        let register = style.register();
        let system = format!(
            "You are a creative writer producing short, memorable texts in the \
             {register} register for language learners."
        );
        let user = format!(
            "Write a {register} that satisfies all of the following:\n\
             1. It uses every one of these words: {words}\n\
             2. It is short (30-150 words) and easy to memorize\n\
             3. Each word is used in a vivid, memorable way\n\
             Reply as a JSON object: {{\"title\": ..., \"body\": ..., \
             \"body_translation\": <translation into {lang}>}}. \
             Reply with the JSON object only.",
            words = words.join(", "),
            lang = self.settings.target_language,
        );

        self.request_json(&system, &user, COMPOSE_MAX_TOKENS).await
    }
}

/// Strip a markdown code fence around a JSON reply, if present
///
/// Models regularly wrap the requested JSON in ```json ... ``` despite the
/// reply-only instruction.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
