//! Configuration resolution for lexideck-study
//!
//! Generator settings are resolved with Database → ENV → TOML priority:
//! the settings table is authoritative (it can be changed at runtime),
//! environment variables cover deployment, and the TOML config file is the
//! installation default.

use sqlx::SqlitePool;
use tracing::{info, warn};
use lexideck_common::{Error, Result};

/// Settings for the text-generation endpoint
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Full chat-completions URL, e.g. `https://host/v1/chat/completions`
    pub api_url: String,

    /// Bearer token for the endpoint
    pub api_key: String,

    /// Model name sent in the request body
    pub model: String,

    /// Language translations are produced in
    pub target_language: String,
}

/// Default translation language when none is configured
const DEFAULT_TARGET_LANGUAGE: &str = "Chinese";

/// Resolve generator settings from the 3-tier configuration
pub async fn resolve_generator_settings(db: &SqlitePool) -> Result<GeneratorSettings> {
    let api_url = resolve_value(db, "generator_api_url", "LEXIDECK_API_URL", "api_url").await?;
    let api_key = resolve_value(db, "generator_api_key", "LEXIDECK_API_KEY", "api_key").await?;
    let model = resolve_value(db, "generator_model", "LEXIDECK_MODEL", "model").await?;

    let target_language = resolve_value(
        db,
        "generator_target_language",
        "LEXIDECK_TARGET_LANGUAGE",
        "target_language",
    )
    .await
    .unwrap_or_else(|_| DEFAULT_TARGET_LANGUAGE.to_string());

    Ok(GeneratorSettings {
        api_url,
        api_key,
        model,
        target_language,
    })
}

/// Resolve one value: settings table → environment variable → TOML key
async fn resolve_value(
    db: &SqlitePool,
    setting_key: &str,
    env_var: &str,
    toml_key: &str,
) -> Result<String> {
    let db_value = crate::db::settings::get_setting(db, setting_key).await?;
    let env_value = std::env::var(env_var).ok().filter(|v| !v.is_empty());
    let toml_value = read_toml_key(toml_key);

    let mut sources = Vec::new();
    if db_value.is_some() {
        sources.push("database");
    }
    if env_value.is_some() {
        sources.push("environment");
    }
    if toml_value.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            setting_key,
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(value) = db_value {
        info!("{} loaded from database", setting_key);
        return Ok(value);
    }
    if let Some(value) = env_value {
        info!("{} loaded from environment variable", setting_key);
        return Ok(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", setting_key);
        return Ok(value);
    }

    Err(Error::Config(format!(
        "{} not configured. Set the '{}' setting, the {} environment variable, \
         or the '{}' key in the config file.",
        setting_key, setting_key, env_var, toml_key
    )))
}

/// Read one string key from the config file, if the file exists
fn read_toml_key(key: &str) -> Option<String> {
    let path = lexideck_common::config::config_file_path().ok()?;
    let content = std::fs::read_to_string(path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
