//! Configuration loading and data directory resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "LEXIDECK_DATA_DIR";

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "lexideck.db";

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `LEXIDECK_DATA_DIR` environment variable
/// 3. `data_dir` key in the TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = config_file_path() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return PathBuf::from(data_dir);
                }
            }
        }
    }

    // Priority 4: OS-dependent default
    default_data_dir()
}

/// Path to the SQLite database inside a resolved data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Get the configuration file path for the platform
pub fn config_file_path() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("lexideck").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lexideck"))
        .unwrap_or_else(|| PathBuf::from("./lexideck_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let dir = resolve_data_dir(Some("/tmp/lexideck-test"));
        assert_eq!(dir, PathBuf::from("/tmp/lexideck-test"));
    }

    #[test]
    fn test_database_path_appends_file_name() {
        let db = database_path(std::path::Path::new("/srv/lexideck"));
        assert_eq!(db, PathBuf::from("/srv/lexideck/lexideck.db"));
    }

    #[test]
    fn test_default_resolution_yields_some_path() {
        // Without CLI arg or env the resolver must still produce a usable path
        let dir = resolve_data_dir(None);
        assert!(!dir.as_os_str().is_empty());
    }
}
