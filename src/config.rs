//! Configuration file for `~/.gatorconfig.json`.
//!
//! The file is optional: a missing or empty file yields `Config::default()`.
//! It records which database to use and which user is "logged in".
//! Unknown keys are accepted and logged as warnings.
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".gatorconfig.json";
const DEFAULT_DB_FILE_NAME: &str = ".gator.db";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("HOME environment variable not set")]
    NoHome,
}

// ============================================================================
// Configuration
// ============================================================================

/// Persisted CLI state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite path or `sqlite:` URL. Defaults to `~/.gator.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,

    /// Name of the user commands act on behalf of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
}

fn home_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or(ConfigError::NoHome)
}

impl Config {
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// `~/.gatorconfig.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(home_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Database location: `db_url` when set, `~/.gator.db` otherwise.
    pub fn database_location(&self) -> Result<String, ConfigError> {
        match self.db_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Ok(home_dir()?
                .join(DEFAULT_DB_FILE_NAME)
                .to_string_lossy()
                .into_owned()),
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid JSON → `Err(ConfigError::Parse)` with line/column info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(serde_json::Value::Object(raw)) =
            serde_json::from_str::<serde_json::Value>(&content)
        {
            let known_keys = ["db_url", "current_user_name"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            user = ?config.current_user_name,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Write the configuration atomically.
    ///
    /// Content goes to a temp file in the same directory, is synced, then
    /// renamed over `path`, so a crash never leaves a half-written config.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_vec_pretty(self)?;

        use std::time::{SystemTime, UNIX_EPOCH};
        let random_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

        let write_temp = || -> std::io::Result<()> {
            let mut temp_file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;
            temp_file.write_all(&json)?;
            temp_file.sync_all()?;
            Ok(())
        };

        if let Err(e) = write_temp() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ConfigError::Io(e));
        }

        // On Windows, rename fails if destination exists, so remove it first
        #[cfg(windows)]
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(ConfigError::Io(e));
            }
        }

        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ConfigError::Io(e));
        }

        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Record `name` as the current user and persist.
    ///
    /// `self` is only updated once the file has been written, so a failed
    /// save leaves memory and disk agreeing on the previous user.
    pub fn set_user(&mut self, name: &str, path: &Path) -> Result<(), ConfigError> {
        let updated = Config {
            current_user_name: Some(name.to_string()),
            ..self.clone()
        };
        updated.save(path)?;
        *self = updated;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gator_config_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.db_url.is_none());
        assert!(config.current_user_name.is_none());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/gator_test_nonexistent_config.json");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let dir = scratch_dir("whitespace");
        let path = dir.join("config.json");
        std::fs::write(&path, "  \n ").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = scratch_dir("full");
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r#"{"db_url": "/var/lib/gator.db", "current_user_name": "kahya"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.db_url.as_deref(), Some("/var/lib/gator.db"));
        assert_eq!(config.current_user_name.as_deref(), Some("kahya"));
        assert_eq!(config.database_location().unwrap(), "/var/lib/gator.db");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = scratch_dir("unknown");
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"current_user_name": "lane", "theme": "dark"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.current_user_name.as_deref(), Some("lane"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_json_returns_error() {
        let dir = scratch_dir("invalid");
        let path = dir.join("config.json");
        std::fs::write(&path, "{\"db_url\": ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid JSON"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = scratch_dir("wrongtype");
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"current_user_name": 42}"#).unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = scratch_dir("too_large");
        let path = dir.join("config.json");
        std::fs::write(&path, " ".repeat(64 * 1024 + 1)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_set_user_persists() {
        let dir = scratch_dir("set_user");
        let path = dir.join("config.json");
        let mut config = Config {
            db_url: Some("gator.db".into()),
            current_user_name: None,
        };

        config.set_user("holgith", &path).unwrap();
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.current_user_name.as_deref(), Some("holgith"));
        assert_eq!(reloaded.db_url.as_deref(), Some("gator.db"));

        // Second save replaces the file rather than failing on create_new
        config.set_user("allan", &path).unwrap();
        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.current_user_name.as_deref(), Some("allan"));

        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_save_keeps_previous_user() {
        let dir = scratch_dir("failed_save");
        let path = dir.join("missing_subdir").join("config.json");
        let mut config = Config {
            db_url: None,
            current_user_name: Some("kahya".into()),
        };

        assert!(matches!(
            config.set_user("holgith", &path),
            Err(ConfigError::Io(_))
        ));
        assert_eq!(config.current_user_name.as_deref(), Some("kahya"));
        assert!(!path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unset_fields_not_written() {
        let dir = scratch_dir("skip_none");
        let path = dir.join("config.json");
        Config::default().save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.trim(), "{}");

        std::fs::remove_dir_all(&dir).ok();
    }
}
