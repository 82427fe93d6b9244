//! Configuration system for chirp.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Sensible defaults built into the binary
//! 2. **User config file** - `~/.config/chirp/config.toml`
//! 3. **Environment variables** - `CHIRP_*` prefix
//! 4. **CLI arguments** - Highest priority, always wins
//!
//! # Example Configuration File
//!
//! ```toml
//! [paths]
//! db = "~/.local/share/chirp/chirp.db"
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Main configuration structure for chirp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path-related configuration.
    pub paths: PathsConfig,
    /// Output formatting configuration.
    pub output: OutputConfig,
}

/// Path configuration for the database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Path to the `SQLite` database file.
    /// Environment variable: `CHIRP_DB`
    pub db: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: text or json.
    pub format: String,

    /// Enable colored output.
    pub colors: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. User config file (`~/.config/chirp/config.toml`)
    /// 3. Compiled defaults
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        config.apply_env_overrides();

        debug!("Configuration loaded: {:?}", config);
        config
    }

    /// Load configuration from a specific file.
    #[must_use]
    pub fn load_from_file(path: &PathBuf) -> Option<Self> {
        if !path.exists() {
            debug!("Config file not found: {}", path.display());
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config from: {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn load_user_config() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("chirp").join("config.toml");
        Self::load_from_file(&config_path)
    }

    /// Merge a higher-priority config into this one. `Some` fields and
    /// non-default values win.
    fn merge(&mut self, other: Self) {
        if other.paths.db.is_some() {
            self.paths.db = other.paths.db;
        }
        let default_output = OutputConfig::default();
        if other.output.format != default_output.format {
            self.output.format = other.output.format;
        }
        if other.output.colors != default_output.colors {
            self.output.colors = other.output.colors;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(db) = std::env::var("CHIRP_DB") {
            self.paths.db = Some(PathBuf::from(db));
        }
        if let Ok(format) = std::env::var("CHIRP_FORMAT") {
            self.output.format = format;
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.output.colors = false;
        }
    }

    /// Resolve the database path: config value or the platform default.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .db
            .clone()
            .unwrap_or_else(crate::default_db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert!(config.paths.db.is_none());
        assert_eq!(config.output.format, "text");
        assert!(config.output.colors);
    }

    #[test]
    fn merge_prefers_set_values() {
        let mut base = Config::default();
        let overlay = Config {
            paths: PathsConfig {
                db: Some(PathBuf::from("/tmp/test.db")),
            },
            output: OutputConfig {
                format: "json".to_string(),
                colors: true,
            },
        };
        base.merge(overlay);
        assert_eq!(base.paths.db, Some(PathBuf::from("/tmp/test.db")));
        assert_eq!(base.output.format, "json");
    }

    #[test]
    fn parses_toml_fragment() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            db = "/data/chirp.db"

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.paths.db, Some(PathBuf::from("/data/chirp.db")));
        assert_eq!(config.output.format, "json");
        assert!(config.output.colors);
    }
}
