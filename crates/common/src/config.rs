//! Application configuration.

use std::path::{Path, PathBuf};

use chewtrack_signal_model::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ChewError, ChewResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Signal-processing options.
    pub pipeline: PipelineConfig,

    /// Monitoring-session defaults.
    pub session: SessionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default monitoring-session parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Frames that may wait for the pipeline before new triggers are dropped.
    pub queue_capacity: usize,

    /// Whether sessions record one line per cycle by default.
    pub record_cycles: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "chewtrack_processing_core=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            queue_capacity: 4,
            record_cycles: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> ChewResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChewError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> ChewResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ChewResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("chewtrack").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("chewtrack_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.pipeline.buffer_capacity = 200;
        config.session.record_cycles = true;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.pipeline.buffer_capacity, 200);
        assert!(loaded.session.record_cycles);
        assert_eq!(loaded.logging.level, "info");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("chewtrack_definitely_missing.json");
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ChewError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_rejects_invalid_pipeline() {
        let dir = std::env::temp_dir().join("chewtrack_test_config_invalid");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"pipeline":{"frequency_window_size":0}}"#).unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ChewError::Config { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
