//! Error types shared across chewtrack crates.

use std::path::PathBuf;

use chewtrack_signal_model::ConfigError;

/// Top-level error type for chewtrack operations.
#[derive(Debug, thiserror::Error)]
pub enum ChewError {
    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Landmark provider error: {message}")]
    Provider { message: String },

    #[error("Recording error: {message}")]
    Recording { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ChewError.
pub type ChewResult<T> = Result<T, ChewError>;

impl ChewError {
    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            message: msg.into(),
        }
    }

    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

impl From<ConfigError> for ChewError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: ChewError = ConfigError::Zero {
            field: "buffer_capacity",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: buffer_capacity must be greater than zero"
        );
    }
}
