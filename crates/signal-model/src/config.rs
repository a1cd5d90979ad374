//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Tunables of the chewing-detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum samples retained per channel.
    pub buffer_capacity: usize,

    /// Raw samples required before filtering starts.
    pub warmup_samples: usize,

    /// Cutoff frequency of the adaptive low-pass filter (Hz).
    pub low_pass_cutoff_hz: f64,

    /// Minimum filtered value for a local maximum to count as a peak.
    pub peak_amplitude_threshold: f64,

    /// Samples per correlation window.
    pub correlation_window_size: usize,

    /// Peaks whose correlation reaches this value are rejected as artifacts.
    pub correlation_threshold: f64,

    /// Accepted peaks considered by the rolling frequency estimate.
    pub frequency_window_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 160,
            warmup_samples: 10,
            low_pass_cutoff_hz: 1.0,
            peak_amplitude_threshold: 0.5,
            correlation_window_size: 30,
            correlation_threshold: 0.6,
            frequency_window_size: 5,
        }
    }
}

/// Invalid pipeline option.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },

    #[error("correlation window ({window}) exceeds buffer capacity ({capacity})")]
    WindowExceedsCapacity { window: usize, capacity: usize },
}

impl PipelineConfig {
    /// Check option values, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "buffer_capacity",
            });
        }
        if self.correlation_window_size == 0 {
            return Err(ConfigError::Zero {
                field: "correlation_window_size",
            });
        }
        if self.frequency_window_size == 0 {
            return Err(ConfigError::Zero {
                field: "frequency_window_size",
            });
        }
        if !(self.low_pass_cutoff_hz.is_finite() && self.low_pass_cutoff_hz > 0.0) {
            return Err(ConfigError::NotPositive {
                field: "low_pass_cutoff_hz",
                value: self.low_pass_cutoff_hz,
            });
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(ConfigError::OutOfUnitRange {
                field: "correlation_threshold",
                value: self.correlation_threshold,
            });
        }
        if self.correlation_window_size > self.buffer_capacity {
            return Err(ConfigError::WindowExceedsCapacity {
                window: self.correlation_window_size,
                capacity: self.buffer_capacity,
            });
        }
        Ok(())
    }
}
