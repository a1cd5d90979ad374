//! Sample, peak, and correlation types produced by the pipeline.

use serde::{Deserialize, Serialize};

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// One scalar measurement and its capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,

    /// Monotonic nanoseconds since session start.
    #[serde(rename = "t")]
    pub time_ns: TimestampNs,
}

impl Sample {
    pub fn new(time_ns: TimestampNs, value: f64) -> Self {
        Self { value, time_ns }
    }

    /// Timestamp as fractional seconds since session start.
    pub fn time_secs(&self) -> f64 {
        self.time_ns as f64 / 1_000_000_000.0
    }

    /// Signed seconds from `earlier` to `self`.
    pub fn secs_since(&self, earlier: &Sample) -> f64 {
        (self.time_ns as i128 - earlier.time_ns as i128) as f64 / 1_000_000_000.0
    }
}

/// A detected local maximum annotated with the correlation found at its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub value: f64,

    #[serde(rename = "t")]
    pub time_ns: TimestampNs,

    /// Absolute correlation coefficient at this timestamp, if one was computed.
    pub correlation: Option<f64>,
}

impl Peak {
    pub fn new(sample: Sample, correlation: Option<f64>) -> Self {
        Self {
            value: sample.value,
            time_ns: sample.time_ns,
            correlation,
        }
    }

    /// Correlation formatted for display: two decimals, or empty when unmatched.
    pub fn correlation_text(&self) -> String {
        self.correlation
            .map(|c| format!("{c:.2}"))
            .unwrap_or_default()
    }

    pub fn sample(&self) -> Sample {
        Sample::new(self.time_ns, self.value)
    }
}

/// One sliding-window correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPoint {
    /// Absolute Pearson coefficient in `[0.0, 1.0]`.
    pub value: f64,

    /// Timestamp of the window's middle sample.
    #[serde(rename = "t")]
    pub time_ns: TimestampNs,
}

/// Detected peaks split by artifact classification.
///
/// Re-derived in full on every cycle; the two sets are disjoint and together
/// hold every peak found in the current filtered buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPeaks {
    /// Peaks accepted as chewing events.
    pub filtered: Vec<Peak>,

    /// Peaks rejected as eye-motion or head-movement artifacts.
    pub removed: Vec<Peak>,
}

impl ClassifiedPeaks {
    pub fn total(&self) -> usize {
        self.filtered.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All peaks in time order.
    pub fn all(&self) -> Vec<Peak> {
        let mut peaks: Vec<Peak> = self
            .filtered
            .iter()
            .chain(self.removed.iter())
            .cloned()
            .collect();
        peaks.sort_by_key(|p| p.time_ns);
        peaks
    }
}
