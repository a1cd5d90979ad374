//! Adaptive single-pole low-pass filter.
//!
//! The filter has no fixed clock. Its sample rate is re-derived on every
//! step from the gap between the incoming sample and the previous one, so
//! irregular provider cadence changes the smoothing weight automatically.

use chewtrack_signal_model::Sample;

/// Result of filtering one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStep {
    /// The filtered sample, stamped with the incoming sample's time.
    pub sample: Sample,

    /// Sample rate observed for this step (Hz).
    pub sample_rate_hz: f64,
}

/// Exponential low-pass filter with a cadence-derived time constant.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveLowPassFilter {
    cutoff_hz: f64,
}

impl AdaptiveLowPassFilter {
    pub fn new(cutoff_hz: f64) -> Self {
        Self { cutoff_hz }
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    /// Filter `incoming` against the previous output `prev`.
    ///
    /// Returns `None` when the timestamps do not advance, in which case the
    /// sample must not be filtered.
    pub fn step(&self, prev: &Sample, incoming: &Sample) -> Option<FilterStep> {
        let sample_rate_hz = observed_sample_rate(prev, incoming)?;
        let value = low_pass(prev.value, incoming.value, self.cutoff_hz, sample_rate_hz);
        Some(FilterStep {
            sample: Sample::new(incoming.time_ns, value),
            sample_rate_hz,
        })
    }
}

/// `1 / Δt` between two samples, or `None` if `Δt <= 0`.
pub fn observed_sample_rate(prev: &Sample, incoming: &Sample) -> Option<f64> {
    let dt = incoming.secs_since(prev);
    if dt <= 0.0 {
        return None;
    }
    Some(1.0 / dt)
}

/// One step of the RC low-pass:
///
/// `alpha = dt / (dt + RC)` with `RC = 1 / (2π·cutoff)` and `dt = 1 / rate`,
/// then `output = alpha * value + (1 - alpha) * prev`.
pub fn low_pass(prev: f64, value: f64, cutoff_hz: f64, sample_rate_hz: f64) -> f64 {
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
    let dt = 1.0 / sample_rate_hz;
    let alpha = dt / (dt + rc);

    alpha * value + (1.0 - alpha) * prev
}
