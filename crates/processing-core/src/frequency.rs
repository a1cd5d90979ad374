//! Rolling chewing-frequency estimate.

use chewtrack_signal_model::Peak;

/// Mean instantaneous frequency over the most recent accepted peaks.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyEstimator {
    window: usize,
}

impl FrequencyEstimator {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Estimate in Hz from the last `window` peaks, or `None` when fewer
    /// than two usable peaks exist.
    pub fn estimate(&self, peaks: &[Peak]) -> Option<f64> {
        average_frequency(peaks, self.window)
    }
}

/// Arithmetic mean of `1 / Δt` over consecutive pairs of the last `window`
/// peaks. Pairs whose timestamps do not advance are ignored.
pub fn average_frequency(peaks: &[Peak], window: usize) -> Option<f64> {
    let start = peaks.len().saturating_sub(window);
    let recent = &peaks[start..];

    let frequencies: Vec<f64> = recent
        .windows(2)
        .filter_map(|pair| {
            let dt = (pair[1].time_ns as i128 - pair[0].time_ns as i128) as f64 / 1_000_000_000.0;
            (dt > 0.0).then(|| 1.0 / dt)
        })
        .collect();

    if frequencies.is_empty() {
        return None;
    }
    Some(frequencies.iter().sum::<f64>() / frequencies.len() as f64)
}
