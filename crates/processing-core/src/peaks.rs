//! Local-maximum peak detection over the filtered buffer.

use chewtrack_signal_model::Sample;

/// Three-point peak detector.
///
/// Index `i` is a peak when `v[i-1] < v[i] > v[i+1]` and `v[i]` is strictly
/// above the amplitude threshold. Plateaus and shoulders
/// (`v[i-1] == v[i]` or `v[i] == v[i+1]`) are never peaks, and the first
/// and last samples are never eligible.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    threshold: f64,
}

impl PeakDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Indices of all peaks in `samples`, ascending.
    pub fn detect(&self, samples: &[Sample]) -> Vec<usize> {
        find_peaks(samples, self.threshold)
    }

    /// The peak samples themselves, in time order.
    pub fn detect_samples(&self, samples: &[Sample]) -> Vec<Sample> {
        self.detect(samples).into_iter().map(|i| samples[i]).collect()
    }
}

/// See [`PeakDetector`].
pub fn find_peaks(samples: &[Sample], threshold: f64) -> Vec<usize> {
    samples
        .windows(3)
        .enumerate()
        .filter(|(_, w)| {
            let (prev, curr, next) = (w[0].value, w[1].value, w[2].value);
            curr > prev && curr > next && curr > threshold
        })
        .map(|(i, _)| i + 1)
        .collect()
}
