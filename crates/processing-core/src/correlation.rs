//! Sliding-window correlation between the mouth and eye channels.
//!
//! Chewing moves the mouth without moving the eyes. When both channels
//! rise and fall together the mouth movement is more likely caused by a
//! blink or a head movement, so a high coefficient marks an artifact.

use chewtrack_signal_model::{CorrelationPoint, Sample};

/// Standard deviations below this are treated as zero variance.
const MIN_STD_DEV: f64 = 1e-12;

/// The two channels could not be paired for this cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("channel lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Windowed Pearson correlation over two equal-length series.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationAnalyzer {
    window_size: usize,
}

impl CorrelationAnalyzer {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Slide a window across both series in lockstep and report `|r|` for
    /// each position, stamped with the middle sample of `a`'s window.
    ///
    /// Yields no points when the series are shorter than the window.
    pub fn correlate(
        &self,
        a: &[Sample],
        b: &[Sample],
    ) -> Result<Vec<CorrelationPoint>, CorrelationError> {
        if a.len() != b.len() {
            return Err(CorrelationError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }

        let window = self.window_size;
        if window == 0 || a.len() < window {
            return Ok(Vec::new());
        }

        let a_values: Vec<f64> = a.iter().map(|s| s.value).collect();
        let b_values: Vec<f64> = b.iter().map(|s| s.value).collect();

        let points = (0..=a.len() - window)
            .map(|i| CorrelationPoint {
                value: pearson(&a_values[i..i + window], &b_values[i..i + window])
                    .abs()
                    .min(1.0),
                time_ns: a[i + window / 2].time_ns,
            })
            .collect();

        Ok(points)
    }
}

/// Pearson correlation coefficient of two equal-length windows.
///
/// Returns `0.0` when either window has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let len = n as f64;

    let mean_a = a.iter().sum::<f64>() / len;
    let mean_b = b.iter().sum::<f64>() / len;

    let covariance = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / len;

    let std_dev_a = (a.iter().map(|&x| (x - mean_a).powi(2)).sum::<f64>() / len).sqrt();
    let std_dev_b = (b.iter().map(|&y| (y - mean_b).powi(2)).sum::<f64>() / len).sqrt();

    if std_dev_a < MIN_STD_DEV || std_dev_b < MIN_STD_DEV {
        return 0.0;
    }

    covariance / (std_dev_a * std_dev_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: impl IntoIterator<Item = f64>) -> Vec<Sample> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Sample::new(i as u64 * 33_000_000, v))
            .collect()
    }

    fn sine(len: usize) -> Vec<Sample> {
        series((0..len).map(|i| (i as f64 * 0.2).sin()))
    }

    #[test]
    fn test_identical_series_fully_correlated() {
        let a = sine(40);
        let points = CorrelationAnalyzer::new(30).correlate(&a, &a).unwrap();
        assert_eq!(points.len(), 11);
        for p in &points {
            assert!((p.value - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_inverted_series_reports_absolute_value() {
        let a = sine(30);
        let b = series(a.iter().map(|s| -s.value));
        let points = CorrelationAnalyzer::new(30).correlate(&a, &b).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points[0].value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_stamped_at_window_middle() {
        let a = sine(32);
        let points = CorrelationAnalyzer::new(30).correlate(&a, &a).unwrap();
        let times: Vec<u64> = points.iter().map(|p| p.time_ns).collect();
        assert_eq!(times, vec![a[15].time_ns, a[16].time_ns, a[17].time_ns]);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let a = sine(20);
        let b = sine(19);
        assert_eq!(
            CorrelationAnalyzer::new(30).correlate(&a, &b),
            Err(CorrelationError::LengthMismatch {
                left: 20,
                right: 19
            })
        );
    }

    #[test]
    fn test_zero_variance_window_is_zero() {
        let a = sine(30);
        let flat = series(std::iter::repeat(0.1).take(30));
        let points = CorrelationAnalyzer::new(30).correlate(&a, &flat).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 0.0);
    }

    #[test]
    fn test_short_series_yield_no_points() {
        let a = sine(10);
        assert!(CorrelationAnalyzer::new(30)
            .correlate(&a, &a)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_alternating_series_is_uncorrelated_with_smooth_signal() {
        let a: Vec<f64> = (0..30).map(|i| (i as f64 * 0.2).sin()).collect();
        let b: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert!(pearson(&a, &b).abs() < 0.1);
    }
}
