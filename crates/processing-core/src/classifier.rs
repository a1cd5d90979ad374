//! Peak classification into chewing events and artifacts.

use std::collections::HashMap;

use chewtrack_signal_model::{ClassifiedPeaks, CorrelationPoint, Peak, Sample, TimestampNs};

/// Splits peaks by the mouth/eye correlation found at their timestamp.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactClassifier {
    threshold: f64,
}

impl ArtifactClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify every peak in `peaks`.
    ///
    /// A peak is rejected only when a coefficient with exactly the same
    /// timestamp exists and reaches the threshold. Unmatched peaks, and all
    /// peaks when `correlations` is `None`, are accepted.
    pub fn classify(
        &self,
        peaks: &[Sample],
        correlations: Option<&[CorrelationPoint]>,
    ) -> ClassifiedPeaks {
        let mut by_time: HashMap<TimestampNs, f64> = HashMap::new();
        for point in correlations.unwrap_or_default() {
            by_time.entry(point.time_ns).or_insert(point.value);
        }

        let mut result = ClassifiedPeaks::default();
        for &sample in peaks {
            let correlation = by_time.get(&sample.time_ns).copied();
            let peak = Peak::new(sample, correlation);
            match correlation {
                Some(c) if c >= self.threshold => result.removed.push(peak),
                _ => result.filtered.push(peak),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(time_ns: u64, value: f64) -> CorrelationPoint {
        CorrelationPoint { value, time_ns }
    }

    #[test]
    fn test_splits_on_threshold() {
        let classifier = ArtifactClassifier::new(0.6);
        let peaks = vec![
            Sample::new(100, 1.0),
            Sample::new(200, 1.0),
            Sample::new(300, 1.0),
        ];
        let correlations = vec![point(100, 0.59), point(200, 0.6), point(300, 0.95)];

        let result = classifier.classify(&peaks, Some(correlations.as_slice()));
        let kept: Vec<u64> = result.filtered.iter().map(|p| p.time_ns).collect();
        let dropped: Vec<u64> = result.removed.iter().map(|p| p.time_ns).collect();
        assert_eq!(kept, vec![100]);
        assert_eq!(dropped, vec![200, 300]);
        assert_eq!(result.removed[1].correlation_text(), "0.95");
    }

    #[test]
    fn test_unmatched_peak_is_accepted_without_text() {
        let classifier = ArtifactClassifier::new(0.6);
        let peaks = vec![Sample::new(150, 1.0)];
        let correlations = vec![point(100, 0.99)];

        let result = classifier.classify(&peaks, Some(correlations.as_slice()));
        assert_eq!(result.filtered.len(), 1);
        assert!(result.removed.is_empty());
        assert_eq!(result.filtered[0].correlation_text(), "");
    }

    #[test]
    fn test_unavailable_correlation_accepts_everything() {
        let classifier = ArtifactClassifier::new(0.6);
        let peaks = vec![Sample::new(100, 1.0), Sample::new(200, 2.0)];

        let result = classifier.classify(&peaks, None);
        assert_eq!(result.filtered.len(), 2);
        assert!(result.removed.is_empty());
    }

    proptest! {
        #[test]
        fn classification_partitions_peaks(
            peak_times in proptest::collection::btree_set(0u64..500, 0..40),
            coefficients in proptest::collection::vec((0u64..500, 0.0f64..=1.0), 0..60),
            threshold in 0.0f64..=1.0,
        ) {
            let peaks: Vec<Sample> = peak_times.iter().map(|&t| Sample::new(t, 1.0)).collect();
            let correlations: Vec<CorrelationPoint> =
                coefficients.iter().map(|&(t, v)| point(t, v)).collect();

            let result = ArtifactClassifier::new(threshold).classify(&peaks, Some(correlations.as_slice()));

            prop_assert_eq!(result.total(), peaks.len());
            for peak in &result.filtered {
                prop_assert!(!result.removed.iter().any(|r| r.time_ns == peak.time_ns));
            }
            let mut union: Vec<u64> = result.all().iter().map(|p| p.time_ns).collect();
            union.sort_unstable();
            prop_assert_eq!(union, peak_times.into_iter().collect::<Vec<_>>());
        }
    }
}
