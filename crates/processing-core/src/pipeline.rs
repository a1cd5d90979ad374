//! Per-cycle pipeline transition.
//!
//! # Cycle
//!
//! 1. **Warm-up:** Until `warmup_samples` raw samples exist, append the
//!    frame's eye distance (if any) and stop here.
//! 2. **Filter:** Low-pass the mouth sample against the newest filtered
//!    (or raw) sample; skip the rest when timestamps do not advance.
//! 3. **Eye:** Append the frame's eye distance, if any.
//! 4. **Peaks:** Find local maxima in the filtered buffer.
//! 5. **Correlate:** Windowed correlation over the filtered and eye
//!    samples that share a timestamp.
//! 6. **Classify:** Split peaks into accepted and rejected.
//! 7. **Raw:** Append the raw mouth sample.
//! 8. **Frequency:** Re-estimate from the accepted peaks.
//!
//! [`ChewingPipeline::advance`] consumes the previous [`PipelineState`] and
//! returns the next one. Callers install the returned state as a whole, so
//! a reader never observes a half-applied cycle.

use std::collections::HashMap;

use chewtrack_common::error::ChewResult;
use chewtrack_signal_model::{ClassifiedPeaks, LandmarkFrame, PipelineConfig, Sample, TimestampNs};
use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::classifier::ArtifactClassifier;
use crate::correlation::CorrelationAnalyzer;
use crate::frequency::FrequencyEstimator;
use crate::low_pass::AdaptiveLowPassFilter;
use crate::peaks::PeakDetector;

/// The three histories kept by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Mouth distance as reported by the provider.
    Raw,
    /// Mouth distance after the low-pass filter.
    Filtered,
    /// Eye-point distance.
    Eye,
}

/// What the most recent cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// No cycle has run yet.
    Idle,
    /// The frame had no mouth measurement; nothing changed.
    MissingSample,
    /// Raw history is still below the warm-up count.
    WarmingUp,
    /// The frame's timestamp did not advance; filtering was skipped.
    StaleTimestamp,
    /// Full pass completed.
    Processed {
        /// Whether at least one correlation window of paired mouth/eye
    /// samples was available.
        correlation_available: bool,
    },
}

/// Everything a monitoring session owns between cycles.
#[derive(Debug, Clone)]
pub struct PipelineState {
    raw: SampleBuffer,
    filtered: SampleBuffer,
    eye: SampleBuffer,
    sample_rate_hz: Option<f64>,
    last_filtered: Option<Sample>,
    peaks: ClassifiedPeaks,
    frequency_hz: Option<f64>,
    status: CycleStatus,
    cycles: u64,
}

impl PipelineState {
    /// Fresh state with every channel capped at `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            raw: SampleBuffer::new(capacity),
            filtered: SampleBuffer::new(capacity),
            eye: SampleBuffer::new(capacity),
            sample_rate_hz: None,
            last_filtered: None,
            peaks: ClassifiedPeaks::default(),
            frequency_hz: None,
            status: CycleStatus::Idle,
            cycles: 0,
        }
    }

    /// Append to one channel, evicting its oldest sample on overflow.
    pub fn push(&mut self, channel: Channel, sample: Sample) {
        match channel {
            Channel::Raw => self.raw.push(sample),
            Channel::Filtered => self.filtered.push(sample),
            Channel::Eye => self.eye.push(sample),
        }
    }

    pub fn buffer(&self, channel: Channel) -> &SampleBuffer {
        match channel {
            Channel::Raw => &self.raw,
            Channel::Filtered => &self.filtered,
            Channel::Eye => &self.eye,
        }
    }

    pub fn sample_rate_hz(&self) -> Option<f64> {
        self.sample_rate_hz
    }

    pub fn last_filtered(&self) -> Option<Sample> {
        self.last_filtered
    }

    pub fn peaks(&self) -> &ClassifiedPeaks {
        &self.peaks
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        self.frequency_hz
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    /// Number of frames that changed the buffers.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Read-only copy for consumers outside the session.
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            raw: self.raw.snapshot(),
            filtered: self.filtered.snapshot(),
            eye: self.eye.snapshot(),
            sample_rate_hz: self.sample_rate_hz,
            last_filtered: self.last_filtered,
            peaks: self.peaks.clone(),
            frequency_hz: self.frequency_hz,
            status: self.status,
            cycles: self.cycles,
        }
    }
}

/// Query surface handed to display and recording consumers.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub raw: Vec<Sample>,
    pub filtered: Vec<Sample>,
    pub eye: Vec<Sample>,
    pub sample_rate_hz: Option<f64>,
    pub last_filtered: Option<Sample>,
    pub peaks: ClassifiedPeaks,
    pub frequency_hz: Option<f64>,
    pub status: CycleStatus,
    pub cycles: u64,
}

impl PipelineSnapshot {
    /// Snapshot of a session that has not seen any frame.
    pub fn empty() -> Self {
        PipelineState::new(1).snapshot()
    }
}

/// The configured processing stages. Holds no per-session data.
#[derive(Debug, Clone)]
pub struct ChewingPipeline {
    config: PipelineConfig,
    filter: AdaptiveLowPassFilter,
    detector: PeakDetector,
    analyzer: CorrelationAnalyzer,
    classifier: ArtifactClassifier,
    estimator: FrequencyEstimator,
}

impl ChewingPipeline {
    /// Build the stages from a validated configuration.
    pub fn new(config: PipelineConfig) -> ChewResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Pipeline with default configuration.
    pub fn with_defaults() -> Self {
        Self::from_config(PipelineConfig::default())
    }

    fn from_config(config: PipelineConfig) -> Self {
        Self {
            filter: AdaptiveLowPassFilter::new(config.low_pass_cutoff_hz),
            detector: PeakDetector::new(config.peak_amplitude_threshold),
            analyzer: CorrelationAnalyzer::new(config.correlation_window_size),
            classifier: ArtifactClassifier::new(config.correlation_threshold),
            estimator: FrequencyEstimator::new(config.frequency_window_size),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Empty state sized for this pipeline.
    pub fn initial_state(&self) -> PipelineState {
        PipelineState::new(self.config.buffer_capacity)
    }

    /// Run one cycle.
    pub fn advance(&self, state: PipelineState, frame: &LandmarkFrame) -> PipelineState {
        let mut next = state;

        let Some(mouth) = frame.mouth_sample() else {
            tracing::trace!(t = frame.time_ns, "Frame without mouth sample, cycle skipped");
            next.status = CycleStatus::MissingSample;
            return next;
        };

        let eye = frame.eye_sample();
        next.status = if next.raw.len() < self.config.warmup_samples {
            push_eye(&mut next, eye);
            CycleStatus::WarmingUp
        } else {
            self.filter_and_classify(&mut next, &mouth, eye)
        };

        next.push(Channel::Raw, mouth);
        next.frequency_hz = self.estimator.estimate(&next.peaks.filtered);
        next.cycles += 1;
        next
    }

    /// Fold a sequence of frames into a fresh state.
    pub fn run<'a>(&self, frames: impl IntoIterator<Item = &'a LandmarkFrame>) -> PipelineState {
        frames
            .into_iter()
            .fold(self.initial_state(), |state, frame| self.advance(state, frame))
    }

    /// A stale frame leaves every channel but raw untouched, so the eye
    /// history never holds a timestamp the filtered history lacks.
    fn filter_and_classify(
        &self,
        state: &mut PipelineState,
        mouth: &Sample,
        eye: Option<Sample>,
    ) -> CycleStatus {
        let prev = state
            .filtered
            .last()
            .or_else(|| state.raw.last())
            .copied();
        let Some(prev) = prev else {
            push_eye(state, eye);
            return CycleStatus::WarmingUp;
        };

        let Some(step) = self.filter.step(&prev, mouth) else {
            tracing::debug!(
                prev_t = prev.time_ns,
                t = mouth.time_ns,
                "Timestamp did not advance, filtering skipped"
            );
            return CycleStatus::StaleTimestamp;
        };

        state.sample_rate_hz = Some(step.sample_rate_hz);
        state.last_filtered = Some(step.sample);
        state.push(Channel::Filtered, step.sample);
        push_eye(state, eye);

        let filtered = state.filtered.snapshot();
        let peaks = self.detector.detect_samples(&filtered);

        let (paired_mouth, paired_eye) = pair_by_time(&filtered, &state.eye);
        let correlations = if paired_mouth.len() < self.analyzer.window_size() {
            tracing::trace!(
                paired = paired_mouth.len(),
                window = self.analyzer.window_size(),
                "Too few paired samples for a correlation window"
            );
            None
        } else {
            match self.analyzer.correlate(&paired_mouth, &paired_eye) {
                Ok(points) => Some(points),
                Err(e) => {
                    tracing::debug!(error = %e, "Correlation unavailable, accepting all peaks");
                    None
                }
            }
        };

        state.peaks = self.classifier.classify(&peaks, correlations.as_deref());
        CycleStatus::Processed {
            correlation_available: correlations.is_some(),
        }
    }
}

fn push_eye(state: &mut PipelineState, eye: Option<Sample>) {
    if let Some(eye) = eye {
        state.push(Channel::Eye, eye);
    }
}

/// The filtered and eye samples that share a timestamp, in filtered order.
///
/// A filtered sample without an eye partner drops out of both series, so a
/// missing eye point only thins the windows that span it.
fn pair_by_time(filtered: &[Sample], eye: &SampleBuffer) -> (Vec<Sample>, Vec<Sample>) {
    let by_time: HashMap<TimestampNs, Sample> = eye.iter().map(|s| (s.time_ns, *s)).collect();
    filtered
        .iter()
        .filter_map(|s| by_time.get(&s.time_ns).map(|e| (*s, *e)))
        .unzip()
}
