//! Chewtrack Processing Core
//!
//! Turns a stream of landmark frames into a live chewing estimate:
//! - **Buffering:** Bounded FIFO history for the raw, filtered, and eye channels
//! - **Filtering:** Single-pole low-pass whose rate follows the observed cadence
//! - **Peaks:** Strict local maxima above an amplitude threshold
//! - **Artifacts:** Sliding-window mouth/eye correlation rejects eye-motion peaks
//! - **Frequency:** Rolling mean of instantaneous chewing frequency
//!
//! Nothing here touches files, clocks, or tasks. A cycle takes the previous
//! state and a frame and returns the next state.

pub mod buffer;
pub mod classifier;
pub mod correlation;
pub mod frequency;
pub mod low_pass;
pub mod peaks;
pub mod pipeline;

pub use buffer::SampleBuffer;
pub use classifier::ArtifactClassifier;
pub use correlation::{CorrelationAnalyzer, CorrelationError};
pub use frequency::FrequencyEstimator;
pub use low_pass::AdaptiveLowPassFilter;
pub use peaks::PeakDetector;
pub use pipeline::{Channel, ChewingPipeline, CycleStatus, PipelineSnapshot, PipelineState};
