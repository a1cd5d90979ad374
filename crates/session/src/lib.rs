//! Chewtrack Monitoring Session
//!
//! Runs the chewing-detection pipeline against a stream of landmark
//! frames. A session owns exactly one pipeline state and processes frames
//! one at a time on a dedicated task; producers hand frames over through a
//! bounded queue and readers observe published snapshots.
//!
//! Frames come from a pluggable [`LandmarkSource`]:
//!
//! - **Replay:** a recorded JSONL frame log ([`replay::JsonlReplaySource`])
//! - **Synthetic:** a seeded chewing-like signal ([`synthetic::SyntheticSource`])
//! - **Live:** any face-landmark provider wrapped in the trait
//!
//! Per-cycle results can be appended to a JSONL recording for later review.

pub mod replay;
pub mod session;
pub mod synthetic;
pub mod writer;

use chewtrack_common::error::ChewResult;
use chewtrack_signal_model::LandmarkFrame;

pub use replay::JsonlReplaySource;
pub use session::{MonitoringSession, SessionHandle, SessionSummary};
pub use synthetic::{EyeMode, SyntheticConfig, SyntheticSource};
pub use writer::{CycleRecord, CycleWriter, RecordingHeader};

/// Trait for landmark frame providers.
pub trait LandmarkSource: Send {
    /// Poll for the next frame. Returns `None` if no frame is ready yet.
    fn poll(&mut self) -> ChewResult<Option<LandmarkFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// True once the source will never yield another frame.
    fn is_exhausted(&self) -> bool;

    /// Live sources produce frames on their own schedule, so frames that
    /// arrive while the session is busy are dropped. Recorded sources
    /// wait for queue space instead.
    fn is_live(&self) -> bool {
        true
    }
}

/// Pump frames from `source` into a running session until the source is
/// exhausted or the session starts stopping. Returns the number of frames
/// the session accepted.
pub async fn drive_source<S>(source: &mut S, handle: &SessionHandle) -> ChewResult<u64>
where
    S: LandmarkSource + ?Sized,
{
    tracing::info!(source = %source.name(), live = source.is_live(), "Landmark source attached");

    let mut accepted = 0u64;
    while !handle.is_stopping() && !source.is_exhausted() {
        match source.poll() {
            Ok(Some(frame)) => {
                let delivered = if source.is_live() {
                    handle.submit(frame)?
                } else {
                    handle.send(frame).await?;
                    true
                };
                if delivered {
                    accepted += 1;
                }
            }
            Ok(None) => {
                // Nothing ready, yield briefly
                tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            }
            Err(e) => {
                tracing::warn!(source = %source.name(), error = %e, "Landmark source error");
                tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            }
        }
    }

    tracing::info!(source = %source.name(), frames = accepted, "Landmark source detached");
    Ok(accepted)
}
