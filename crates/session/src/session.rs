//! Monitoring session lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chewtrack_common::clock::SessionClock;
use chewtrack_common::error::{ChewError, ChewResult};
use chewtrack_processing_core::{ChewingPipeline, PipelineSnapshot};
use chewtrack_signal_model::LandmarkFrame;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::writer::CycleWriter;

/// Frames that may wait for the cycle task.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// A configured session that has not started yet.
pub struct MonitoringSession {
    pipeline: ChewingPipeline,
    queue_capacity: usize,
    recorder: Option<CycleWriter>,
}

impl MonitoringSession {
    pub fn new(pipeline: ChewingPipeline) -> Self {
        Self {
            pipeline,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            recorder: None,
        }
    }

    /// Set how many frames may wait while a cycle is running (minimum 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Append every cycle to `writer`.
    pub fn with_recorder(mut self, writer: CycleWriter) -> Self {
        self.recorder = Some(writer);
        self
    }

    /// Spawn the cycle task on the current tokio runtime.
    pub fn start(self) -> SessionHandle {
        let (frame_tx, frame_rx) = mpsc::channel(self.queue_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(PipelineSnapshot::empty()));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let clock = SessionClock::start();

        tracing::info!(
            queue_capacity = self.queue_capacity,
            recording = self.recorder.is_some(),
            epoch = %clock.epoch_wall(),
            "Monitoring session started"
        );

        let task = tokio::spawn(run_cycles(
            self.pipeline,
            frame_rx,
            snapshot_tx,
            Arc::clone(&stop_flag),
            self.recorder,
        ));

        SessionHandle {
            frames: frame_tx,
            snapshots: snapshot_rx,
            stop_flag,
            dropped: AtomicU64::new(0),
            clock,
            task,
        }
    }
}

/// Outcome of a finished session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Frames the pipeline accepted as cycles.
    pub cycles: u64,
    /// Frames that reached the cycle task, including ones without a mouth sample.
    pub frames: u64,
    /// Frames dropped because the queue was full.
    pub dropped: u64,
    /// Last published snapshot.
    pub last: Arc<PipelineSnapshot>,
    /// Session duration.
    pub elapsed_ns: u64,
}

/// Control surface of a running session.
pub struct SessionHandle {
    frames: mpsc::Sender<LandmarkFrame>,
    snapshots: watch::Receiver<Arc<PipelineSnapshot>>,
    stop_flag: Arc<AtomicBool>,
    dropped: AtomicU64,
    clock: SessionClock,
    task: JoinHandle<ChewResult<u64>>,
}

impl SessionHandle {
    /// Hand a frame to the session without waiting.
    ///
    /// Returns `Ok(false)` when the queue is full and the frame was dropped.
    pub fn submit(&self, frame: LandmarkFrame) -> ChewResult<bool> {
        match self.frames.try_send(frame) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(frame)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::trace!(t = frame.time_ns, dropped, "Session busy, frame dropped");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(ChewError::session("Session is no longer accepting frames"))
            }
        }
    }

    /// Hand a frame to the session, waiting for queue space.
    pub async fn send(&self, frame: LandmarkFrame) -> ChewResult<()> {
        self.frames
            .send(frame)
            .await
            .map_err(|_| ChewError::session("Session is no longer accepting frames"))
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> Arc<PipelineSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified after every cycle.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PipelineSnapshot>> {
        self.snapshots.clone()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Stop immediately. Frames still queued are discarded.
    pub async fn stop(self) -> ChewResult<SessionSummary> {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.shutdown().await
    }

    /// Process every queued frame, then stop.
    pub async fn finish(self) -> ChewResult<SessionSummary> {
        self.shutdown().await
    }

    async fn shutdown(self) -> ChewResult<SessionSummary> {
        let Self {
            frames,
            snapshots,
            stop_flag,
            dropped,
            clock,
            task,
        } = self;

        // Closing the queue ends the cycle task once it is drained.
        drop(frames);
        let result = task
            .await
            .map_err(|e| ChewError::session(format!("Cycle task failed: {e}")))?;
        stop_flag.store(true, Ordering::SeqCst);
        let received = result?;

        let last = Arc::clone(&snapshots.borrow());
        let summary = SessionSummary {
            cycles: last.cycles,
            frames: received,
            dropped: dropped.load(Ordering::Relaxed),
            last,
            elapsed_ns: clock.elapsed_ns(),
        };

        tracing::info!(
            cycles = summary.cycles,
            dropped = summary.dropped,
            elapsed = %SessionClock::format_elapsed(summary.elapsed_ns),
            "Monitoring session stopped"
        );
        Ok(summary)
    }
}

/// The single consumer: owns the pipeline state for the whole session.
async fn run_cycles(
    pipeline: ChewingPipeline,
    mut frames: mpsc::Receiver<LandmarkFrame>,
    snapshots: watch::Sender<Arc<PipelineSnapshot>>,
    stop_flag: Arc<AtomicBool>,
    mut recorder: Option<CycleWriter>,
) -> ChewResult<u64> {
    let mut state = pipeline.initial_state();
    let mut received = 0u64;

    while let Some(frame) = frames.recv().await {
        if stop_flag.load(Ordering::Relaxed) {
            break;
        }
        received += 1;

        let before = state.cycles();
        state = pipeline.advance(state, &frame);

        if state.cycles() != before {
            if let Some(writer) = recorder.as_mut() {
                if let Err(e) = writer.write_cycle(&frame, &state) {
                    detach_recorder(&mut recorder, &e);
                }
            }
        }

        snapshots.send_replace(Arc::new(state.snapshot()));
    }

    if let Some(writer) = recorder.as_mut() {
        match writer.flush() {
            Ok(()) => tracing::debug!(
                path = %writer.path().display(),
                records = writer.records_written(),
                "Cycle recording closed"
            ),
            Err(e) => detach_recorder(&mut recorder, &e),
        }
    }
    Ok(received)
}

/// Stop recording after a write failure. The session keeps cycling.
fn detach_recorder(recorder: &mut Option<CycleWriter>, error: &ChewError) {
    if let Some(writer) = recorder.take() {
        tracing::warn!(
            path = %writer.path().display(),
            records = writer.records_written(),
            error = %error,
            "Cycle recording failed, continuing without it"
        );
    }
}
