use std::sync::Arc;

use chewtrack_common::error::ChewResult;
use chewtrack_processing_core::{ChewingPipeline, CycleStatus};
use chewtrack_session::writer::read_records;
use chewtrack_session::{
    drive_source, CycleWriter, EyeMode, JsonlReplaySource, LandmarkSource, MonitoringSession,
    RecordingHeader, SyntheticConfig, SyntheticSource,
};
use chewtrack_signal_model::{EyePoint, LandmarkFrame, PipelineConfig};

const FRAME_NS: u64 = 33_333_333;

fn chewing_frames(count: u64) -> Vec<LandmarkFrame> {
    (0..count)
        .map(|i| {
            let t = (i * FRAME_NS) as f64 / 1e9;
            let mouth = 5.0 + 4.0 * (std::f64::consts::PI * t).sin();
            LandmarkFrame::new(i * FRAME_NS, mouth, Some(EyePoint::new(0.5, 0.0)))
        })
        .collect()
}

fn pipeline() -> ChewingPipeline {
    ChewingPipeline::new(PipelineConfig {
        peak_amplitude_threshold: 6.0,
        ..Default::default()
    })
    .unwrap()
}

/// Live source that yields a frame only every other poll.
struct FlakyCamera {
    frames: Vec<LandmarkFrame>,
    polls: u32,
}

impl LandmarkSource for FlakyCamera {
    fn poll(&mut self) -> ChewResult<Option<LandmarkFrame>> {
        self.polls += 1;
        if self.polls % 2 == 0 || self.frames.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.frames.remove(0)))
    }

    fn name(&self) -> &str {
        "flaky-camera"
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

#[tokio::test]
async fn replay_processes_every_frame() {
    let handle = MonitoringSession::new(pipeline()).start();
    let mut source = JsonlReplaySource::from_frames(chewing_frames(300));

    let accepted = drive_source(&mut source, &handle).await.unwrap();
    let summary = handle.finish().await.unwrap();

    assert_eq!(accepted, 300);
    assert_eq!(summary.frames, 300);
    assert_eq!(summary.cycles, 300);
    assert_eq!(summary.dropped, 0);
    assert_eq!(summary.last.peaks.filtered.len(), 2);
    let hz = summary.last.frequency_hz.unwrap();
    assert!((hz - 0.5).abs() < 0.01, "hz={hz}");
}

#[tokio::test]
async fn frames_without_mouth_do_not_count_as_cycles() {
    let handle = MonitoringSession::new(pipeline()).start();
    for i in 0..6u64 {
        let frame = if i % 2 == 0 {
            LandmarkFrame::new(i * FRAME_NS, 1.0, None)
        } else {
            LandmarkFrame::empty(i * FRAME_NS)
        };
        handle.send(frame).await.unwrap();
    }

    let summary = handle.finish().await.unwrap();
    assert_eq!(summary.frames, 6);
    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.last.raw.len(), 3);
    assert_eq!(summary.last.status, CycleStatus::MissingSample);
}

#[tokio::test]
async fn busy_session_drops_overlapping_frames() {
    // The cycle task cannot run until this test yields, so the queue fills.
    let handle = MonitoringSession::new(pipeline())
        .with_queue_capacity(1)
        .start();

    let results: Vec<bool> = chewing_frames(5)
        .into_iter()
        .map(|f| handle.submit(f).unwrap())
        .collect();
    assert_eq!(results, vec![true, false, false, false, false]);
    assert_eq!(handle.dropped(), 4);

    let summary = handle.finish().await.unwrap();
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.dropped, 4);
}

#[tokio::test]
async fn stop_discards_pending_frames() {
    let handle = MonitoringSession::new(pipeline())
        .with_queue_capacity(8)
        .start();
    for frame in chewing_frames(5) {
        assert!(handle.submit(frame).unwrap());
    }

    let flag = handle.stop_flag();
    let summary = handle.stop().await.unwrap();
    assert!(flag.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.last.status, CycleStatus::Idle);
}

#[tokio::test]
async fn subscribers_see_each_published_snapshot() {
    let handle = MonitoringSession::new(pipeline()).start();
    let mut updates = handle.subscribe();
    assert_eq!(handle.snapshot().cycles, 0);

    for frame in chewing_frames(3) {
        handle.send(frame).await.unwrap();
        updates.changed().await.unwrap();
    }
    let latest = Arc::clone(&updates.borrow_and_update());
    assert_eq!(latest.cycles, 3);
    assert_eq!(handle.snapshot().cycles, 3);

    handle.finish().await.unwrap();
}

#[tokio::test]
async fn live_source_is_pumped_until_exhausted() {
    let handle = MonitoringSession::new(pipeline())
        .with_queue_capacity(64)
        .start();
    let mut camera = FlakyCamera {
        frames: chewing_frames(20),
        polls: 0,
    };

    let accepted = drive_source(&mut camera, &handle).await.unwrap();
    let summary = handle.finish().await.unwrap();

    assert_eq!(accepted, 20);
    assert_eq!(summary.cycles, 20);
    assert_eq!(summary.last.filtered.len(), 10);
}

#[tokio::test]
async fn recorder_writes_one_line_per_cycle() {
    let dir = std::env::temp_dir().join("chewtrack_test_session_recording");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("cycles.jsonl");

    let pipeline = pipeline();
    let header = RecordingHeader::new("2026-01-01T00:00:00Z", "replay", pipeline.config().clone());
    let writer = CycleWriter::new(&path, &header).unwrap();

    let handle = MonitoringSession::new(pipeline).with_recorder(writer).start();
    let mut frames = chewing_frames(40);
    frames.insert(20, LandmarkFrame::empty(20 * FRAME_NS + 1));
    let mut source = JsonlReplaySource::from_frames(frames);
    drive_source(&mut source, &handle).await.unwrap();
    let summary = handle.finish().await.unwrap();
    assert_eq!(summary.frames, 41);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# "));
    let records = read_records(&content).unwrap();
    assert_eq!(records.len(), 40);
    assert_eq!(records[39].time_ns, 39 * FRAME_NS);
    assert_eq!(
        records[39].status,
        CycleStatus::Processed {
            correlation_available: true
        }
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn failing_recorder_does_not_end_the_session() {
    // Every write to /dev/full fails with ENOSPC once the buffer spills.
    let pipeline = pipeline();
    let header = RecordingHeader::new("2026-01-01T00:00:00Z", "replay", pipeline.config().clone());
    let writer = CycleWriter::new("/dev/full", &header).unwrap();

    let handle = MonitoringSession::new(pipeline).with_recorder(writer).start();
    let mut source = JsonlReplaySource::from_frames(chewing_frames(300));
    let accepted = drive_source(&mut source, &handle).await.unwrap();
    handle.send(LandmarkFrame::empty(300 * FRAME_NS)).await.unwrap();
    let summary = handle.finish().await.unwrap();

    assert_eq!(accepted, 300);
    assert_eq!(summary.frames, 301);
    assert_eq!(summary.cycles, 300);
    assert_eq!(summary.last.peaks.filtered.len(), 2);
}

#[tokio::test]
async fn synthetic_head_motion_is_rejected() {
    let pipeline = ChewingPipeline::new(PipelineConfig {
        low_pass_cutoff_hz: 1_000.0,
        peak_amplitude_threshold: 6.0,
        ..Default::default()
    })
    .unwrap();
    let handle = MonitoringSession::new(pipeline).start();
    let mut source = SyntheticSource::new(SyntheticConfig {
        chew_hz: 0.5,
        duration_secs: 10.0,
        eye: EyeMode::Mirror,
        ..Default::default()
    });

    drive_source(&mut source, &handle).await.unwrap();
    let summary = handle.finish().await.unwrap();

    assert!(!summary.last.peaks.removed.is_empty());
    assert_eq!(summary.last.frequency_hz, None);
}
