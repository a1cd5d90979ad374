//! Replay of recorded landmark frame logs.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chewtrack_common::error::{ChewError, ChewResult};
use chewtrack_signal_model::{parse_frames, parse_header, FrameStreamHeader, LandmarkFrame};

use crate::LandmarkSource;

/// Yields the frames of a JSONL frame log in file order.
#[derive(Debug, Clone)]
pub struct JsonlReplaySource {
    name: String,
    header: Option<FrameStreamHeader>,
    frames: VecDeque<LandmarkFrame>,
}

impl JsonlReplaySource {
    /// Load a frame log from disk.
    pub fn open(path: impl AsRef<Path>) -> ChewResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChewError::FileNotFound {
                path: PathBuf::from(path),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let mut source = Self::parse(&content)?;
        source.name = format!("replay:{}", path.display());
        tracing::debug!(
            path = %path.display(),
            frames = source.remaining(),
            "Frame log loaded"
        );
        Ok(source)
    }

    /// Parse frame log content.
    pub fn parse(content: &str) -> ChewResult<Self> {
        Ok(Self {
            name: "replay".to_string(),
            header: parse_header(content),
            frames: parse_frames(content)?.into(),
        })
    }

    pub fn from_frames(frames: impl IntoIterator<Item = LandmarkFrame>) -> Self {
        Self {
            name: "replay".to_string(),
            header: None,
            frames: frames.into_iter().collect(),
        }
    }

    pub fn header(&self) -> Option<&FrameStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet polled.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for JsonlReplaySource {
    fn poll(&mut self) -> ChewResult<Option<LandmarkFrame>> {
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    fn is_live(&self) -> bool {
        false
    }
}
