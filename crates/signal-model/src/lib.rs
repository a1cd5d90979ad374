//! Chewtrack Signal Model
//!
//! Defines the core data contracts shared by every chewtrack crate:
//! - **Samples:** Timestamped scalar measurements and the peaks derived from them
//! - **Frames:** Per-cycle output of the landmark provider (mouth distance, eye point)
//! - **Config:** Tunables of the chewing-detection pipeline
//!
//! All timestamps are monotonic nanoseconds since the session epoch.

pub mod config;
pub mod frame;
pub mod sample;

pub use config::*;
pub use frame::*;
pub use sample::*;
