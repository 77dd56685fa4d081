//! Capture automation - deciding *when* a still is taken.
//!
//! The scheduler is a mode-driven state machine over a cooperative tick
//! model: the host drives `tick` from its timer/frame loop with a
//! millisecond clock, and `start`/`stop` are the only other state mutators.
//! Modes: fixed interval, bounded time range, pixel-difference triggering
//! (realtime or seek-driven fast scan, with an optional slide-stabilization
//! variant), and externally scored AI detection.

pub mod comparator;
pub mod scene_change;
pub mod scheduler;
pub mod source;

pub use comparator::{ComparatorError, HttpComparator, MockComparator, SceneComparator};
pub use scene_change::SceneChangeDetector;
pub use scheduler::{CaptureMode, CaptureScheduler, SchedulerConfig, TickOutcome};
pub use source::{ScriptedSource, VideoSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("video source is not ready")]
    SourceNotReady,
    #[error("capture surface unavailable: {0}")]
    Surface(String),
    #[error("source cannot seek")]
    SeekUnsupported,
    #[error("seek failed: {0}")]
    Seek(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("no scene comparator configured")]
    ComparatorMissing,
    #[error("scene comparison failed: {0}")]
    Comparison(String),
}
