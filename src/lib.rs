//! Core engine for pulling publish-ready stills out of a playing video.
//!
//! Two halves, tightly coupled:
//! 1. Capture automation - a mode-driven scheduler (interval, time range,
//!    pixel-difference, AI-assisted) that decides which video instants
//!    become captured frames.
//! 2. Post-processing - a tone-mapping + sharpening pipeline with a bounded
//!    render cache, and byte-exact DPI metadata injection into the PNG/JPEG
//!    containers.
//!
//! The surrounding application supplies the video surface, persists the
//! settings, and renders results; this crate holds the frames in memory for
//! the lifetime of the session only.

pub mod api;
pub mod capture;
pub mod core;

pub use crate::api::CaptureSession;
pub use crate::capture::{
    CaptureError, CaptureMode, CaptureScheduler, SceneChangeDetector, SchedulerConfig,
    TickOutcome, VideoSource,
};
pub use crate::core::filter::{FilterConfig, FilterPipeline, SharpeningLevel};
pub use crate::core::frame::{CaptureFormat, Frame};
pub use crate::core::settings::AppSettings;
pub use crate::core::store::{CapturedFrame, FilenameFormat, FrameId, FrameStore};
