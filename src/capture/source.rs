use super::CaptureError;
use crate::core::frame::Frame;

/// Playback surface supplied by the surrounding player component.
///
/// `seek` returns only once the source reports the seek as completed, and
/// `surface` hands back the current visual surface as RGBA pixels. Live
/// capture streams report `is_live()`: they cannot seek and their captures
/// are stamped with wall-clock time instead of a playback position.
pub trait VideoSource {
    fn is_ready(&self) -> bool;
    fn is_live(&self) -> bool {
        false
    }
    /// Current playback position in seconds.
    fn position(&self) -> f64;
    /// Total duration in seconds.
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn has_ended(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Blocks until the position change is observable on the surface.
    fn seek(&mut self, position: f64) -> Result<(), CaptureError>;
    /// Current visual surface. Fails when the surface is protected or
    /// otherwise unreadable; a single failure is not fatal to automation.
    fn surface(&mut self) -> Result<Frame, CaptureError>;
}

/// Scripted source for tests and host bring-up: serves surfaces from a
/// fixed (time, frame) timeline and moves only when told to.
pub struct ScriptedSource {
    timeline: Vec<(f64, Frame)>,
    position: f64,
    duration: f64,
    ready: bool,
    live: bool,
    playing: bool,
    fail_surface: bool,
}

impl ScriptedSource {
    pub fn new(duration: f64) -> Self {
        Self {
            timeline: Vec::new(),
            position: 0.0,
            duration,
            ready: true,
            live: false,
            playing: false,
            fail_surface: false,
        }
    }

    /// Shows `frame` from `at` seconds onward.
    pub fn with_frame(mut self, at: f64, frame: Frame) -> Self {
        self.timeline.push((at, frame));
        self.timeline
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        self
    }

    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Simulates playback progress between ticks.
    pub fn advance(&mut self, seconds: f64) {
        self.position = (self.position + seconds).min(self.duration);
    }

    pub fn set_fail_surface(&mut self, fail: bool) {
        self.fail_surface = fail;
    }
}

impl VideoSource for ScriptedSource {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn has_ended(&self) -> bool {
        !self.live && self.position >= self.duration
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, position: f64) -> Result<(), CaptureError> {
        if self.live {
            return Err(CaptureError::SeekUnsupported);
        }
        self.position = position.clamp(0.0, self.duration);
        Ok(())
    }

    fn surface(&mut self) -> Result<Frame, CaptureError> {
        if self.fail_surface {
            return Err(CaptureError::Surface("scripted surface failure".to_string()));
        }
        self.timeline
            .iter()
            .rev()
            .find(|(at, _)| *at <= self.position)
            .map(|(_, frame)| frame.clone())
            .ok_or_else(|| CaptureError::Surface("no frame scripted at this position".to_string()))
    }
}
