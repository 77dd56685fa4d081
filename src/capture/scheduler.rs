use log::{info, warn};

use super::comparator::SceneComparator;
use super::scene_change::{SceneChangeDetector, SAMPLE_SCALE};
use super::source::VideoSource;
use super::CaptureError;
use crate::core::dpi::inject_dpi;
use crate::core::filter::FilterConfig;
use crate::core::frame::{CaptureFormat, JPEG_CAPTURE_QUALITY};
use crate::core::settings::AppSettings;
use crate::core::store::{FrameId, FrameStore};

/// Delay between a detected slide transition and its capture.
const SLIDE_STABILIZE_MS: u64 = 750;
/// Cooldown after a slide capture; no new stabilization may start inside it.
const SLIDE_COOLDOWN_MS: u64 = 2000;
/// Position step of the fast-scan sweep, in seconds.
const FAST_SCAN_STEP: f64 = 0.5;
/// Lower bound on the AI-detect cadence.
const AI_MIN_PERIOD_MS: u64 = 500;
/// JPEG quality of the low-fidelity snapshots sent to the comparator.
const AI_SNAPSHOT_QUALITY: u8 = 20;

/// Active automation mode. `Off` is represented by the scheduler holding no
/// mode at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureMode {
    /// Fixed-cadence capture while the video plays.
    Interval,
    /// Fixed cadence, accepted only inside [start, end] seconds; stops
    /// itself past `end`.
    TimeRange { start: f64, end: f64 },
    /// Pixel-difference triggered. `fast_scan` sweeps a paused video by
    /// seeking; `slide_mode` defers each capture by a stabilization delay
    /// and applies a cooldown.
    PixelDetect { fast_scan: bool, slide_mode: bool },
    /// Captures when the external comparator reports a scene change.
    AiDetect,
}

/// Plain inputs the scheduler reads from the host's persisted settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub fps: u32,
    pub format: CaptureFormat,
    pub dpi: u32,
    /// Pixel-difference sensitivity, 1-100.
    pub sensitivity: u32,
}

impl SchedulerConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            fps: settings.fps,
            format: settings.capture_format,
            dpi: settings.dpi,
            sensitivity: settings.scene_detect_sensitivity,
        }
    }

    fn period_ms(&self) -> u64 {
        1000 / self.fps.max(1) as u64
    }
}

/// What one cooperative tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No automation is running.
    Inactive,
    /// Nothing was due on this tick.
    Idle,
    /// A frame was appended to the store.
    Captured(FrameId),
    /// The encoded capture matched the previous one and was discarded.
    Duplicate,
    /// A capture was attempted and skipped (surface unavailable).
    Skipped,
    /// The scheduler stopped itself: range exhausted, playback ended, or
    /// sweep complete.
    Finished,
}

/// Mode-driven capture automation over a cooperative tick model.
///
/// The host drives `tick` from its timer/animation loop, passing a
/// monotonic millisecond clock; `start` and `stop` are the only other
/// mutators, so a stop can never race an in-flight tick.
pub struct CaptureScheduler {
    config: SchedulerConfig,
    mode: Option<CaptureMode>,
    detector: SceneChangeDetector,
    comparator: Option<Box<dyn SceneComparator>>,
    /// Last low-fidelity snapshot handed to the comparator.
    ai_baseline: Option<Vec<u8>>,
    /// Last appended encoded capture, for the same-bitmap dedup rule.
    last_capture: Option<Vec<u8>>,
    next_capture_at: u64,
    stabilize_at: Option<u64>,
    cooldown_until: u64,
    started_at: Option<u64>,
    last_session_ms: Option<u64>,
}

impl CaptureScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let sensitivity = config.sensitivity;
        Self {
            config,
            mode: None,
            detector: SceneChangeDetector::new(sensitivity),
            comparator: None,
            ai_baseline: None,
            last_capture: None,
            next_capture_at: 0,
            stabilize_at: None,
            cooldown_until: 0,
            started_at: None,
            last_session_ms: None,
        }
    }

    pub fn set_comparator(&mut self, comparator: Box<dyn SceneComparator>) {
        self.comparator = Some(comparator);
    }

    pub fn set_config(&mut self, config: SchedulerConfig) {
        self.detector.set_sensitivity(config.sensitivity);
        self.config = config;
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_some()
    }

    /// Wall-clock duration of the most recently finished session.
    pub fn last_session_ms(&self) -> Option<u64> {
        self.last_session_ms
    }

    /// Enters `mode`. The source must be ready; fast scan needs a seekable
    /// (non-live) source and AI detection a configured comparator. All
    /// transient state of a previous run is cleared before arming.
    pub fn start(
        &mut self,
        mode: CaptureMode,
        source: &mut dyn VideoSource,
        now_ms: u64,
    ) -> Result<(), CaptureError> {
        if !source.is_ready() {
            return Err(CaptureError::SourceNotReady);
        }
        if matches!(mode, CaptureMode::PixelDetect { fast_scan: true, .. }) && source.is_live() {
            return Err(CaptureError::SeekUnsupported);
        }
        if matches!(mode, CaptureMode::AiDetect) && self.comparator.is_none() {
            return Err(CaptureError::ComparatorMissing);
        }

        self.clear_transients();
        self.started_at = Some(now_ms);

        match mode {
            CaptureMode::Interval => {
                source.play();
                self.next_capture_at = now_ms + self.config.period_ms();
            }
            CaptureMode::TimeRange { start, .. } => {
                if source.position() < start {
                    source.seek(start)?;
                }
                source.play();
                self.next_capture_at = now_ms + self.config.period_ms();
            }
            CaptureMode::PixelDetect { fast_scan, .. } => {
                if fast_scan {
                    source.pause();
                } else {
                    source.play();
                }
            }
            CaptureMode::AiDetect => {
                source.play();
                // First AI tick fires immediately.
                self.next_capture_at = now_ms;
            }
        }

        self.mode = Some(mode);
        info!("capture automation started: {:?}", mode);
        Ok(())
    }

    /// Leaves the active mode: cancels pending deadlines, drops baselines,
    /// and records the elapsed session duration, which is also returned.
    pub fn stop(&mut self, now_ms: u64) -> Option<u64> {
        let elapsed = self.started_at.take().map(|t| now_ms.saturating_sub(t));
        if elapsed.is_some() {
            self.last_session_ms = elapsed;
            info!("capture automation stopped after {}ms", elapsed.unwrap_or(0));
        }
        self.mode = None;
        self.clear_transients();
        elapsed
    }

    fn clear_transients(&mut self) {
        self.detector.reset();
        self.ai_baseline = None;
        self.last_capture = None;
        self.stabilize_at = None;
        self.cooldown_until = 0;
        self.next_capture_at = 0;
    }

    /// Runs one cooperative tick against the host's clock. Errors are
    /// terminal: the scheduler has already returned to `Off` when one
    /// surfaces.
    pub fn tick(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
    ) -> Result<TickOutcome, CaptureError> {
        let Some(mode) = self.mode else {
            return Ok(TickOutcome::Inactive);
        };
        match mode {
            CaptureMode::Interval => Ok(self.tick_interval(source, store, now_ms)),
            CaptureMode::TimeRange { start, end } => {
                Ok(self.tick_time_range(source, store, now_ms, start, end))
            }
            CaptureMode::PixelDetect {
                fast_scan: false,
                slide_mode,
            } => Ok(self.tick_pixel(source, store, now_ms, slide_mode)),
            CaptureMode::PixelDetect { fast_scan: true, .. } => {
                self.tick_fast_scan(source, store, now_ms)
            }
            CaptureMode::AiDetect => self.tick_ai(source, store, now_ms),
        }
    }

    fn tick_interval(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
    ) -> TickOutcome {
        if now_ms < self.next_capture_at {
            return TickOutcome::Idle;
        }
        self.next_capture_at = now_ms + self.config.period_ms();
        self.capture(source, store, now_ms, true)
    }

    fn tick_time_range(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
        start: f64,
        end: f64,
    ) -> TickOutcome {
        if now_ms < self.next_capture_at {
            return TickOutcome::Idle;
        }
        self.next_capture_at = now_ms + self.config.period_ms();

        let position = source.position();
        let outcome = if position >= start && position <= end {
            self.capture(source, store, now_ms, true)
        } else {
            TickOutcome::Idle
        };

        if position > end || source.has_ended() {
            self.stop(now_ms);
            return TickOutcome::Finished;
        }
        outcome
    }

    fn tick_pixel(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
        slide_mode: bool,
    ) -> TickOutcome {
        if !source.is_live() && (!source.is_playing() || source.has_ended()) {
            self.stop(now_ms);
            return TickOutcome::Finished;
        }

        // A pending stabilization fires before any new sampling.
        if let Some(due) = self.stabilize_at {
            if now_ms >= due {
                self.stabilize_at = None;
                self.cooldown_until = now_ms + SLIDE_COOLDOWN_MS;
                return self.capture(source, store, now_ms, true);
            }
        }

        let sample = match source.surface() {
            Ok(surface) => surface.downsample(SAMPLE_SCALE),
            Err(err) => {
                warn!("scene sample failed: {err}");
                return TickOutcome::Skipped;
            }
        };
        if !self.detector.observe(&sample) {
            return TickOutcome::Idle;
        }

        if slide_mode {
            // One stabilization at a time, none during cooldown.
            if self.stabilize_at.is_none() && now_ms >= self.cooldown_until {
                self.stabilize_at = Some(now_ms + SLIDE_STABILIZE_MS);
            }
            TickOutcome::Idle
        } else {
            self.capture(source, store, now_ms, true)
        }
    }

    fn tick_fast_scan(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
    ) -> Result<TickOutcome, CaptureError> {
        if source.position() >= source.duration() {
            self.stop(now_ms);
            return Ok(TickOutcome::Finished);
        }

        if let Err(err) = source.seek(source.position() + FAST_SCAN_STEP) {
            self.stop(now_ms);
            return Err(err);
        }

        let sample = match source.surface() {
            Ok(surface) => surface.downsample(SAMPLE_SCALE),
            Err(err) => {
                warn!("scene sample failed: {err}");
                return Ok(TickOutcome::Skipped);
            }
        };

        if self.detector.observe_sticky(&sample) {
            // Sweep captures are not deduplicated.
            Ok(self.capture(source, store, now_ms, false))
        } else {
            Ok(TickOutcome::Idle)
        }
    }

    fn tick_ai(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
    ) -> Result<TickOutcome, CaptureError> {
        if !source.is_live() && (!source.is_playing() || source.has_ended()) {
            self.stop(now_ms);
            return Ok(TickOutcome::Finished);
        }
        if now_ms < self.next_capture_at {
            return Ok(TickOutcome::Idle);
        }
        self.next_capture_at = now_ms + self.config.period_ms().max(AI_MIN_PERIOD_MS);

        let snapshot = match self.snapshot(source) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("AI snapshot failed: {err}");
                return Ok(TickOutcome::Skipped);
            }
        };

        let Some(baseline) = self.ai_baseline.take() else {
            // First tick: the baseline itself becomes a frame, no AI call.
            let outcome = self.capture(source, store, now_ms, true);
            self.ai_baseline = Some(snapshot);
            return Ok(outcome);
        };

        // The comparator call blocks this tick, so stop() cannot interleave
        // and the verdict always belongs to the active session.
        let verdict = match self.comparator.as_ref() {
            Some(comparator) => comparator.compare(&baseline, &snapshot),
            None => {
                self.stop(now_ms);
                return Err(CaptureError::ComparatorMissing);
            }
        };
        let verdict = match verdict {
            Ok(text) => text,
            Err(err) => {
                // Terminal: a single comparator failure ends the session.
                self.stop(now_ms);
                return Err(CaptureError::Comparison(err.to_string()));
            }
        };

        if verdict.to_ascii_lowercase().contains("yes") {
            let outcome = self.capture(source, store, now_ms, true);
            self.ai_baseline = Some(snapshot);
            Ok(outcome)
        } else {
            self.ai_baseline = Some(baseline);
            Ok(TickOutcome::Idle)
        }
    }

    /// Grabs the current surface, stamps the session DPI, and appends a
    /// frame with the default capture filters. With `dedup`, a capture
    /// whose encoded bytes match the previous one is silently discarded.
    fn capture(
        &mut self,
        source: &mut dyn VideoSource,
        store: &mut FrameStore,
        now_ms: u64,
        dedup: bool,
    ) -> TickOutcome {
        let bytes = match self.grab(source) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("capture skipped: {err}");
                return TickOutcome::Skipped;
            }
        };

        if dedup && self.last_capture.as_deref() == Some(bytes.as_slice()) {
            return TickOutcome::Duplicate;
        }
        self.last_capture = Some(bytes.clone());

        let timestamp = if source.is_live() {
            now_ms as f64 / 1000.0
        } else {
            source.position()
        };
        let filters = FilterConfig::capture_default(self.config.dpi);
        let id = store.push(bytes, self.config.format, timestamp, Some(filters), now_ms);
        TickOutcome::Captured(id)
    }

    fn grab(&self, source: &mut dyn VideoSource) -> Result<Vec<u8>, CaptureError> {
        let surface = source.surface()?;
        let encoded = surface.encode(self.config.format, JPEG_CAPTURE_QUALITY)?;
        Ok(inject_dpi(&encoded, self.config.dpi))
    }

    fn snapshot(&self, source: &mut dyn VideoSource) -> Result<Vec<u8>, CaptureError> {
        let surface = source.surface()?;
        Ok(surface.encode(CaptureFormat::Jpeg, AI_SNAPSHOT_QUALITY)?)
    }
}
