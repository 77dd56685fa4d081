use log::info;

use crate::capture::{
    CaptureError, CaptureMode, CaptureScheduler, SceneComparator, SchedulerConfig, TickOutcome,
    VideoSource,
};
use crate::core::dpi::inject_dpi;
use crate::core::filter::{FilterConfig, FilterPipeline};
use crate::core::frame::JPEG_CAPTURE_QUALITY;
use crate::core::settings::AppSettings;
use crate::core::store::{CapturedFrame, FrameId, FrameStore};

/// One editing session: frame store, render pipeline, and capture
/// scheduler, wired to the host's settings.
///
/// ```no_run
/// use framegrab_lib::{AppSettings, CaptureMode, CaptureSession};
/// # use framegrab_lib::capture::ScriptedSource;
/// # let mut source = ScriptedSource::new(10.0);
///
/// let mut session = CaptureSession::new("clip", AppSettings::default());
/// session.start_automation(CaptureMode::Interval, &mut source, 0)?;
/// loop {
///     // driven from the host's timer/frame loop
///     # break;
/// }
/// # Ok::<(), framegrab_lib::CaptureError>(())
/// ```
pub struct CaptureSession {
    settings: AppSettings,
    scheduler: CaptureScheduler,
    store: FrameStore,
    pipeline: FilterPipeline,
}

impl CaptureSession {
    pub fn new(video_stem: impl Into<String>, settings: AppSettings) -> Self {
        let scheduler = CaptureScheduler::new(SchedulerConfig::from_settings(&settings));
        let store = FrameStore::new(video_stem, settings.filename_format);
        info!("capture session created");
        Self {
            settings,
            scheduler,
            store,
            pipeline: FilterPipeline::new(),
        }
    }

    /// Manual capture of the current surface. Unlike automation ticks this
    /// never deduplicates against the previous capture.
    pub fn capture_now(
        &mut self,
        source: &mut dyn VideoSource,
        now_ms: u64,
    ) -> Result<FrameId, CaptureError> {
        let surface = source.surface()?;
        let encoded = surface.encode(self.settings.capture_format, JPEG_CAPTURE_QUALITY)?;
        let stamped = inject_dpi(&encoded, self.settings.dpi);
        let timestamp = if source.is_live() {
            now_ms as f64 / 1000.0
        } else {
            source.position()
        };
        let filters = Some(FilterConfig::capture_default(self.settings.dpi));
        Ok(self.store.push(
            stamped,
            self.settings.capture_format,
            timestamp,
            filters,
            now_ms,
        ))
    }

    pub fn start_automation(
        &mut self,
        mode: CaptureMode,
        source: &mut dyn VideoSource,
        now_ms: u64,
    ) -> Result<(), CaptureError> {
        self.scheduler.start(mode, source, now_ms)
    }

    /// One cooperative automation tick; see [`CaptureScheduler::tick`].
    pub fn tick(
        &mut self,
        source: &mut dyn VideoSource,
        now_ms: u64,
    ) -> Result<TickOutcome, CaptureError> {
        self.scheduler.tick(source, &mut self.store, now_ms)
    }

    /// Stops automation, returning the elapsed session duration in ms.
    pub fn stop_automation(&mut self, now_ms: u64) -> Option<u64> {
        self.scheduler.stop(now_ms)
    }

    pub fn is_automating(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn set_comparator(&mut self, comparator: Box<dyn SceneComparator>) {
        self.scheduler.set_comparator(comparator);
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: AppSettings) {
        self.scheduler
            .set_config(SchedulerConfig::from_settings(&settings));
        self.store.set_filename_format(settings.filename_format);
        self.settings = settings;
    }

    /// Stored frames, newest first.
    pub fn frames(&self) -> impl Iterator<Item = &CapturedFrame> + '_ {
        self.store.frames()
    }

    pub fn frame_count(&self) -> usize {
        self.store.len()
    }

    pub fn update_frame_filters(&mut self, id: FrameId, filters: FilterConfig) -> bool {
        self.store.update_filters(id, filters)
    }

    pub fn update_all_filters(&mut self, filters: &FilterConfig) {
        self.store.update_all_filters(filters);
    }

    pub fn delete_frame(&mut self, id: FrameId) -> bool {
        self.store.remove(id)
    }

    pub fn delete_frames(&mut self, ids: &[FrameId]) -> usize {
        self.store.remove_many(ids)
    }

    pub fn clear_frames(&mut self) {
        self.store.clear();
        self.pipeline.clear();
    }

    /// Final bytes of one frame: filters rendered, DPI stamped.
    pub fn export_frame(&mut self, id: FrameId) -> Option<(String, Vec<u8>)> {
        let CaptureSession {
            store, pipeline, ..
        } = self;
        store.export(id, pipeline)
    }

    /// Final bytes of every frame, newest first.
    pub fn export_all_frames(&mut self) -> Vec<(String, Vec<u8>)> {
        let CaptureSession {
            store, pipeline, ..
        } = self;
        store.export_all(pipeline)
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptedSource;
    use crate::core::frame::Frame;

    fn source() -> ScriptedSource {
        ScriptedSource::new(10.0).with_frame(0.0, Frame::solid(16, 16, 80))
    }

    #[test]
    fn test_manual_capture_uses_settings() {
        let mut session = CaptureSession::new("clip", AppSettings::default());
        let mut source = source();

        let id = session.capture_now(&mut source, 1000).unwrap();
        assert_eq!(session.frame_count(), 1);

        let frame = session.frames().next().unwrap();
        assert_eq!(frame.id, id);
        assert_eq!(frame.filename, "frame_1000.png");
        assert_eq!(frame.filters.as_ref().unwrap().dpi, Some(1200));
    }

    #[test]
    fn test_manual_capture_does_not_dedup() {
        let mut session = CaptureSession::new("clip", AppSettings::default());
        let mut source = source();

        session.capture_now(&mut source, 0).unwrap();
        session.capture_now(&mut source, 100).unwrap();
        assert_eq!(session.frame_count(), 2);
    }

    #[test]
    fn test_automation_roundtrip() {
        let mut session = CaptureSession::new("clip", AppSettings::default());
        let mut source = source();

        session
            .start_automation(CaptureMode::Interval, &mut source, 0)
            .unwrap();
        assert!(session.is_automating());
        assert!(matches!(
            session.tick(&mut source, 200).unwrap(),
            TickOutcome::Captured(_)
        ));
        assert_eq!(session.stop_automation(500), Some(500));
        assert!(!session.is_automating());
    }

    #[test]
    fn test_export_applies_edits() {
        let mut session = CaptureSession::new("clip", AppSettings::default());
        let mut source = source();
        let id = session.capture_now(&mut source, 0).unwrap();

        session.update_frame_filters(
            id,
            FilterConfig {
                grayscale: 100.0,
                dpi: Some(300),
                ..FilterConfig::default()
            },
        );

        let (name, bytes) = session.export_frame(id).unwrap();
        assert_eq!(name, "frame_0.png");
        let decoded = Frame::decode(&bytes).unwrap();
        // Grayscale output: equal channels everywhere.
        assert!(decoded
            .data
            .chunks_exact(4)
            .all(|px| px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn test_update_settings_rewires_naming() {
        let mut session = CaptureSession::new("clip", AppSettings::default());
        let mut source = source();

        let mut settings = AppSettings::default();
        settings.filename_format = crate::core::store::FilenameFormat::Sequence;
        session.update_settings(settings);

        session.capture_now(&mut source, 0).unwrap();
        assert_eq!(
            session.frames().next().unwrap().filename,
            "clip_frame_0001.png"
        );
    }
}
