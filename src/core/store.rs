use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::dpi::inject_dpi;
use crate::core::filter::{FilterConfig, FilterPipeline};
use crate::core::frame::CaptureFormat;

/// Opaque identity of a captured frame. Assigned once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Naming scheme for generated capture filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilenameFormat {
    /// `frame_<session clock ms>`.
    Timestamp,
    /// `<stem>_frame_0001`, numbered per store.
    Sequence,
    /// `<stem>_<MM-SS-mmm>` from the capture timestamp.
    VideoTime,
}

/// One captured still and its edit state. The encoded bytes and the id
/// never change after creation; edits only swap the filter config.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub id: FrameId,
    pub bytes: Vec<u8>,
    pub format: CaptureFormat,
    pub filename: String,
    /// Seconds, source-relative; wall-clock for live captures.
    pub timestamp: f64,
    pub filters: Option<FilterConfig>,
}

/// In-memory, newest-first collection of captured frames. Lives only as
/// long as the session; nothing here is persisted.
pub struct FrameStore {
    frames: VecDeque<CapturedFrame>,
    stem: String,
    filename_format: FilenameFormat,
    next_id: u64,
    sequence: u32,
}

impl FrameStore {
    pub fn new(stem: impl Into<String>, filename_format: FilenameFormat) -> Self {
        Self {
            frames: VecDeque::new(),
            stem: stem.into(),
            filename_format,
            next_id: 1,
            sequence: 1,
        }
    }

    pub fn set_filename_format(&mut self, format: FilenameFormat) {
        self.filename_format = format;
    }

    /// Appends a capture at the front and returns its id.
    pub fn push(
        &mut self,
        bytes: Vec<u8>,
        format: CaptureFormat,
        timestamp: f64,
        filters: Option<FilterConfig>,
        now_ms: u64,
    ) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        let filename = self.next_filename(format, timestamp, now_ms);
        self.frames.push_front(CapturedFrame {
            id,
            bytes,
            format,
            filename,
            timestamp,
            filters,
        });
        id
    }

    fn next_filename(&mut self, format: CaptureFormat, timestamp: f64, now_ms: u64) -> String {
        let ext = format.file_extension();
        match self.filename_format {
            FilenameFormat::Timestamp => format!("frame_{}.{}", now_ms, ext),
            FilenameFormat::Sequence => {
                let name = format!("{}_frame_{:04}.{}", self.stem, self.sequence, ext);
                self.sequence += 1;
                name
            }
            FilenameFormat::VideoTime => {
                format!("{}_{}.{}", self.stem, format_video_time(timestamp), ext)
            }
        }
    }

    pub fn get(&self, id: FrameId) -> Option<&CapturedFrame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn remove(&mut self, id: FrameId) -> bool {
        let before = self.frames.len();
        self.frames.retain(|f| f.id != id);
        self.frames.len() != before
    }

    pub fn remove_many(&mut self, ids: &[FrameId]) -> usize {
        let before = self.frames.len();
        self.frames.retain(|f| !ids.contains(&f.id));
        before - self.frames.len()
    }

    /// Swaps in a new filter config. Sanitization happens here - this is
    /// the edit-entry boundary; the pipeline itself never clamps.
    pub fn update_filters(&mut self, id: FrameId, filters: FilterConfig) -> bool {
        if let Some(frame) = self.frames.iter_mut().find(|f| f.id == id) {
            frame.filters = Some(filters.sanitized());
            true
        } else {
            false
        }
    }

    /// Applies one filter config to every stored frame.
    pub fn update_all_filters(&mut self, filters: &FilterConfig) {
        let sanitized = filters.clone().sanitized();
        for frame in &mut self.frames {
            frame.filters = Some(sanitized.clone());
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Newest first.
    pub fn frames(&self) -> impl Iterator<Item = &CapturedFrame> + '_ {
        self.frames.iter()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.timestamp).collect()
    }

    /// Renders one frame through `pipeline` and stamps its configured DPI.
    pub fn export(&self, id: FrameId, pipeline: &mut FilterPipeline) -> Option<(String, Vec<u8>)> {
        self.get(id)
            .map(|frame| (frame.filename.clone(), export_bytes(frame, pipeline)))
    }

    /// Final bytes for every stored frame, newest first.
    pub fn export_all(&self, pipeline: &mut FilterPipeline) -> Vec<(String, Vec<u8>)> {
        self.frames
            .iter()
            .map(|frame| (frame.filename.clone(), export_bytes(frame, pipeline)))
            .collect()
    }
}

fn export_bytes(frame: &CapturedFrame, pipeline: &mut FilterPipeline) -> Vec<u8> {
    match &frame.filters {
        Some(filters) => {
            let rendered = pipeline.render(&frame.bytes, frame.format, filters);
            match filters.dpi {
                Some(dpi) => inject_dpi(&rendered, dpi),
                None => rendered,
            }
        }
        // No edits recorded: the capture-time bytes already carry their DPI.
        None => frame.bytes.clone(),
    }
}

fn format_video_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00-00-000".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds * 1000.0) % 1000.0).floor() as u64;
    format!("{:02}-{:02}-{:03}", minutes, secs, millis)
}
