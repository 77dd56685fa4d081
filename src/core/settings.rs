use serde::{Deserialize, Serialize};

use crate::core::frame::CaptureFormat;
use crate::core::store::FilenameFormat;

/// Host-persisted preferences, read by the scheduler and pipeline as plain
/// inputs. This type only (de)serializes; where the document lives is the
/// host's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Container for captured stills: PNG keeps alpha, JPEG is smaller.
    pub capture_format: CaptureFormat,
    pub filename_format: FilenameFormat,
    /// Automation sample rate, captures per second.
    pub fps: u32,
    /// Default density stamped into captures.
    pub dpi: u32,
    pub export_format: CaptureFormat,
    /// Pixel-difference sensitivity, 1-100.
    pub scene_detect_sensitivity: u32,
    /// AI-detect sensitivity, 1-100.
    pub ai_scene_detect_sensitivity: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            capture_format: CaptureFormat::Png,
            filename_format: FilenameFormat::Timestamp,
            fps: 5,
            dpi: 1200,
            export_format: CaptureFormat::Jpeg,
            scene_detect_sensitivity: 25,
            ai_scene_detect_sensitivity: 50,
        }
    }
}

impl AppSettings {
    /// Parses a persisted settings document. Missing fields fall back to
    /// their defaults; an unreadable document yields the full defaults.
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_default()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.capture_format, CaptureFormat::Png);
        assert_eq!(settings.fps, 5);
        assert_eq!(settings.dpi, 1200);
        assert_eq!(settings.scene_detect_sensitivity, 25);
    }

    #[test]
    fn test_partial_document_merges_with_defaults() {
        let settings = AppSettings::from_json(r#"{"fps": 10, "dpi": 300}"#);
        assert_eq!(settings.fps, 10);
        assert_eq!(settings.dpi, 300);
        assert_eq!(settings.capture_format, CaptureFormat::Png);
        assert_eq!(settings.filename_format, FilenameFormat::Timestamp);
    }

    #[test]
    fn test_unreadable_document_falls_back_entirely() {
        assert_eq!(AppSettings::from_json("{nonsense"), AppSettings::default());
        assert_eq!(AppSettings::from_json(""), AppSettings::default());
    }

    #[test]
    fn test_roundtrip() {
        let mut settings = AppSettings::default();
        settings.capture_format = CaptureFormat::Jpeg;
        settings.filename_format = FilenameFormat::VideoTime;
        settings.fps = 12;

        let parsed = AppSettings::from_json(&settings.to_json());
        assert_eq!(parsed, settings);
    }
}
