use serde::{Deserialize, Serialize};

/// Strength of the 3x3 convolution sharpen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharpeningLevel {
    Off,
    Low,
    Medium,
    High,
}

impl SharpeningLevel {
    /// Center and 4-neighbor weights of the sharpening kernel.
    pub(crate) fn kernel(&self) -> Option<(f32, f32)> {
        match self {
            SharpeningLevel::Off => None,
            SharpeningLevel::Low => Some((3.0, -0.5)),
            SharpeningLevel::Medium => Some((5.0, -1.0)),
            SharpeningLevel::High => Some((7.0, -1.5)),
        }
    }
}

/// Per-frame adjustment set. Percent fields are neutral at 100 and carry no
/// upper bound here; clamping happens only where edits enter the system
/// (`sanitized`). A frame edit swaps in a whole new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Blur radius in pixels; 0 disables the pass.
    pub blur: f32,
    /// 0-100 blend toward the grayscale version.
    pub grayscale: f32,
    /// 0-100 blend toward the sepia version.
    pub sepia: f32,
    pub sharpening: SharpeningLevel,
    /// Density stamped into the exported container, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            grayscale: 0.0,
            sepia: 0.0,
            sharpening: SharpeningLevel::Off,
            dpi: None,
        }
    }
}

impl FilterConfig {
    /// Defaults applied to every fresh capture.
    pub fn capture_default(dpi: u32) -> Self {
        Self {
            sharpening: SharpeningLevel::Low,
            dpi: Some(dpi),
            ..Self::default()
        }
    }

    /// Clamps every field to the range the editing surface exposes.
    /// The pipeline itself accepts unclamped values.
    pub fn sanitized(mut self) -> Self {
        self.brightness = self.brightness.clamp(0.0, 200.0);
        self.contrast = self.contrast.clamp(0.0, 200.0);
        self.saturation = self.saturation.clamp(0.0, 200.0);
        self.blur = self.blur.max(0.0);
        self.grayscale = self.grayscale.clamp(0.0, 100.0);
        self.sepia = self.sepia.clamp(0.0, 100.0);
        self
    }

    /// Serialized form used as the filter half of a render-cache key.
    pub(crate) fn cache_fragment(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let config = FilterConfig::default();
        assert_eq!(config.brightness, 100.0);
        assert_eq!(config.contrast, 100.0);
        assert_eq!(config.saturation, 100.0);
        assert_eq!(config.blur, 0.0);
        assert_eq!(config.sharpening, SharpeningLevel::Off);
        assert!(config.dpi.is_none());
    }

    #[test]
    fn test_capture_default() {
        let config = FilterConfig::capture_default(300);
        assert_eq!(config.sharpening, SharpeningLevel::Low);
        assert_eq!(config.dpi, Some(300));
    }

    #[test]
    fn test_sanitized_clamps_edit_bounds() {
        let config = FilterConfig {
            brightness: 500.0,
            contrast: -20.0,
            saturation: 180.0,
            blur: -3.0,
            grayscale: 150.0,
            sepia: -1.0,
            ..FilterConfig::default()
        }
        .sanitized();

        assert_eq!(config.brightness, 200.0);
        assert_eq!(config.contrast, 0.0);
        assert_eq!(config.saturation, 180.0);
        assert_eq!(config.blur, 0.0);
        assert_eq!(config.grayscale, 100.0);
        assert_eq!(config.sepia, 0.0);
    }

    #[test]
    fn test_cache_fragment_distinguishes_configs() {
        let a = FilterConfig::default();
        let b = FilterConfig {
            brightness: 120.0,
            ..FilterConfig::default()
        };
        assert_ne!(a.cache_fragment(), b.cache_fragment());
        assert_eq!(a.cache_fragment(), FilterConfig::default().cache_fragment());
    }
}
