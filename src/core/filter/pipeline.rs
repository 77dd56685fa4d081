use log::warn;

use super::cache::RenderCache;
use super::config::{FilterConfig, SharpeningLevel};
use super::{sharpen, tone};
use crate::core::frame::{CaptureFormat, Frame, JPEG_CAPTURE_QUALITY};

const CACHE_CAPACITY: usize = 20;
const KEY_PREFIX_LEN: usize = 64;

/// Renders captured stills through the configured filter stack.
///
/// The pipeline owns its bounded render cache; construct one per session and
/// call `clear` when deterministic state is needed (tests, new video).
pub struct FilterPipeline {
    cache: RenderCache,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            cache: RenderCache::new(CACHE_CAPACITY),
        }
    }

    /// Tone-maps, sharpens, and re-encodes `bytes` into the same container
    /// format. Input that cannot be decoded comes back unchanged - callers
    /// get a best-effort original instead of an error.
    pub fn render(&mut self, bytes: &[u8], format: CaptureFormat, config: &FilterConfig) -> Vec<u8> {
        let key = cache_key(bytes, config);
        if let Some(hit) = self.cache.get(&key) {
            return hit.to_vec();
        }

        let rendered = match render_uncached(bytes, format, config) {
            Ok(out) => out,
            Err(err) => {
                warn!("render failed, returning source bytes unchanged: {err}");
                return bytes.to_vec();
            }
        };

        self.cache.insert(key, rendered.clone());
        rendered
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn render_uncached(
    bytes: &[u8],
    format: CaptureFormat,
    config: &FilterConfig,
) -> Result<Vec<u8>, image::ImageError> {
    let mut frame = Frame::decode(bytes)?;
    tone::apply(&mut frame, config);
    if config.sharpening != SharpeningLevel::Off {
        frame = sharpen::apply(&frame, config.sharpening);
    }
    frame.encode(format, JPEG_CAPTURE_QUALITY)
}

/// Source identity is a byte prefix plus the total length; filter identity
/// is the serialized config. Key equality is deliberately looser than full
/// structural equality of the source bytes.
fn cache_key(bytes: &[u8], config: &FilterConfig) -> String {
    use std::fmt::Write as _;

    let mut prefix = String::with_capacity(KEY_PREFIX_LEN * 2);
    for b in bytes.iter().take(KEY_PREFIX_LEN) {
        let _ = write!(prefix, "{b:02x}");
    }
    format!("{}:{}:{}", bytes.len(), prefix, config.cache_fragment())
}
