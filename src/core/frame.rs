use std::io::Cursor;

use image::{ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};

/// JPEG quality used for captured stills.
pub const JPEG_CAPTURE_QUALITY: u8 = 92;

/// Container format of an encoded still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Png,
    Jpeg,
}

impl CaptureFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            CaptureFormat::Png => "png",
            CaptureFormat::Jpeg => "jpeg",
        }
    }
}

/// RGBA pixel surface sampled from the video collaborator.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Uniformly filled frame, mostly useful for tests and bring-up.
    pub fn solid(width: u32, height: u32, fill: u8) -> Self {
        Self::new(width, height, vec![fill; (width * height * 4) as usize])
    }

    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn resize_to(&self, target_width: u32, target_height: u32) -> Frame {
        let img = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame data does not match dimensions");
        let resized = image::imageops::resize(
            &img,
            target_width,
            target_height,
            image::imageops::FilterType::Triangle,
        );

        Frame {
            width: target_width,
            height: target_height,
            data: resized.into_raw(),
        }
    }

    /// Scales both dimensions by `scale`, never below 1x1.
    pub fn downsample(&self, scale: f32) -> Frame {
        let w = ((self.width as f32 * scale).round() as u32).max(1);
        let h = ((self.height as f32 * scale).round() as u32).max(1);
        self.resize_to(w, h)
    }

    pub fn decode(bytes: &[u8]) -> Result<Frame, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Frame {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        })
    }

    /// Encodes the surface into the requested container. JPEG drops the
    /// alpha channel; `jpeg_quality` is ignored for PNG.
    pub fn encode(
        &self,
        format: CaptureFormat,
        jpeg_quality: u8,
    ) -> Result<Vec<u8>, image::ImageError> {
        let img = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame data does not match dimensions");
        let mut buffer = Cursor::new(Vec::new());
        match format {
            CaptureFormat::Png => {
                image::DynamicImage::ImageRgba8(img).write_to(&mut buffer, ImageOutputFormat::Png)?
            }
            CaptureFormat::Jpeg => {
                let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
                image::DynamicImage::ImageRgb8(rgb)
                    .write_to(&mut buffer, ImageOutputFormat::Jpeg(jpeg_quality))?
            }
        }
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::solid(100, 100, 255);

        assert_eq!(frame.width, 100);
        assert_eq!(frame.height, 100);
        assert_eq!(frame.pixel_count(), 10000);
        assert_eq!(frame.data.len(), 100 * 100 * 4);
    }

    #[test]
    fn test_frame_resize() {
        let frame = Frame::solid(100, 100, 255);
        let resized = frame.resize_to(32, 32);

        assert_eq!(resized.width, 32);
        assert_eq!(resized.height, 32);
        assert_eq!(resized.data.len(), 32 * 32 * 4);
    }

    #[test]
    fn test_downsample_never_collapses() {
        let frame = Frame::solid(5, 3, 10);
        let small = frame.downsample(0.1);
        assert_eq!((small.width, small.height), (1, 1));
    }

    #[test]
    fn test_png_roundtrip() {
        let frame = Frame::solid(16, 8, 77);
        let bytes = frame.encode(CaptureFormat::Png, JPEG_CAPTURE_QUALITY).unwrap();
        let decoded = Frame::decode(&bytes).unwrap();

        assert_eq!(decoded.width, 16);
        assert_eq!(decoded.height, 8);
        assert_eq!(decoded.data, frame.data);
    }

    #[test]
    fn test_jpeg_encode() {
        let frame = Frame::solid(16, 16, 128);
        let bytes = frame.encode(CaptureFormat::Jpeg, 80).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = Frame::decode(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (16, 16));
    }
}
