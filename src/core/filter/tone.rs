use image::RgbaImage;

use super::config::FilterConfig;
use crate::core::frame::Frame;

/// Rec.601 luminance of an RGB triple.
fn luma(r: f32, g: f32, b: f32) -> f32 {
    r * 0.299 + g * 0.587 + b * 0.114
}

/// Applies brightness, contrast, saturation, grayscale, and sepia as one
/// batched per-pixel pass, in that order, then a Gaussian blur when the
/// radius is non-zero. Stages at their neutral value are skipped so a
/// neutral config is an exact identity. Alpha passes through.
pub(crate) fn apply(frame: &mut Frame, config: &FilterConfig) {
    let brightness = config.brightness / 100.0;
    let contrast = config.contrast / 100.0;
    let saturation = config.saturation / 100.0;
    let grayscale = (config.grayscale / 100.0).clamp(0.0, 1.0);
    let sepia = (config.sepia / 100.0).clamp(0.0, 1.0);

    let scale_brightness = brightness != 1.0;
    let scale_contrast = contrast != 1.0;
    let scale_saturation = saturation != 1.0;
    let blend_grayscale = grayscale > 0.0;
    let blend_sepia = sepia > 0.0;

    if scale_brightness || scale_contrast || scale_saturation || blend_grayscale || blend_sepia {
        for px in frame.data.chunks_exact_mut(4) {
            let mut r = px[0] as f32;
            let mut g = px[1] as f32;
            let mut b = px[2] as f32;

            if scale_brightness {
                r *= brightness;
                g *= brightness;
                b *= brightness;
            }
            if scale_contrast {
                r = (r - 127.5) * contrast + 127.5;
                g = (g - 127.5) * contrast + 127.5;
                b = (b - 127.5) * contrast + 127.5;
            }
            if scale_saturation {
                let l = luma(r, g, b);
                r = l + (r - l) * saturation;
                g = l + (g - l) * saturation;
                b = l + (b - l) * saturation;
            }
            if blend_grayscale {
                let l = luma(r, g, b);
                r += (l - r) * grayscale;
                g += (l - g) * grayscale;
                b += (l - b) * grayscale;
            }
            if blend_sepia {
                let sr = r * 0.393 + g * 0.769 + b * 0.189;
                let sg = r * 0.349 + g * 0.686 + b * 0.168;
                let sb = r * 0.272 + g * 0.534 + b * 0.131;
                r += (sr - r) * sepia;
                g += (sg - g) * sepia;
                b += (sb - b) * sepia;
            }

            px[0] = r.clamp(0.0, 255.0).round() as u8;
            px[1] = g.clamp(0.0, 255.0).round() as u8;
            px[2] = b.clamp(0.0, 255.0).round() as u8;
        }
    }

    if config.blur > 0.0 {
        let img = RgbaImage::from_raw(frame.width, frame.height, std::mem::take(&mut frame.data))
            .expect("frame data does not match dimensions");
        frame.data = image::imageops::blur(&img, config.blur).into_raw();
    }
}
