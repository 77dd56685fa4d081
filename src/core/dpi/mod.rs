//! Embedded print-resolution (DPI) metadata.
//!
//! PNG gets a rebuilt chunk stream with a fresh `pHYs` record after IHDR;
//! JPEG gets the JFIF density fields of its `APP0` segment overwritten in
//! place. Pixel payloads are never touched, and re-applying the same DPI is
//! byte-identical.

mod jpeg;
mod png;

use log::debug;

/// Stamps `dpi` into the container metadata of `bytes`.
///
/// Infallible by contract: input that is neither an identifiable PNG nor a
/// JFIF JPEG (including structurally broken streams) comes back unchanged.
pub fn inject_dpi(bytes: &[u8], dpi: u32) -> Vec<u8> {
    if dpi == 0 {
        return bytes.to_vec();
    }
    if let Some(out) = png::inject(bytes, dpi) {
        return out;
    }
    if let Some(out) = jpeg::inject(bytes, dpi) {
        return out;
    }
    debug!("inject_dpi: no PNG or JFIF container recognized, passing bytes through");
    bytes.to_vec()
}
