const SOI: [u8; 2] = [0xFF, 0xD8];
const JFIF_ID: [u8; 5] = *b"JFIF\0";

/// Overwrites the density fields of the first JFIF `APP0` segment in place;
/// the segment layout is fixed-size, so nothing shifts. Returns `None` when
/// the stream is not a JPEG or no JFIF `APP0` is found before the scan hits
/// entropy-coded data.
pub(super) fn inject(bytes: &[u8], dpi: u32) -> Option<Vec<u8>> {
    if bytes.len() < 4 || bytes[..2] != SOI {
        return None;
    }

    let density = (dpi.min(u16::MAX as u32) as u16).to_be_bytes();
    let mut out = bytes.to_vec();
    let mut pos = 2usize;

    while pos + 4 <= out.len() {
        if out[pos] != 0xFF {
            return None;
        }
        let marker = out[pos + 1];
        let seg_len = u16::from_be_bytes([out[pos + 2], out[pos + 3]]) as usize;

        if marker == 0xE0 && pos + 16 <= out.len() && out[pos + 4..pos + 9] == JFIF_ID {
            out[pos + 11] = 1; // density unit: dots per inch
            out[pos + 12..pos + 14].copy_from_slice(&density);
            out[pos + 14..pos + 16].copy_from_slice(&density);
            return Some(out);
        }

        pos += seg_len + 2;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{CaptureFormat, Frame};

    fn sample_jpeg() -> Vec<u8> {
        Frame::solid(8, 8, 90).encode(CaptureFormat::Jpeg, 85).unwrap()
    }

    fn app0_offset(bytes: &[u8]) -> usize {
        let mut pos = 2;
        loop {
            assert_eq!(bytes[pos], 0xFF);
            if bytes[pos + 1] == 0xE0 {
                return pos;
            }
            pos += u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize + 2;
        }
    }

    #[test]
    fn test_density_fields_overwritten_in_place() {
        let jpeg = sample_jpeg();
        let out = inject(&jpeg, 300).unwrap();

        assert_eq!(out.len(), jpeg.len());
        let pos = app0_offset(&out);
        assert_eq!(&out[pos + 4..pos + 9], b"JFIF\0");
        assert_eq!(out[pos + 11], 1);
        assert_eq!(u16::from_be_bytes([out[pos + 12], out[pos + 13]]), 300);
        assert_eq!(u16::from_be_bytes([out[pos + 14], out[pos + 15]]), 300);
    }

    #[test]
    fn test_only_density_bytes_differ() {
        let jpeg = sample_jpeg();
        let out = inject(&jpeg, 1200).unwrap();
        let pos = app0_offset(&jpeg);
        let changed: Vec<usize> = jpeg
            .iter()
            .zip(out.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert!(changed.iter().all(|i| (pos + 11..pos + 16).contains(i)));
    }

    #[test]
    fn test_non_jpeg_rejected() {
        assert!(inject(b"plain text", 300).is_none());
        assert!(inject(&[0x89, 0x50, 0x4E, 0x47], 300).is_none());
    }

    #[test]
    fn test_oversized_dpi_saturates() {
        let out = inject(&sample_jpeg(), 100_000).unwrap();
        let pos = app0_offset(&out);
        assert_eq!(u16::from_be_bytes([out[pos + 12], out[pos + 13]]), u16::MAX);
    }
}
