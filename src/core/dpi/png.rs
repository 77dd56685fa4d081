use once_cell::sync::Lazy;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
/// Pixels-per-inch to pixels-per-meter.
const PPM_PER_DPI: f64 = 39.3701;

static CRC_TABLE: Lazy<[u32; 256]> = Lazy::new(|| {
    let mut table = [0u32; 256];
    for (n, entry) in table.iter_mut().enumerate() {
        let mut c = n as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
        }
        *entry = c;
    }
    table
});

/// IEEE CRC32 over the concatenation of `parts`.
fn crc32(parts: &[&[u8]]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for part in parts {
        for &byte in *part {
            c = CRC_TABLE[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
        }
    }
    c ^ 0xFFFF_FFFF
}

/// Serializes one chunk: length, type, data, CRC over type + data. The CRC
/// is always computed fresh, also for chunks copied from the input.
fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(&[kind, data]).to_be_bytes());
}

fn phys_data(dpi: u32) -> [u8; 9] {
    let ppm = (dpi as f64 * PPM_PER_DPI).round() as u32;
    let mut data = [0u8; 9];
    data[0..4].copy_from_slice(&ppm.to_be_bytes());
    data[4..8].copy_from_slice(&ppm.to_be_bytes());
    data[8] = 1; // unit: meter
    data
}

/// Rebuilds the chunk stream with a fresh `pHYs` right after IHDR; any
/// existing `pHYs` is dropped. Returns `None` when the stream is not a
/// structurally complete PNG, leaving the caller to pass the input through.
pub(super) fn inject(bytes: &[u8], dpi: u32) -> Option<Vec<u8>> {
    if bytes.len() < SIGNATURE.len() + 12 || bytes[..8] != SIGNATURE {
        return None;
    }

    let mut out = Vec::with_capacity(bytes.len() + 21);
    out.extend_from_slice(&SIGNATURE);

    let mut pos = SIGNATURE.len();
    while pos + 8 <= bytes.len() {
        let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().ok()?) as usize;
        let kind: [u8; 4] = bytes[pos + 4..pos + 8].try_into().ok()?;
        let total = 12 + len;
        if pos + total > bytes.len() {
            return None;
        }
        let data = &bytes[pos + 8..pos + 8 + len];

        match &kind {
            b"IHDR" => {
                write_chunk(&mut out, &kind, data);
                write_chunk(&mut out, b"pHYs", &phys_data(dpi));
            }
            b"pHYs" => {} // replaced next to IHDR
            b"IEND" => {
                write_chunk(&mut out, &kind, data);
                return Some(out);
            }
            _ => write_chunk(&mut out, &kind, data),
        }

        pos += total;
    }

    // Ran out of bytes before IEND.
    None
}
