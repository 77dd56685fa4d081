use rayon::prelude::*;

use super::config::SharpeningLevel;
use crate::core::frame::Frame;

/// 3x3 cross-kernel convolution sharpen (up/down/left/right neighbors,
/// no diagonals). Border rows and columns are copied unchanged and the
/// alpha channel passes through untouched. Output rows are computed in
/// parallel; each row reads only from the source buffer.
pub(crate) fn apply(frame: &Frame, level: SharpeningLevel) -> Frame {
    let Some((center, side)) = level.kernel() else {
        return frame.clone();
    };

    let w = frame.width as usize;
    let h = frame.height as usize;
    if w < 3 || h < 3 {
        // Everything is border.
        return frame.clone();
    }

    let src = frame.data.as_slice();
    let row_bytes = w * 4;
    let mut out = vec![0u8; src.len()];

    out.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let off = y * row_bytes + x * 4;
                let ro = x * 4;
                row[ro + 3] = src[off + 3];

                if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    row[ro] = src[off];
                    row[ro + 1] = src[off + 1];
                    row[ro + 2] = src[off + 2];
                    continue;
                }

                for ch in 0..3 {
                    let val = src[off - row_bytes + ch] as f32 * side
                        + src[off + row_bytes + ch] as f32 * side
                        + src[off - 4 + ch] as f32 * side
                        + src[off + 4 + ch] as f32 * side
                        + src[off + ch] as f32 * center;
                    row[ro + ch] = val.clamp(0.0, 255.0).round() as u8;
                }
            }
        });

    Frame::new(frame.width, frame.height, out)
}
