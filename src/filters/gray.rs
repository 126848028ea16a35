//! Frame → luminance conversion.
use crate::image::{Frame, GridF32, PixelFormat};
use crate::parallel::ParallelGrid;

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Convert an 8-bit frame to a `[0, 1]` luminance grid (Rec.601 weights for
/// RGB input).
pub fn grayscale(grid: &ParallelGrid, frame: &Frame<'_>) -> GridF32 {
    let mut out = GridF32::new(frame.w, frame.h);
    let format = frame.format;
    grid.fill_rows(&mut out, |y, dst| {
        let src = frame.row_bytes(y);
        match format {
            PixelFormat::Gray8 => {
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d = s as f32 / 255.0;
                }
            }
            PixelFormat::Rgb8 => {
                for (d, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
                    let luma =
                        LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32;
                    *d = (luma / 255.0).clamp(0.0, 1.0);
                }
            }
        }
    });
    out
}

/// Wrap a tightly packed 8-bit gray buffer as an intensity grid.
pub fn intensity_from_u8(grid: &ParallelGrid, w: usize, h: usize, data: &[u8]) -> GridF32 {
    grayscale(grid, &Frame::gray(w, h, data))
}
