//! Roberts-cross gradients with a globally rescaled magnitude.
//!
//! - `gx = I(x, y) − I(x+1, y+1)` and `gy = I(x+1, y) − I(x, y+1)`, border
//!   samples clamp (replicate).
//! - `mag = normalize(|gx| + |gy|)`: the element-wise sum is min/max rescaled
//!   into `[0, 1]` over the whole frame.
//!
//! Complexity: O(W·H) per pass; three float buffers.
use crate::image::{GridF32, ImageView};
use crate::parallel::ParallelGrid;

/// Per-pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Gradients {
    /// Main-diagonal derivative
    pub gx: GridF32,
    /// Anti-diagonal derivative
    pub gy: GridF32,
    /// `|gx| + |gy|` rescaled into `[0, 1]`
    pub mag: GridF32,
}

pub fn roberts_gradients(grid: &ParallelGrid, img: &GridF32) -> Gradients {
    let (w, h) = (img.w, img.h);
    let mut gx = GridF32::new(w, h);
    let mut gy = GridF32::new(w, h);
    if w == 0 || h == 0 {
        let mag = GridF32::new(w, h);
        return Gradients { gx, gy, mag };
    }

    grid.fill_rows(&mut gx, |y, dst| {
        let row0 = img.row(y);
        let row1 = img.row((y + 1).min(h - 1));
        for (x, out) in dst.iter_mut().enumerate() {
            let x1 = (x + 1).min(w - 1);
            *out = row0[x] - row1[x1];
        }
    });
    grid.fill_rows(&mut gy, |y, dst| {
        let row0 = img.row(y);
        let row1 = img.row((y + 1).min(h - 1));
        for (x, out) in dst.iter_mut().enumerate() {
            let x1 = (x + 1).min(w - 1);
            *out = row0[x1] - row1[x];
        }
    });

    let mut sum = GridF32::new(w, h);
    grid.fill_rows(&mut sum, |y, dst| {
        for ((out, &a), &b) in dst.iter_mut().zip(gx.row(y)).zip(gy.row(y)) {
            *out = a.abs() + b.abs();
        }
    });
    let mag = normalize(grid, &sum);

    Gradients { gx, gy, mag }
}

/// Min/max rescale into `[0, 1]`. A constant grid maps to all zeros;
/// non-finite samples are ignored when computing the range.
pub fn normalize(grid: &ParallelGrid, img: &GridF32) -> GridF32 {
    let (lo, hi) = grid.reduce(
        0..img.h,
        (f32::INFINITY, f32::NEG_INFINITY),
        |y| {
            img.row(y)
                .iter()
                .filter(|v| v.is_finite())
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        },
        |a, b| (a.0.min(b.0), a.1.max(b.1)),
    );
    let mut out = GridF32::new(img.w, img.h);
    let range = hi - lo;
    if !(range.is_finite() && range > 0.0) {
        return out;
    }
    let inv = 1.0 / range;
    grid.fill_rows(&mut out, |y, dst| {
        for (d, &s) in dst.iter_mut().zip(img.row(y)) {
            *d = ((s - lo) * inv).clamp(0.0, 1.0);
        }
    });
    out
}
