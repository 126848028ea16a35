//! Binary masks: thresholding, boolean combinators and 3×3 morphology.
use crate::image::{GridF32, ImageView, Mask};
use crate::parallel::ParallelGrid;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

/// `v >= cutoff` → foreground.
pub fn binarize(grid: &ParallelGrid, img: &GridF32, cutoff: f32) -> Mask {
    let mut out = Mask::new(img.w, img.h);
    grid.fill_rows(&mut out, |y, dst| {
        for (d, &v) in dst.iter_mut().zip(img.row(y)) {
            *d = v >= cutoff;
        }
    });
    out
}

fn combine<F>(grid: &ParallelGrid, a: &Mask, b: &Mask, op: F) -> Result<Mask, MaskError>
where
    F: Fn(bool, bool) -> bool + Sync + Send,
{
    if !a.same_dims(b) {
        return Err(MaskError::DimensionMismatch {
            left: a.dims(),
            right: b.dims(),
        });
    }
    let mut out = Mask::new(a.w, a.h);
    grid.fill(&mut out.data, |i| op(a.data[i], b.data[i]));
    Ok(out)
}

pub fn mask_and(grid: &ParallelGrid, a: &Mask, b: &Mask) -> Result<Mask, MaskError> {
    combine(grid, a, b, |p, q| p && q)
}

pub fn mask_or(grid: &ParallelGrid, a: &Mask, b: &Mask) -> Result<Mask, MaskError> {
    combine(grid, a, b, |p, q| p || q)
}

pub fn mask_xor(grid: &ParallelGrid, a: &Mask, b: &Mask) -> Result<Mask, MaskError> {
    combine(grid, a, b, |p, q| p ^ q)
}

pub fn mask_not(grid: &ParallelGrid, a: &Mask) -> Mask {
    let mut out = Mask::new(a.w, a.h);
    grid.fill(&mut out.data, |i| !a.data[i]);
    out
}

/// 3×3 erosion; pixels outside the image count as background.
pub fn erode(grid: &ParallelGrid, mask: &Mask) -> Mask {
    morph3x3(grid, mask, true)
}

/// 3×3 dilation; pixels outside the image count as background.
pub fn dilate(grid: &ParallelGrid, mask: &Mask) -> Mask {
    morph3x3(grid, mask, false)
}

fn morph3x3(grid: &ParallelGrid, mask: &Mask, erode: bool) -> Mask {
    let (w, h) = (mask.w, mask.h);
    let mut out = Mask::new(w, h);
    grid.fill_grid(&mut out, |x, y| {
        let mut all = true;
        let mut any = false;
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                let v = nx >= 0
                    && ny >= 0
                    && (nx as usize) < w
                    && (ny as usize) < h
                    && mask.get(nx as usize, ny as usize);
                all &= v;
                any |= v;
            }
        }
        if erode {
            all
        } else {
            any
        }
    });
    out
}
