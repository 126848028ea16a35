//! Normalized Gaussian taps and the separable two-pass blur.
//!
//! The blur runs a horizontal 1-D convolution into an intermediate buffer and
//! a vertical 1-D convolution over that buffer, each as a row-parallel fill.
//! Samples outside the image clamp to the nearest edge pixel. Because
//! clamping is applied per axis, the result equals the full 2-D convolution
//! with the outer product of the taps ([`convolve_full`]) up to rounding.
use super::clamp_index;
use crate::image::{GridF32, ImageView};
use crate::parallel::ParallelGrid;

/// 1-D filter applied separably along x then y.
pub trait SeparableFilter {
    /// Taps in left-to-right order. The length is odd and the centre tap sits
    /// at `taps().len() / 2`.
    fn taps(&self) -> &[f32];

    fn radius(&self) -> usize {
        self.taps().len() / 2
    }
}

/// Sampled Gaussian with radius `ceil(3σ)` and unit sum.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    sigma: f32,
    taps: Vec<f32>,
}

impl GaussianKernel {
    /// Build the kernel for `sigma`. Non-positive or non-finite sigma yields
    /// the identity kernel `[1]`.
    pub fn new(sigma: f32) -> Self {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Self {
                sigma: 0.0,
                taps: vec![1.0],
            };
        }
        let radius = ((3.0 * sigma).ceil() as usize).max(1);
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let d = i as f32 - radius as f32;
                (-d * d / denom).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { sigma, taps }
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn is_identity(&self) -> bool {
        self.taps.len() == 1
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

impl SeparableFilter for [f32] {
    #[inline]
    fn taps(&self) -> &[f32] {
        self
    }
}

/// Two-pass separable convolution with border clamping.
pub fn separable_blur<K>(grid: &ParallelGrid, img: &GridF32, kernel: &K) -> GridF32
where
    K: SeparableFilter + Sync + ?Sized,
{
    let taps = kernel.taps();
    assert!(taps.len() % 2 == 1, "separable kernel must have odd length");
    if taps.len() == 1 && taps[0] == 1.0 {
        return img.clone();
    }
    let (w, h) = (img.w, img.h);
    let radius = taps.len() / 2;

    let mut horiz = GridF32::new(w, h);
    grid.fill_rows(&mut horiz, |y, dst| {
        let src = img.row(y);
        for (x, out) in dst.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &tap) in taps.iter().enumerate() {
                let sx = clamp_index(x as isize + k as isize - radius as isize, w);
                acc += tap * src[sx];
            }
            *out = acc;
        }
    });

    let mut out = GridF32::new(w, h);
    grid.fill_rows(&mut out, |y, dst| {
        dst.fill(0.0);
        for (k, &tap) in taps.iter().enumerate() {
            let sy = clamp_index(y as isize + k as isize - radius as isize, h);
            for (d, &s) in dst.iter_mut().zip(horiz.row(sy)) {
                *d += tap * s;
            }
        }
    });
    out
}

/// Direct 2-D convolution with the outer product `taps ⊗ taps`. Reference
/// implementation for [`separable_blur`]; O(W·H·K²).
pub fn convolve_full<K>(img: &GridF32, kernel: &K) -> GridF32
where
    K: SeparableFilter + ?Sized,
{
    let taps = kernel.taps();
    let radius = taps.len() / 2;
    let mut out = GridF32::new(img.w, img.h);
    for y in 0..img.h {
        for x in 0..img.w {
            let mut acc = 0.0f32;
            for (ky, &ty) in taps.iter().enumerate() {
                let sy = clamp_index(y as isize + ky as isize - radius as isize, img.h);
                let row = img.row(sy);
                for (kx, &tx) in taps.iter().enumerate() {
                    let sx = clamp_index(x as isize + kx as isize - radius as isize, img.w);
                    acc += ty * tx * row[sx];
                }
            }
            out.set(x, y, acc);
        }
    }
    out
}
