//! Pixel-parallel image filters feeding the moment and Hough stages.
//!
//! Every filter here is a [`ParallelGrid`](crate::parallel::ParallelGrid)
//! operation that reads one published grid and produces a new one:
//!
//! - [`gray`]: frame → `[0, 1]` luminance grid.
//! - [`gaussian`]: normalized Gaussian taps and the two-pass separable blur
//!   (borders clamp, never wrap).
//! - [`gradient`]: Roberts-cross derivatives and a globally rescaled
//!   magnitude.
//! - [`otsu`]: 256-bin histogram and Otsu's between-class-variance threshold.
//! - [`mask`]: binarization, boolean combinators and 3×3 erosion/dilation.
//! - [`runs`]: run-length ("block series") encoding of masks.

pub mod gaussian;
pub mod gradient;
pub mod gray;
pub mod mask;
pub mod otsu;
pub mod runs;

pub use gaussian::{convolve_full, separable_blur, GaussianKernel, SeparableFilter};
pub use gradient::{normalize, roberts_gradients, Gradients};
pub use gray::{grayscale, intensity_from_u8};
pub use mask::{binarize, dilate, erode, mask_and, mask_not, mask_or, mask_xor, MaskError};
pub use otsu::{otsu_cutoff, otsu_threshold, otsu_threshold_brute_force, Histogram256};
pub use runs::{Run, RunLengthMask};

/// Clamp a signed sample index into `[0, upper)` (replicate border).
#[inline]
pub(crate) fn clamp_index(idx: isize, upper: usize) -> usize {
    if upper == 0 {
        return 0;
    }
    if idx < 0 {
        0
    } else if (idx as usize) >= upper {
        upper - 1
    } else {
        idx as usize
    }
}
