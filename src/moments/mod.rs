//! Image moments and the covariance ellipse fit.
//!
//! Raw moments (orders 0–3) are accumulated either over an intensity grid
//! restricted to a foreground mask, over the mask itself, or over a discrete
//! point set. Central moments subtract the centroid and normalized moments
//! rescale by `m00^((p+q)/2 + 1)` for scale invariance.
//!
//! Anything derived from the centroid is undefined for an empty blob
//! (`m00 == 0`); the constructors return `None` in that case and callers
//! substitute [`EllipseFit::empty`].

pub mod central;
pub mod ellipse;
pub mod raw;

pub use central::{CentralMoments, HuMoments, NormalizedMoments};
pub use ellipse::EllipseFit;
pub use raw::RawMoments;
