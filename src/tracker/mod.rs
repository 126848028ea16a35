//! Single-subject tracker orchestrating the per-frame numeric pipeline.
//!
//! Overview
//! - Converts the frame to a `[0, 1]` intensity grid and applies the separable
//!   Gaussian blur.
//! - Thresholds with Otsu's method (or a fixed level), optionally inverted for
//!   dark subjects, followed by the erosion/dilation toggles.
//! - Accumulates intensity-weighted moments over the foreground and fits the
//!   covariance ellipse. Empty frames fall back to the frame centre.
//! - Resolves the head/tail ambiguity with the incremental Viterbi corrector,
//!   driven by the finite-difference velocity of the raw centroid.
//! - Smooths the centroid with the per-axis Kalman filter.
//! - Votes the edge mask (mask boundary or gradient) into the Hough
//!   accumulator for line and point overlays.
//!
//! Modules
//! - [`params`] – configuration types used by the tracker and CLI.
//! - `pipeline` – the [`Tracker`] implementation.

pub mod params;
mod pipeline;

pub use params::{
    EdgeParams, EdgeSource, MorphologyParams, ParallelParams, ThresholdParams, TrackerParams,
};
pub use pipeline::Tracker;
