#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod image;
pub mod tracker;
pub mod types;

// Building blocks of the pipeline, usable on their own.
pub mod analysis;
pub mod angle;
pub mod faults;
pub mod filters;
pub mod handoff;
pub mod hough;
pub mod moments;
pub mod orientation;
pub mod parallel;
pub mod trajectory;

// --- High-level re-exports -------------------------------------------------

// Main entry points: tracker + results.
pub use crate::tracker::{Tracker, TrackerParams};
pub use crate::types::{FrameResult, FrameScalars, Orientation};

// Engine and error types callers commonly touch.
pub use crate::faults::{FaultPolicy, ScalarFault};
pub use crate::image::FrameError;
pub use crate::parallel::ParallelGrid;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use animal_tracker::prelude::*;
///
/// # fn main() {
/// let (w, h) = (64usize, 48usize);
/// let gray = vec![0u8; w * h];
/// let mut tracker = Tracker::with_grid(TrackerParams::default(), ParallelGrid::sequential());
///
/// let result = tracker.process(&Frame::gray(w, h, &gray), None).unwrap();
/// println!("empty={} total_ms={:.3}", result.empty, result.timing.total_ms);
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{Frame, GridF32, Mask, PixelFormat};
    pub use crate::{FrameResult, Orientation, ParallelGrid, Tracker, TrackerParams};
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    pub use crate::analysis::{Analysis, AnalysisPlan};
    pub use crate::hough::{HoughDetector, HoughLine, HoughParams, HoughPoint, HoughResult};
    pub use crate::moments::{CentralMoments, EllipseFit, HuMoments, NormalizedMoments, RawMoments};
    pub use crate::orientation::{AxisLabel, OrientationCorrector, OrientationDecision};
    pub use crate::trajectory::{KalmanParams, TrajectoryFilter};

    pub use crate::diagnostics::{StageTiming, TimingBreakdown};
}
