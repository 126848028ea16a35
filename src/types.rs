use crate::diagnostics::TimingBreakdown;
use crate::faults::GuardedValue;
use crate::hough::{HoughLine, HoughPoint};
use crate::moments::{EllipseFit, HuMoments};
use crate::orientation::AxisLabel;
use nalgebra::{Point2, Vector2};
use serde::Serialize;

/// Disambiguated heading of the subject for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Orientation {
    NotOriented,
    Oriented { angle: f64, label: AxisLabel },
}

impl Orientation {
    pub fn angle(&self) -> Option<f64> {
        match *self {
            Orientation::NotOriented => None,
            Orientation::Oriented { angle, .. } => Some(angle),
        }
    }

    pub fn is_oriented(&self) -> bool {
        matches!(self, Orientation::Oriented { .. })
    }
}

/// Per-frame scalars after fault substitution. Each `faulted` flag marks a
/// substituted value, including the undefined scalars of an empty frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameScalars {
    /// Raw major-axis angle, radians.
    pub axis_angle: GuardedValue,
    /// Major axis length, physical units.
    pub major_length: GuardedValue,
    /// Minor axis length, physical units.
    pub minor_length: GuardedValue,
}

impl FrameScalars {
    pub fn any_faulted(&self) -> bool {
        self.axis_angle.faulted || self.major_length.faulted || self.minor_length.faulted
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameResult {
    pub frame_index: u64,
    pub timestamp: Option<f64>,
    /// No foreground mass after thresholding.
    pub empty: bool,
    /// A scalar of a non-empty frame was substituted under the fault policy.
    ///
    /// Always `false` when `empty` is set: the scalars of an empty frame are
    /// still substituted and flagged in [`FrameScalars`], but an empty arena
    /// is reported through `empty` rather than as a fault.
    pub faulted: bool,
    /// Binarization cutoff in `[0, 1]`.
    pub threshold: f32,
    pub foreground_pixels: usize,
    pub ellipse: EllipseFit,
    pub hu: Option<HuMoments>,
    pub scalars: FrameScalars,
    pub orientation: Orientation,
    /// Filtered centroid in pixels.
    pub smoothed: Point2<f64>,
    /// Filtered velocity in pixels per second.
    pub velocity: Option<Vector2<f64>>,
    pub edge_pixels: usize,
    pub hough_lines: Vec<HoughLine>,
    pub hough_points: Vec<HoughPoint>,
    pub timing: TimingBreakdown,
}
