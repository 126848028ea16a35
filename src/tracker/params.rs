//! Parameter types configuring the tracker stages.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only
//! has to name the knobs it changes. Defaults target a bright subject on a
//! dark arena at 30 fps.
use crate::analysis::Analysis;
use crate::faults::FaultPolicy;
use crate::hough::HoughParams;
use crate::orientation::OrientationParams;
use crate::parallel::DEFAULT_SPLIT_THRESHOLD;
use crate::trajectory::KalmanParams;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TrackerParams {
    /// Gaussian σ in pixels; `<= 0` disables the blur.
    pub blur_sigma: f32,
    pub threshold: ThresholdParams,
    pub morphology: MorphologyParams,
    /// Pixel → physical unit calibration (centimetres per pixel).
    pub cm_per_pixel: f64,
    pub edges: EdgeParams,
    pub hough: HoughParams,
    pub kalman: KalmanParams,
    pub orientation: OrientationParams,
    /// Substitution applied to heading and axis lengths on faulted frames.
    pub fault_policy: FaultPolicy,
    pub parallel: ParallelParams,
    /// Requested analyses; dependencies are added automatically.
    pub analyses: Vec<Analysis>,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            threshold: ThresholdParams::default(),
            morphology: MorphologyParams::default(),
            cm_per_pixel: 1.0,
            edges: EdgeParams::default(),
            hough: HoughParams::default(),
            kalman: KalmanParams::default(),
            orientation: OrientationParams::default(),
            fault_policy: FaultPolicy::default(),
            parallel: ParallelParams::default(),
            analyses: Analysis::all(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ThresholdParams {
    /// Pick the cutoff per frame with Otsu's method.
    pub otsu: bool,
    /// Cutoff in `[0, 1]` used when `otsu` is off.
    pub fixed_level: f32,
    /// Foreground is darker than the cutoff (dark subject, bright arena).
    pub invert: bool,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            otsu: true,
            fixed_level: 0.5,
            invert: false,
        }
    }
}

/// Binary cleanup applied to the thresholded mask (erosion first).
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MorphologyParams {
    pub erode: bool,
    pub dilate: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSource {
    /// Boundary of the foreground mask (`mask XOR erode(mask)`).
    #[default]
    MaskBoundary,
    /// Roberts gradient magnitude above `EdgeParams::magnitude_threshold`.
    Gradient,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EdgeParams {
    pub source: EdgeSource,
    /// Cutoff on the `[0, 1]` normalized gradient magnitude.
    pub magnitude_threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            source: EdgeSource::MaskBoundary,
            magnitude_threshold: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParallelParams {
    /// Worker threads; `None` uses rayon's default, `Some(1)` runs inline.
    pub threads: Option<usize>,
    /// Index count below which ranges are processed without splitting.
    pub split_threshold: usize,
}

impl Default for ParallelParams {
    fn default() -> Self {
        Self {
            threads: None,
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }
}
