//! Per-frame pipeline: frame → intensity → blur → threshold → morphology →
//! moments → ellipse → orientation → trajectory, with the Hough stage fed by
//! the edge mask on the side.
//!
//! Typical usage:
//! ```no_run
//! use animal_tracker::image::Frame;
//! use animal_tracker::{Tracker, TrackerParams};
//!
//! # fn example(pixels: &[u8], w: usize, h: usize, t: f64) {
//! let mut tracker = Tracker::new(TrackerParams::default());
//! let result = tracker.process(&Frame::gray(w, h, pixels), Some(t)).expect("valid frame");
//! if let Some(angle) = result.orientation.angle() {
//!     println!("heading {angle:.3} rad at {:?}", result.smoothed);
//! }
//! # }
//! ```
use super::params::{EdgeSource, TrackerParams};
use crate::analysis::{Analysis, AnalysisPlan};
use crate::diagnostics::{elapsed_ms, StageTiming, TimingBreakdown};
use crate::faults::{ScalarFault, ScalarGuard};
use crate::filters::{
    binarize, dilate, erode, grayscale, mask_not, mask_xor, otsu_cutoff, otsu_threshold,
    roberts_gradients, separable_blur, GaussianKernel, Histogram256, RunLengthMask,
};
use crate::hough::{HoughDetector, HoughResult};
use crate::image::{Frame, FrameError, GridF32, Mask};
use crate::moments::{CentralMoments, EllipseFit, HuMoments, NormalizedMoments, RawMoments};
use crate::orientation::{AxisLabel, OrientationCorrector};
use crate::parallel::ParallelGrid;
use crate::trajectory::TrajectoryFilter;
use crate::types::{FrameResult, FrameScalars, Orientation};
use log::{debug, warn};
use nalgebra::{Point2, Vector2};
use std::time::Instant;

/// Raw centroid of the last frame that reached the orientation stage.
#[derive(Clone, Copy, Debug)]
struct MotionSample {
    centroid: Point2<f64>,
    timestamp: Option<f64>,
    frame_index: u64,
}

/// Single-subject tracker. Frames must be fed in arrival order.
pub struct Tracker {
    params: TrackerParams,
    grid: ParallelGrid,
    plan: AnalysisPlan,
    kernel: GaussianKernel,
    orientation: OrientationCorrector,
    trajectory: TrajectoryFilter,
    hough: HoughDetector,
    angle_guard: ScalarGuard,
    major_guard: ScalarGuard,
    minor_guard: ScalarGuard,
    last_motion: Option<MotionSample>,
    frame_index: u64,
    last_mask: Option<Mask>,
}

impl Tracker {
    /// Create a tracker with its own pool sized by `params.parallel`.
    pub fn new(params: TrackerParams) -> Self {
        let grid = ParallelGrid::from_threads(params.parallel.threads)
            .with_threshold(params.parallel.split_threshold);
        Self::with_grid(params, grid)
    }

    /// Create a tracker on an injected engine (shared pool, or sequential
    /// for deterministic tests).
    pub fn with_grid(params: TrackerParams, grid: ParallelGrid) -> Self {
        let plan = AnalysisPlan::resolve(&params.analyses);
        debug!(
            "Tracker: analyses={:?} threads={} split_threshold={}",
            plan.names(),
            grid.threads(),
            grid.threshold()
        );
        let policy = params.fault_policy;
        Self {
            kernel: GaussianKernel::new(params.blur_sigma),
            orientation: OrientationCorrector::new(params.orientation),
            trajectory: TrajectoryFilter::new(params.kalman),
            hough: HoughDetector::new(params.hough),
            angle_guard: ScalarGuard::new("axis angle", policy),
            major_guard: ScalarGuard::new("major length", policy),
            minor_guard: ScalarGuard::new("minor length", policy),
            last_motion: None,
            frame_index: 0,
            last_mask: None,
            plan,
            grid,
            params,
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    pub fn plan(&self) -> &AnalysisPlan {
        &self.plan
    }

    pub fn grid(&self) -> &ParallelGrid {
        &self.grid
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Foreground mask of the most recent frame.
    pub fn last_mask(&self) -> Option<&Mask> {
        self.last_mask.as_ref()
    }

    /// Globally optimal keep/flip labeling of every oriented frame so far.
    pub fn orientation_path(&self) -> Vec<AxisLabel> {
        self.orientation.best_path()
    }

    /// Forget all temporal state (trellis, Kalman filter, fault history).
    pub fn reset(&mut self) {
        self.orientation.reset();
        self.trajectory.reset();
        self.angle_guard.reset();
        self.major_guard.reset();
        self.minor_guard.reset();
        self.last_motion = None;
        self.frame_index = 0;
        self.last_mask = None;
    }

    /// Validate and process one 8-bit frame.
    pub fn process(
        &mut self,
        frame: &Frame<'_>,
        timestamp: Option<f64>,
    ) -> Result<FrameResult, FrameError> {
        frame.validate()?;
        let start = Instant::now();
        let gray = grayscale(&self.grid, frame);
        let gray_ms = elapsed_ms(start);
        let mut result = self.process_intensity(&gray, timestamp);
        result
            .timing
            .stages
            .insert(0, StageTiming::new("grayscale", gray_ms));
        result.timing.total_ms += gray_ms;
        Ok(result)
    }

    /// Process one `[0, 1]` intensity grid.
    pub fn process_intensity(&mut self, img: &GridF32, timestamp: Option<f64>) -> FrameResult {
        let total_start = Instant::now();
        let mut timing = TimingBreakdown::default();
        let frame_index = self.frame_index;
        self.frame_index += 1;
        let center = img.center();

        let blurred = timing.time("blur", || separable_blur(&self.grid, img, &self.kernel));
        let (mask, cutoff) = timing.time("threshold", || self.segment(&blurred));
        let mask = timing.time("morphology", || self.clean(mask));

        let raw = timing.time("moments", || {
            if self.params.threshold.invert {
                let mut weights = GridF32::new(blurred.w, blurred.h);
                self.grid
                    .fill(&mut weights.data, |i| 1.0 - blurred.data[i]);
                RawMoments::from_grid(&self.grid, &weights, &mask)
            } else {
                RawMoments::from_grid(&self.grid, &blurred, &mask)
            }
        });
        let empty = raw.is_empty();
        let central = CentralMoments::from_raw(&raw);
        let ellipse = match &central {
            Some(c) => EllipseFit::from_central(c, self.params.cm_per_pixel),
            None => EllipseFit::empty(center),
        };
        let hu = central
            .filter(|c| self.plan.contains(Analysis::HuInvariants) && c.is_finite())
            .map(|c| HuMoments::from_normalized(&NormalizedMoments::from_central(&c)));

        let scalars = self.guard_scalars(empty, &ellipse);
        let faulted = !empty && scalars.any_faulted();

        let orientation = timing.time("orientation", || {
            self.orient(empty, scalars.axis_angle.faulted, &ellipse, timestamp, frame_index)
        });

        let smoothed = timing.time("trajectory", || {
            let measured = ellipse.centroid;
            let usable = !empty && measured.x.is_finite() && measured.y.is_finite();
            if !self.plan.contains(Analysis::Trajectory) {
                return if usable { measured } else { center };
            }
            if usable {
                self.trajectory.update(measured, timestamp)
            } else {
                self.trajectory.position().unwrap_or(center)
            }
        });

        let (edge_pixels, hough) = if self.plan.contains(Analysis::Edges) {
            let edges = timing.time("edges", || self.edges(&blurred, &mask));
            let rle = RunLengthMask::from_mask(&self.grid, &edges);
            let hough = if self.plan.contains(Analysis::Hough) {
                timing.time("hough", || self.hough.detect(&self.grid, &rle))
            } else {
                HoughResult::default()
            };
            (rle.count(), hough)
        } else {
            (0, HoughResult::default())
        };

        let foreground_pixels = mask.count_true();
        self.last_mask = Some(mask);
        timing.total_ms = elapsed_ms(total_start);

        debug!(
            "frame {frame_index}: empty={empty} faulted={faulted} fg={foreground_pixels} cutoff={cutoff:.3} orientation={orientation:?} total_ms={:.3}",
            timing.total_ms
        );

        FrameResult {
            frame_index,
            timestamp,
            empty,
            faulted,
            threshold: cutoff,
            foreground_pixels,
            ellipse,
            hu,
            scalars,
            orientation,
            smoothed,
            velocity: self.trajectory.velocity(),
            edge_pixels,
            hough_lines: hough.lines,
            hough_points: hough.points,
            timing,
        }
    }

    /// Threshold the blurred grid. Uniform frames yield an empty mask since
    /// Otsu has no split to make.
    fn segment(&self, blurred: &GridF32) -> (Mask, f32) {
        let th = &self.params.threshold;
        let cutoff = if th.otsu {
            let hist = Histogram256::from_grid(&self.grid, blurred);
            if hist.populated_bins() < 2 {
                return (Mask::new(blurred.w, blurred.h), 1.0);
            }
            otsu_cutoff(otsu_threshold(&hist))
        } else {
            th.fixed_level
        };
        let mask = binarize(&self.grid, blurred, cutoff);
        if th.invert {
            (mask_not(&self.grid, &mask), cutoff)
        } else {
            (mask, cutoff)
        }
    }

    fn clean(&self, mut mask: Mask) -> Mask {
        let m = self.params.morphology;
        if m.erode {
            mask = erode(&self.grid, &mask);
        }
        if m.dilate {
            mask = dilate(&self.grid, &mask);
        }
        mask
    }

    fn edges(&self, blurred: &GridF32, mask: &Mask) -> Mask {
        match self.params.edges.source {
            EdgeSource::MaskBoundary => {
                let inner = erode(&self.grid, mask);
                match mask_xor(&self.grid, mask, &inner) {
                    Ok(boundary) => boundary,
                    Err(err) => {
                        warn!("Tracker: boundary extraction failed: {err}");
                        Mask::new(mask.w, mask.h)
                    }
                }
            }
            EdgeSource::Gradient => {
                let grads = roberts_gradients(&self.grid, blurred);
                binarize(
                    &self.grid,
                    &grads.mag,
                    self.params.edges.magnitude_threshold,
                )
            }
        }
    }

    /// Empty frames go through the guards too, so `RepeatLast` keeps
    /// publishing the last good value; the caller masks them out of
    /// `FrameResult::faulted`.
    fn guard_scalars(&mut self, empty: bool, ellipse: &EllipseFit) -> FrameScalars {
        let value = |name: &'static str, v: f64| -> Result<f64, ScalarFault> {
            if empty {
                Err(ScalarFault::Undefined {
                    name,
                    reason: "empty foreground",
                })
            } else if !ellipse.valid {
                Err(ScalarFault::Undefined {
                    name,
                    reason: "non-finite moments",
                })
            } else {
                Ok(v)
            }
        };
        FrameScalars {
            axis_angle: self.angle_guard.apply(value("axis angle", ellipse.angle)),
            major_length: self
                .major_guard
                .apply(value("major length", ellipse.major_length)),
            minor_length: self
                .minor_guard
                .apply(value("minor length", ellipse.minor_length)),
        }
    }

    fn orient(
        &mut self,
        empty: bool,
        angle_faulted: bool,
        ellipse: &EllipseFit,
        timestamp: Option<f64>,
        frame_index: u64,
    ) -> Orientation {
        if empty || !self.plan.contains(Analysis::Orientation) {
            return Orientation::NotOriented;
        }
        if angle_faulted {
            self.orientation.skip();
            return Orientation::NotOriented;
        }
        let velocity = self.motion(ellipse.centroid, timestamp, frame_index);
        match self.orientation.update(ellipse.angle, velocity) {
            Some(d) => Orientation::Oriented {
                angle: d.angle,
                label: d.label,
            },
            None => Orientation::NotOriented,
        }
    }

    /// Finite-difference velocity of the raw centroid in physical units per
    /// second.
    fn motion(
        &mut self,
        centroid: Point2<f64>,
        timestamp: Option<f64>,
        frame_index: u64,
    ) -> Vector2<f64> {
        let sample = MotionSample {
            centroid,
            timestamp,
            frame_index,
        };
        let Some(prev) = self.last_motion.replace(sample) else {
            return Vector2::zeros();
        };
        let dt = match (prev.timestamp, timestamp) {
            (Some(a), Some(b)) if b > a && (b - a).is_finite() => b - a,
            _ => {
                let frames = frame_index.saturating_sub(prev.frame_index).max(1);
                frames as f64 * self.params.kalman.default_dt
            }
        };
        if dt <= 0.0 || !dt.is_finite() {
            return Vector2::zeros();
        }
        (centroid - prev.centroid) * (self.params.cm_per_pixel / dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    fn disc(w: usize, h: usize, cx: f64, cy: f64, r: f64) -> GridF32 {
        let mut g = GridF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
                if d <= r {
                    g.set(x, y, 0.9);
                }
            }
        }
        g
    }

    fn sequential(params: TrackerParams) -> Tracker {
        Tracker::with_grid(params, ParallelGrid::sequential())
    }

    #[test]
    fn uniform_frame_is_empty() {
        let mut t = sequential(TrackerParams::default());
        let r = t.process_intensity(&GridF32::new(40, 30), Some(0.0));
        assert!(r.empty);
        assert!(!r.faulted);
        assert!(!r.ellipse.valid);
        assert_eq!(r.ellipse.centroid, Point2::new(19.5, 14.5));
        assert_eq!(r.orientation, Orientation::NotOriented);
        assert_eq!(r.smoothed, Point2::new(19.5, 14.5));
        assert_eq!(r.foreground_pixels, 0);
        assert!(r.hough_lines.is_empty());
    }

    #[test]
    fn empty_frame_flags_scalars_but_not_the_frame() {
        let params = TrackerParams {
            fault_policy: crate::faults::FaultPolicy::RepeatLast,
            ..TrackerParams::default()
        };
        let mut t = sequential(params);
        let good = t.process_intensity(&disc(64, 48, 30.0, 20.0, 8.0), Some(0.0));
        assert!(!good.faulted && !good.scalars.any_faulted());

        let r = t.process_intensity(&GridF32::new(64, 48), Some(0.1));
        assert!(r.empty);
        assert!(!r.faulted);
        assert!(r.scalars.axis_angle.faulted);
        assert!(r.scalars.major_length.faulted);
        assert!(r.scalars.minor_length.faulted);
        assert_eq!(r.scalars.major_length.value, good.scalars.major_length.value);
    }

    #[test]
    fn disc_centroid_is_found() {
        let mut t = sequential(TrackerParams::default());
        let r = t.process_intensity(&disc(64, 48, 30.0, 20.0, 8.0), Some(0.0));
        assert!(!r.empty);
        assert!(r.ellipse.valid);
        assert!((r.ellipse.centroid.x - 30.0).abs() < 0.5);
        assert!((r.ellipse.centroid.y - 20.0).abs() < 0.5);
        assert!(r.foreground_pixels > 150);
        assert!(r.edge_pixels > 0);
        assert!(r.orientation.is_oriented());
        let labels: Vec<&str> = r.timing.stages.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["blur", "threshold", "morphology", "moments", "orientation", "trajectory", "edges", "hough"]
        );
    }

    #[test]
    fn inverted_threshold_tracks_dark_subject() {
        let params = TrackerParams {
            threshold: crate::tracker::ThresholdParams {
                invert: true,
                ..Default::default()
            },
            ..TrackerParams::default()
        };
        let mut t = sequential(params);
        let mut img = GridF32::filled(64, 48, 0.8);
        for y in 10..20 {
            for x in 40..56 {
                img.set(x, y, 0.1);
            }
        }
        let r = t.process_intensity(&img, None);
        assert!(!r.empty);
        assert!((r.ellipse.centroid.x - 47.5).abs() < 0.5);
        assert!((r.ellipse.centroid.y - 14.5).abs() < 0.5);
        assert!(r.ellipse.angle.abs() < 1e-6);
    }

    #[test]
    fn disabled_analyses_are_not_reported() {
        let params = TrackerParams {
            analyses: vec![],
            ..TrackerParams::default()
        };
        let mut t = sequential(params);
        let r = t.process_intensity(&disc(32, 32, 16.0, 16.0, 5.0), None);
        assert_eq!(r.orientation, Orientation::NotOriented);
        assert!(r.hu.is_none());
        assert_eq!(r.edge_pixels, 0);
        assert!(r.hough_points.is_empty());
        assert!(r.timing.stage("hough").is_none());
        assert_eq!(r.smoothed, r.ellipse.centroid);
    }

    #[test]
    fn rejects_short_buffers() {
        let mut t = sequential(TrackerParams::default());
        let data = [0u8; 10];
        let err = t.process(&Frame::gray(4, 4, &data), None).expect_err("too short");
        assert_eq!(err, FrameError::BufferTooSmall { expected: 16, actual: 10 });
        assert_eq!(t.frames_processed(), 0);
    }

    #[test]
    fn last_mask_matches_frame_dims() {
        let mut t = sequential(TrackerParams::default());
        t.process_intensity(&disc(20, 10, 10.0, 5.0, 3.0), None);
        let mask = t.last_mask().expect("mask");
        assert_eq!((mask.width(), mask.height()), (20, 10));
    }
}
