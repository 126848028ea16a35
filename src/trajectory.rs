//! Causal trajectory smoothing with a constant-velocity Kalman filter.
//!
//! The two image axes are filtered independently. Each axis carries the state
//! `[position, velocity]` with transition `F = [[1, Δt], [0, 1]]`, process
//! noise `Q = q · [[Δt⁴/4, Δt³/2], [Δt³/2, Δt²]]` (white acceleration) and a
//! scalar position measurement with variance `r`.
use log::{debug, warn};
use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Innovation variances at or below this value skip the correction step.
const INNOVATION_EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KalmanParams {
    /// White-acceleration spectral density `q` (px²/s³).
    pub process_noise: f64,
    /// Measurement variance `r` (px²).
    pub measurement_noise: f64,
    /// Position variance of a freshly seeded filter.
    pub initial_position_var: f64,
    /// Velocity variance of a freshly seeded filter.
    pub initial_velocity_var: f64,
    /// Δt used when timestamps are missing or not increasing (seconds).
    pub default_dt: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise: 50.0,
            measurement_noise: 4.0,
            initial_position_var: 4.0,
            initial_velocity_var: 1.0e4,
            default_dt: 1.0 / 30.0,
        }
    }
}

/// One-dimensional constant-velocity filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisKalman {
    x: Vector2<f64>,
    p: Matrix2<f64>,
    q: f64,
    r: f64,
}

impl AxisKalman {
    /// Seed at `position` with zero velocity.
    pub fn new(position: f64, params: &KalmanParams) -> Self {
        Self {
            x: Vector2::new(position, 0.0),
            p: Matrix2::new(
                params.initial_position_var,
                0.0,
                0.0,
                params.initial_velocity_var,
            ),
            q: params.process_noise,
            r: params.measurement_noise,
        }
    }

    pub fn predict(&mut self, dt: f64) {
        let f = Matrix2::new(1.0, dt, 0.0, 1.0);
        let dt2 = dt * dt;
        let q = Matrix2::new(
            0.25 * dt2 * dt2,
            0.5 * dt2 * dt,
            0.5 * dt2 * dt,
            dt2,
        ) * self.q;
        self.x = f * self.x;
        self.p = f * self.p * f.transpose() + q;
    }

    /// Returns `false` when the innovation variance was degenerate and the
    /// measurement was not applied.
    pub fn correct(&mut self, z: f64) -> bool {
        let s = self.p[(0, 0)] + self.r;
        if !(s > INNOVATION_EPS) {
            return false;
        }
        let k = self.p.column(0) / s;
        let innovation = z - self.x[0];
        self.x += k * innovation;
        let kh = Matrix2::new(k[0], 0.0, k[1], 0.0);
        self.p = (Matrix2::identity() - kh) * self.p;
        true
    }

    pub fn position(&self) -> f64 {
        self.x[0]
    }

    pub fn velocity(&self) -> f64 {
        self.x[1]
    }

    pub fn covariance(&self) -> &Matrix2<f64> {
        &self.p
    }
}

/// Smooths the subject centroid over time.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryFilter {
    params: KalmanParams,
    axes: Option<[AxisKalman; 2]>,
    last_timestamp: Option<f64>,
    updates: usize,
}

impl TrajectoryFilter {
    pub fn new(params: KalmanParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &KalmanParams {
        &self.params
    }

    /// Predict to `timestamp` and correct with `point`; returns the filtered
    /// position. The first call seeds the state from `point`.
    ///
    /// Non-finite measurements leave the state untouched.
    pub fn update(&mut self, point: Point2<f64>, timestamp: Option<f64>) -> Point2<f64> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            warn!("trajectory: ignoring non-finite measurement {point:?}");
            return self.position().unwrap_or(point);
        }
        let dt = self.step(timestamp);
        self.updates += 1;
        let axes = match self.axes.as_mut() {
            None => {
                self.axes = Some([
                    AxisKalman::new(point.x, &self.params),
                    AxisKalman::new(point.y, &self.params),
                ]);
                return point;
            }
            Some(axes) => axes,
        };
        for (axis, z) in axes.iter_mut().zip([point.x, point.y]) {
            axis.predict(dt);
            if !axis.correct(z) {
                debug!("trajectory: degenerate innovation variance, prediction kept");
            }
        }
        Point2::new(axes[0].position(), axes[1].position())
    }

    /// Δt to the new timestamp, falling back to `default_dt`.
    fn step(&mut self, timestamp: Option<f64>) -> f64 {
        let dt = match (self.last_timestamp, timestamp) {
            (Some(prev), Some(now)) if (now - prev).is_finite() && now > prev => now - prev,
            _ => self.params.default_dt,
        };
        if let Some(now) = timestamp.filter(|t| t.is_finite()) {
            self.last_timestamp = Some(now);
        }
        dt
    }

    pub fn position(&self) -> Option<Point2<f64>> {
        self.axes
            .as_ref()
            .map(|[x, y]| Point2::new(x.position(), y.position()))
    }

    /// Filtered velocity in pixels per second.
    pub fn velocity(&self) -> Option<Vector2<f64>> {
        self.axes
            .as_ref()
            .map(|[x, y]| Vector2::new(x.velocity(), y.velocity()))
    }

    pub fn is_initialized(&self) -> bool {
        self.axes.is_some()
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn reset(&mut self) {
        self.axes = None;
        self.last_timestamp = None;
        self.updates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noiseless() -> KalmanParams {
        KalmanParams {
            process_noise: 0.0,
            measurement_noise: 0.0,
            initial_position_var: 1.0,
            initial_velocity_var: 1000.0,
            default_dt: 0.5,
        }
    }

    #[test]
    fn first_measurement_seeds_the_state() {
        let mut f = TrajectoryFilter::new(KalmanParams::default());
        let p = f.update(Point2::new(3.0, -2.0), Some(0.0));
        assert_eq!(p, Point2::new(3.0, -2.0));
        assert_eq!(f.velocity(), Some(Vector2::zeros()));
    }

    #[test]
    fn noiseless_constant_velocity_is_exact_after_two_samples() {
        let mut f = TrajectoryFilter::new(noiseless());
        let v = Vector2::new(4.0, -1.5);
        let start = Point2::new(10.0, 20.0);
        for i in 0..20 {
            let t = i as f64 * 0.1;
            let truth = start + v * t;
            let out = f.update(truth, Some(t));
            if i >= 1 {
                assert!((out - truth).norm() < 1e-6, "i={i} out={out:?} truth={truth:?}");
            }
            if i >= 2 {
                let vel = f.velocity().expect("initialized");
                assert!((vel - v).norm() < 1e-6, "i={i} vel={vel:?}");
            }
        }
    }

    #[test]
    fn variable_dt_is_taken_from_timestamps() {
        let mut f = TrajectoryFilter::new(noiseless());
        let times = [0.0, 0.05, 0.2, 0.25, 0.6, 0.61];
        for &t in &times {
            f.update(Point2::new(2.0 * t, 0.0), Some(t));
        }
        let vel = f.velocity().expect("initialized");
        assert!((vel.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn missing_timestamps_use_default_dt() {
        let mut f = TrajectoryFilter::new(noiseless());
        for i in 0..5 {
            f.update(Point2::new(i as f64, 0.0), None);
        }
        // One pixel per default_dt = 0.5 s.
        let vel = f.velocity().expect("initialized");
        assert!((vel.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn noisy_measurements_are_smoothed() {
        let mut f = TrajectoryFilter::new(KalmanParams::default());
        let mut err_raw = 0.0;
        let mut err_filt = 0.0;
        for i in 0..200 {
            let t = i as f64 / 30.0;
            let truth = Point2::new(50.0 + 30.0 * t, 40.0);
            let noise = if i % 2 == 0 { 2.0 } else { -2.0 };
            let out = f.update(Point2::new(truth.x + noise, truth.y - noise), Some(t));
            if i >= 50 {
                err_raw += 2.0 * noise * noise;
                err_filt += (out - truth).norm_squared();
            }
        }
        assert!(err_filt < err_raw, "filtered={err_filt} raw={err_raw}");
    }

    #[test]
    fn non_finite_measurement_is_ignored() {
        let mut f = TrajectoryFilter::new(KalmanParams::default());
        f.update(Point2::new(1.0, 1.0), Some(0.0));
        let out = f.update(Point2::new(f64::NAN, 1.0), Some(0.1));
        assert_eq!(out, Point2::new(1.0, 1.0));
        assert_eq!(f.updates(), 1);
    }

    #[test]
    fn degenerate_innovation_keeps_prediction() {
        let params = KalmanParams {
            initial_position_var: 0.0,
            initial_velocity_var: 0.0,
            ..noiseless()
        };
        let mut axis = AxisKalman::new(5.0, &params);
        axis.predict(1.0);
        assert!(!axis.correct(100.0));
        assert_eq!(axis.position(), 5.0);
    }
}
