//! Head/tail disambiguation of the ellipse major axis.
//!
//! Each frame carries a binary label: keep the moment-derived axis or flip it
//! by 180°. Labels are chosen by a forward Viterbi recurrence over the two
//! states. The data term pulls the oriented axis towards the direction of
//! motion and the transition term keeps it continuous with the previous
//! frame. Their mix is set by the speed:
//!
//! ```text
//! J1 = w · |wrap(θₜ + sπ − φₜ)|
//! J2 = (1 − w) · |wrap(θₜ + sπ − θₜ₋₁ − s₋₁π)|
//! w  = min(w_max, λ‖v‖²)
//! ```
//!
//! Only the last cost column is carried between frames; the back-pointers are
//! kept so the globally optimal labeling can be recovered with
//! [`OrientationCorrector::best_path`].
use crate::angle::wrap_pi;
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OrientationParams {
    /// Upper bound of the motion weight `w`.
    pub w_max: f64,
    /// Speed gain: `w = min(w_max, lambda · ‖v‖²)`.
    pub lambda: f64,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            w_max: 0.25,
            lambda: 0.005,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisLabel {
    Keep,
    Flip,
}

impl AxisLabel {
    const ALL: [AxisLabel; 2] = [AxisLabel::Keep, AxisLabel::Flip];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            AxisLabel::Keep => 0,
            AxisLabel::Flip => 1,
        }
    }

    #[inline]
    fn from_index(i: usize) -> Self {
        if i == 0 {
            AxisLabel::Keep
        } else {
            AxisLabel::Flip
        }
    }

    /// Rotation applied to the raw axis: `0` or `π`.
    #[inline]
    pub fn offset(self) -> f64 {
        self.index() as f64 * PI
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrientationDecision {
    pub label: AxisLabel,
    /// Oriented heading in `(−π, π]`.
    pub angle: f64,
    /// Cumulative cost of the winning state.
    pub cost: f64,
}

#[inline]
pub fn motion_weight(params: &OrientationParams, velocity: &Vector2<f64>) -> f64 {
    let speed2 = velocity.norm_squared();
    if !speed2.is_finite() {
        return 0.0;
    }
    (params.lambda * speed2).min(params.w_max).max(0.0)
}

/// Disagreement between the labeled axis and the motion direction `phi`.
#[inline]
pub fn data_cost(w: f64, theta: f64, phi: f64, label: AxisLabel) -> f64 {
    w * wrap_pi(theta + label.offset() - phi).abs()
}

/// Disagreement between consecutive labeled axes.
#[inline]
pub fn transition_cost(
    w: f64,
    theta: f64,
    prev_theta: f64,
    label: AxisLabel,
    prev_label: AxisLabel,
) -> f64 {
    (1.0 - w) * wrap_pi(theta + label.offset() - prev_theta - prev_label.offset()).abs()
}

#[derive(Clone, Debug, Default)]
pub struct OrientationCorrector {
    params: OrientationParams,
    cost: [f64; 2],
    prev_theta: Option<f64>,
    back: Vec<[u8; 2]>,
    skipped: usize,
}

impl OrientationCorrector {
    pub fn new(params: OrientationParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &OrientationParams {
        &self.params
    }

    /// Extend the trellis by one frame and decide the current label.
    ///
    /// `theta` is the raw major-axis angle, `velocity` the current motion
    /// vector. Returns `None` (and records a skip) when `theta` is not
    /// finite; the trellis is left untouched.
    pub fn update(&mut self, theta: f64, velocity: Vector2<f64>) -> Option<OrientationDecision> {
        if !theta.is_finite() {
            self.skip();
            return None;
        }
        match self.prev_theta {
            None => {
                self.cost = [0.0, 0.0];
                self.back.push([1, 1]);
            }
            Some(prev) => {
                let w = motion_weight(&self.params, &velocity);
                let phi = if w > 0.0 {
                    velocity.y.atan2(velocity.x)
                } else {
                    0.0
                };
                let mut next = [0.0; 2];
                let mut ptr = [0u8; 2];
                for label in AxisLabel::ALL {
                    let mut best = f64::INFINITY;
                    let mut arg = 0u8;
                    for prev_label in AxisLabel::ALL {
                        let c = self.cost[prev_label.index()]
                            + transition_cost(w, theta, prev, label, prev_label);
                        if c < best {
                            best = c;
                            arg = prev_label.index() as u8;
                        }
                    }
                    next[label.index()] = best + data_cost(w, theta, phi, label);
                    ptr[label.index()] = arg;
                }
                self.cost = next;
                self.back.push(ptr);
            }
        }
        self.prev_theta = Some(theta);
        let label = self.current_label();
        Some(OrientationDecision {
            label,
            angle: wrap_pi(theta + label.offset()),
            cost: self.cost[label.index()],
        })
    }

    /// Record a faulted frame. The next update links to the last accepted one.
    pub fn skip(&mut self) {
        self.skipped += 1;
        debug!("orientation: skipped frame (total skipped={})", self.skipped);
    }

    /// Label of the cheaper state in the last column; ties keep the raw axis.
    fn current_label(&self) -> AxisLabel {
        if self.cost[1] < self.cost[0] {
            AxisLabel::Flip
        } else {
            AxisLabel::Keep
        }
    }

    /// Globally optimal labeling of every accepted frame.
    pub fn best_path(&self) -> Vec<AxisLabel> {
        let n = self.back.len();
        if n == 0 {
            return Vec::new();
        }
        let mut path = vec![AxisLabel::Keep; n];
        let mut state = self.current_label();
        path[n - 1] = state;
        for t in (1..n).rev() {
            state = AxisLabel::from_index(self.back[t][state.index()] as usize);
            path[t - 1] = state;
        }
        path
    }

    /// Cumulative costs `[keep, flip]` of the last column.
    pub fn costs(&self) -> [f64; 2] {
        self.cost
    }

    /// Number of accepted updates.
    pub fn len(&self) -> usize {
        self.back.len()
    }

    pub fn is_empty(&self) -> bool {
        self.back.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn reset(&mut self) {
        self.cost = [0.0, 0.0];
        self.prev_theta = None;
        self.back.clear();
        self.skipped = 0;
    }
}
