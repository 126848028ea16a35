//! Angle utilities shared by the orientation and Hough stages.
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Wraps an angle into `(−π, π]`.
#[inline]
pub fn wrap_pi(angle: f64) -> f64 {
    let mut a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI {
        a += TAU;
    }
    a
}

/// Normalizes an axial angle (line direction) into `[0, π)`.
#[inline]
pub fn normalize_half_turn(angle: f64) -> f64 {
    let norm = angle.rem_euclid(PI);
    if norm >= PI - 1e-12 {
        0.0
    } else {
        norm
    }
}

/// Smallest unsigned difference between two headings, in `[0, π]`.
#[inline]
pub fn heading_difference(a: f64, b: f64) -> f64 {
    wrap_pi(a - b).abs()
}

/// Smallest unsigned difference between two axes, treating antipodal
/// directions as equal. Returns a value in `[0, π/2]`.
#[inline]
pub fn axial_difference(a: f64, b: f64) -> f64 {
    let diff = heading_difference(a, b);
    if diff > FRAC_PI_2 {
        PI - diff
    } else {
        diff
    }
}
