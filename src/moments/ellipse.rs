//! Covariance ellipse from second-order central moments.
//!
//! With `σxx = mu20/m00`, `σxy = mu11/m00`, `σyy = mu02/m00` the major axis
//! angle is `½·atan2(2σxy, σxx − σyy)` and the eigenvalues are
//! `mean ± √(((σxx − σyy)/2)² + σxy²)`. The closed form keeps isotropic blobs
//! well defined: `atan2(0, 0) = 0` gives the unit axis `(1, 0)`.
use super::central::CentralMoments;
use nalgebra::{Point2, Vector2};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EllipseFit {
    /// Centroid in pixel coordinates
    pub centroid: Point2<f64>,
    /// Unit vector along the major axis
    pub major_axis: Vector2<f64>,
    /// Unit vector along the minor axis (major rotated by +90°)
    pub minor_axis: Vector2<f64>,
    /// `2·√λ_major` in physical units
    pub major_length: f64,
    /// `2·√λ_minor` in physical units
    pub minor_length: f64,
    /// Major axis angle in radians, `(−π/2, π/2]`
    pub angle: f64,
    /// `false` for empty or non-finite input
    pub valid: bool,
}

impl EllipseFit {
    /// Fit from central moments; `scale` converts pixels to physical units.
    pub fn from_central(c: &CentralMoments, scale: f64) -> Self {
        if !c.is_finite() || c.m00 <= 0.0 {
            return Self::empty(c.centroid);
        }
        let (sxx, sxy, syy) = c.covariance();
        let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy);
        let mean = 0.5 * (sxx + syy);
        let spread = (0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy).sqrt();
        let lambda_major = (mean + spread).max(0.0);
        let lambda_minor = (mean - spread).max(0.0);
        let major_axis = Vector2::new(angle.cos(), angle.sin());
        let minor_axis = Vector2::new(-major_axis.y, major_axis.x);
        Self {
            centroid: c.centroid,
            major_axis,
            minor_axis,
            major_length: 2.0 * lambda_major.sqrt() * scale,
            minor_length: 2.0 * lambda_minor.sqrt() * scale,
            angle,
            valid: true,
        }
    }

    /// Placeholder for frames without a blob.
    pub fn empty(center: Point2<f64>) -> Self {
        Self {
            centroid: center,
            major_axis: Vector2::new(1.0, 0.0),
            minor_axis: Vector2::new(0.0, 1.0),
            major_length: 0.0,
            minor_length: 0.0,
            angle: 0.0,
            valid: false,
        }
    }

    /// Same ellipse with the major axis rotated by 180°.
    pub fn flipped(&self) -> Self {
        let mut out = *self;
        out.major_axis = -self.major_axis;
        out.minor_axis = -self.minor_axis;
        out.angle = crate::angle::wrap_pi(self.angle + std::f64::consts::PI);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::RawMoments;
    use nalgebra::Matrix2;

    fn filled_ellipse(a: f64, b: f64, theta: f64) -> Vec<Point2<f64>> {
        let (s, c) = theta.sin_cos();
        let mut pts = Vec::new();
        for y in -60..=60 {
            for x in -60..=60 {
                let (xf, yf) = (x as f64, y as f64);
                let u = c * xf + s * yf;
                let v = -s * xf + c * yf;
                if (u / a).powi(2) + (v / b).powi(2) <= 1.0 {
                    pts.push(Point2::new(xf + 100.0, yf + 80.0));
                }
            }
        }
        pts
    }

    fn fit(points: &[Point2<f64>], scale: f64) -> EllipseFit {
        let raw = RawMoments::from_points(points.iter().copied());
        EllipseFit::from_central(&CentralMoments::from_raw(&raw).expect("non-empty"), scale)
    }

    #[test]
    fn recovers_orientation_and_axis_lengths() {
        let theta = 0.6;
        let e = fit(&filled_ellipse(40.0, 15.0, theta), 1.0);
        assert!(e.valid);
        assert!((e.angle - theta).abs() < 0.01, "angle={}", e.angle);
        // A uniform ellipse with semi-axis a has variance a²/4, so 2√λ = a.
        assert!((e.major_length - 40.0).abs() < 1.0, "major={}", e.major_length);
        assert!((e.minor_length - 15.0).abs() < 1.0, "minor={}", e.minor_length);
        assert!((e.centroid.x - 100.0).abs() < 1e-6);
        assert!((e.major_axis.norm() - 1.0).abs() < 1e-12);
        assert!(e.major_axis.dot(&e.minor_axis).abs() < 1e-12);
    }

    #[test]
    fn scale_converts_lengths_only() {
        let pts = filled_ellipse(30.0, 10.0, -0.3);
        let px = fit(&pts, 1.0);
        let cm = fit(&pts, 0.1);
        assert!((cm.major_length - 0.1 * px.major_length).abs() < 1e-9);
        assert_eq!(cm.centroid, px.centroid);
        assert_eq!(cm.angle, px.angle);
    }

    #[test]
    fn eigenvalues_match_nalgebra() {
        let e = fit(&filled_ellipse(25.0, 9.0, 1.1), 1.0);
        let raw = RawMoments::from_points(filled_ellipse(25.0, 9.0, 1.1));
        let c = CentralMoments::from_raw(&raw).expect("non-empty");
        let (sxx, sxy, syy) = c.covariance();
        let eig = Matrix2::new(sxx, sxy, sxy, syy).symmetric_eigen();
        let lmax = eig.eigenvalues.max();
        let lmin = eig.eigenvalues.min();
        assert!((e.major_length - 2.0 * lmax.sqrt()).abs() < 1e-9);
        assert!((e.minor_length - 2.0 * lmin.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn isotropic_blob_yields_unit_axes() {
        let e = fit(&filled_ellipse(20.0, 20.0, 0.0), 1.0);
        assert!(e.valid);
        assert!(e.angle.is_finite());
        assert!((e.major_axis.norm() - 1.0).abs() < 1e-12);
        assert!((e.major_length - e.minor_length).abs() < 0.5);
    }

    #[test]
    fn flipped_reverses_major_axis() {
        let e = fit(&filled_ellipse(30.0, 10.0, 0.4), 1.0);
        let f = e.flipped();
        assert!((f.major_axis + e.major_axis).norm() < 1e-12);
        assert!((crate::angle::wrap_pi(f.angle - e.angle).abs() - std::f64::consts::PI).abs() < 1e-12);
    }
}
