use super::raw::RawMoments;
use nalgebra::Point2;
use serde::Serialize;

/// Moments about the centroid. Translation invariant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CentralMoments {
    pub m00: f64,
    pub centroid: Point2<f64>,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,
}

impl CentralMoments {
    /// `None` when the raw moments are empty.
    pub fn from_raw(raw: &RawMoments) -> Option<Self> {
        let c = raw.centroid()?;
        let (xb, yb) = (c.x, c.y);
        Some(Self {
            m00: raw.m00,
            centroid: c,
            mu20: raw.m20 - xb * raw.m10,
            mu11: raw.m11 - xb * raw.m01,
            mu02: raw.m02 - yb * raw.m01,
            mu30: raw.m30 - 3.0 * xb * raw.m20 + 2.0 * xb * xb * raw.m10,
            mu21: raw.m21 - 2.0 * xb * raw.m11 - yb * raw.m20 + 2.0 * xb * xb * raw.m01,
            mu12: raw.m12 - 2.0 * yb * raw.m11 - xb * raw.m02 + 2.0 * yb * yb * raw.m10,
            mu03: raw.m03 - 3.0 * yb * raw.m02 + 2.0 * yb * yb * raw.m01,
        })
    }

    /// Covariance entries `(σxx, σxy, σyy)` = second-order moments / m00.
    pub fn covariance(&self) -> (f64, f64, f64) {
        (
            self.mu20 / self.m00,
            self.mu11 / self.m00,
            self.mu02 / self.m00,
        )
    }

    pub fn is_finite(&self) -> bool {
        [
            self.m00,
            self.centroid.x,
            self.centroid.y,
            self.mu20,
            self.mu11,
            self.mu02,
            self.mu30,
            self.mu21,
            self.mu12,
            self.mu03,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Scale-normalized central moments `nu_pq = mu_pq / m00^((p+q)/2 + 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NormalizedMoments {
    pub nu20: f64,
    pub nu11: f64,
    pub nu02: f64,
    pub nu30: f64,
    pub nu21: f64,
    pub nu12: f64,
    pub nu03: f64,
}

impl NormalizedMoments {
    pub fn from_central(c: &CentralMoments) -> Self {
        let s2 = c.m00 * c.m00;
        let s3 = c.m00.powf(2.5);
        Self {
            nu20: c.mu20 / s2,
            nu11: c.mu11 / s2,
            nu02: c.mu02 / s2,
            nu30: c.mu30 / s3,
            nu21: c.mu21 / s3,
            nu12: c.mu12 / s3,
            nu03: c.mu03 / s3,
        }
    }
}

/// Hu's seven rotation/scale/translation invariants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HuMoments(pub [f64; 7]);

impl HuMoments {
    pub fn from_normalized(n: &NormalizedMoments) -> Self {
        let (n20, n11, n02) = (n.nu20, n.nu11, n.nu02);
        let (n30, n21, n12, n03) = (n.nu30, n.nu21, n.nu12, n.nu03);
        let a = n30 + n12;
        let b = n21 + n03;
        let c = n30 - 3.0 * n12;
        let d = 3.0 * n21 - n03;
        let h1 = n20 + n02;
        let h2 = (n20 - n02).powi(2) + 4.0 * n11 * n11;
        let h3 = c * c + d * d;
        let h4 = a * a + b * b;
        let h5 = c * a * (a * a - 3.0 * b * b) + d * b * (3.0 * a * a - b * b);
        let h6 = (n20 - n02) * (a * a - b * b) + 4.0 * n11 * a * b;
        let h7 = d * a * (a * a - 3.0 * b * b) - c * b * (3.0 * a * a - b * b);
        Self([h1, h2, h3, h4, h5, h6, h7])
    }

    /// Euclidean distance with `h7` taken in absolute value, so mirror images
    /// compare as equal.
    pub fn distance(&self, other: &Self) -> f64 {
        let mut a = self.0;
        let mut b = other.0;
        a[6] = a[6].abs();
        b[6] = b[6].abs();
        a.iter()
            .zip(&b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}
