use crate::image::{GridF32, ImageView, Mask};
use crate::parallel::ParallelGrid;
use nalgebra::Point2;
use serde::Serialize;
use std::ops::Add;

/// Weighted sums `m_pq = Σ w · x^p · y^q` for `p + q <= 3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RawMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl RawMoments {
    #[inline]
    pub fn accumulate(&mut self, x: f64, y: f64, w: f64) {
        let (xx, yy) = (x * x, y * y);
        self.m00 += w;
        self.m10 += w * x;
        self.m01 += w * y;
        self.m20 += w * xx;
        self.m11 += w * x * y;
        self.m02 += w * yy;
        self.m30 += w * xx * x;
        self.m21 += w * xx * y;
        self.m12 += w * x * yy;
        self.m03 += w * yy * y;
    }

    /// Intensity-weighted moments of the foreground pixels of `mask`.
    ///
    /// Panics if `img` and `mask` differ in size.
    pub fn from_grid(grid: &ParallelGrid, img: &GridF32, mask: &Mask) -> Self {
        assert!(img.same_dims(mask), "intensity grid and mask must match");
        grid.reduce(
            0..img.h,
            Self::default(),
            |y| {
                let mut m = Self::default();
                let yf = y as f64;
                for (x, (&v, &fg)) in img.row(y).iter().zip(mask.row(y)).enumerate() {
                    if fg {
                        m.accumulate(x as f64, yf, v as f64);
                    }
                }
                m
            },
            |a, b| a + b,
        )
    }

    /// Unit-weight (binary) moments of a mask.
    pub fn from_mask(grid: &ParallelGrid, mask: &Mask) -> Self {
        grid.reduce(
            0..mask.h,
            Self::default(),
            |y| {
                let mut m = Self::default();
                let yf = y as f64;
                for (x, &fg) in mask.row(y).iter().enumerate() {
                    if fg {
                        m.accumulate(x as f64, yf, 1.0);
                    }
                }
                m
            },
            |a, b| a + b,
        )
    }

    /// Unit-weight moments of a point set.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point2<f64>>,
    {
        let mut m = Self::default();
        for p in points {
            m.accumulate(p.x, p.y, 1.0);
        }
        m
    }

    /// No foreground mass. A non-finite `m00` is not empty; it surfaces as a
    /// non-finite centroid instead.
    pub fn is_empty(&self) -> bool {
        self.m00 <= 0.0
    }

    /// `(m10 / m00, m01 / m00)`, or `None` for an empty blob.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(Point2::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

impl Add for RawMoments {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            m00: self.m00 + o.m00,
            m10: self.m10 + o.m10,
            m01: self.m01 + o.m01,
            m20: self.m20 + o.m20,
            m11: self.m11 + o.m11,
            m02: self.m02 + o.m02,
            m30: self.m30 + o.m30,
            m21: self.m21 + o.m21,
            m12: self.m12 + o.m12,
            m03: self.m03 + o.m03,
        }
    }
}
