//! Owned 2-D buffer in row-major layout (stride == width).
//!
//! Every stage of the per-frame pipeline publishes its output as a `Grid` and
//! hands it to the next stage by shared reference; nothing mutates a grid
//! after it has been handed off.
use super::traits::ImageView;
use nalgebra::Point2;

#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    /// Width in samples
    pub w: usize,
    /// Height in samples
    pub h: usize,
    /// Number of elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<T>,
}

/// Intensity grid with samples in `[0, 1]`.
pub type GridF32 = Grid<f32>;

/// Binary foreground mask.
pub type Mask = Grid<bool>;

impl<T: Copy + Default> Grid<T> {
    /// Construct a default-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, T::default())
    }
}

impl<T: Copy> Grid<T> {
    pub fn filled(w: usize, h: usize, value: T) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Returns `None` when the length does
    /// not match `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == w * h).then_some(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn same_dims<U>(&self, other: &Grid<U>) -> bool {
        self.w == other.w && self.h == other.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Geometric centre in pixel coordinates (pixel centres at integers).
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.w as f64 - 1.0).max(0.0) * 0.5,
            (self.h as f64 - 1.0).max(0.0) * 0.5,
        )
    }

    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: Fn(T) -> U,
    {
        Grid {
            w: self.w,
            h: self.h,
            stride: self.w,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl Mask {
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

impl<T: Copy> ImageView for Grid<T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[T] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}
