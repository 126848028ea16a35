//! Borrowed 8-bit frame as delivered by the capture collaborator.
use super::traits::ImageView;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray8,
    Rgb8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("stride {stride} is smaller than a {width}-pixel row of {channels} channel(s)")]
    StrideTooSmall {
        stride: usize,
        width: usize,
        channels: usize,
    },
    #[error("frame buffer holds {actual} bytes, {expected} required")]
    BufferTooSmall { expected: usize, actual: usize },
}

#[derive(Clone, Debug)]
pub struct Frame<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub format: PixelFormat,
    pub data: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Tightly packed grayscale frame.
    pub fn gray(w: usize, h: usize, data: &'a [u8]) -> Self {
        Self {
            w,
            h,
            stride: w,
            format: PixelFormat::Gray8,
            data,
        }
    }

    /// Tightly packed interleaved RGB frame.
    pub fn rgb(w: usize, h: usize, data: &'a [u8]) -> Self {
        Self {
            w,
            h,
            stride: w * 3,
            format: PixelFormat::Rgb8,
            data,
        }
    }

    /// Check that the buffer covers every row at the declared stride.
    pub fn validate(&self) -> Result<(), FrameError> {
        let channels = self.format.channels();
        let row_bytes = self.w * channels;
        if self.stride < row_bytes {
            return Err(FrameError::StrideTooSmall {
                stride: self.stride,
                width: self.w,
                channels,
            });
        }
        let expected = if self.h == 0 {
            0
        } else {
            (self.h - 1) * self.stride + row_bytes
        };
        if self.data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Raw bytes of row `y` (`w * channels` bytes).
    #[inline]
    pub fn row_bytes(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * self.format.channels()]
    }
}

impl<'a> ImageView for Frame<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w * self.format.channels()
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
    fn row(&self, y: usize) -> &[u8] {
        self.row_bytes(y)
    }
}
