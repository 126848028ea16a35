//! Dense 2-D sample buffers and borrowed frame views.
//!
//! - [`Grid`] is the owned buffer handed between pipeline stages: intensities
//!   in `[0, 1]` ([`GridF32`]), binary masks ([`Mask`]) or vote counts.
//! - [`Frame`] borrows the caller's 8-bit pixel buffer (gray or RGB, strided).
//! - [`io`] loads frames from disk and writes masks/JSON for the tools.
pub mod frame;
pub mod grid;
pub mod io;
pub mod traits;

pub use self::frame::{Frame, FrameError, PixelFormat};
pub use self::grid::{Grid, GridF32, Mask};
pub use self::traits::{ImageView, Rows};
