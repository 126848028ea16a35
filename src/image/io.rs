//! I/O helpers for frames, grids and JSON.
//!
//! - `load_frame`: read a PNG/JPEG/etc. into an owned 8-bit gray or RGB buffer.
//! - `save_mask`: write a `Mask` as a black/white PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{Frame, Mask, PixelFormat};
use image::GrayImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit frame buffer with borrowed view conversion.
#[derive(Clone, Debug)]
pub struct OwnedFrame {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl OwnedFrame {
    pub fn new(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a read-only `Frame` view
    pub fn as_view(&self) -> Frame<'_> {
        Frame {
            w: self.width,
            h: self.height,
            stride: self.width * self.format.channels(),
            format: self.format,
            data: &self.data,
        }
    }
}

/// Load an image from disk as 8-bit gray or RGB.
pub fn load_frame(path: &Path, format: PixelFormat) -> Result<OwnedFrame, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let (width, height) = (img.width() as usize, img.height() as usize);
    let data = match format {
        PixelFormat::Gray8 => img.into_luma8().into_raw(),
        PixelFormat::Rgb8 => img.into_rgb8().into_raw(),
    };
    Ok(OwnedFrame::new(width, height, format, data))
}

/// Save a mask to a PNG (foreground white).
pub fn save_mask(mask: &Mask, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let data = mask.data.iter().map(|&v| if v { 255u8 } else { 0 }).collect();
    let image = GrayImage::from_raw(mask.w as u32, mask.h as u32, data)
        .ok_or_else(|| "Failed to create image buffer".to_string())?;
    image
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("animal-tracker-io-{}-{name}", std::process::id()))
    }

    #[test]
    fn saved_mask_loads_back_as_foreground() {
        let dir = scratch_dir("mask");
        let path = dir.join("nested").join("mask.png");
        let mut mask = Mask::new(5, 3);
        mask.set(1, 0, true);
        mask.set(4, 2, true);
        save_mask(&mask, &path).expect("save");

        let frame = load_frame(&path, PixelFormat::Gray8).expect("load");
        assert_eq!((frame.width(), frame.height()), (5, 3));
        let view = frame.as_view();
        assert_eq!(view.row_bytes(0), &[0, 255, 0, 0, 0]);
        assert_eq!(view.row_bytes(2), &[0, 0, 0, 0, 255]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn json_is_written_with_parent_dirs() {
        let dir = scratch_dir("json");
        let path = dir.join("out").join("value.json");
        write_json_file(&path, &vec![1, 2, 3]).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        let back: Vec<i32> = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, vec![1, 2, 3]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_frame_reports_path() {
        let err = load_frame(Path::new("/nonexistent/frame.png"), PixelFormat::Rgb8)
            .expect_err("missing");
        assert!(err.starts_with("Failed to open /nonexistent/frame.png"));
    }
}
