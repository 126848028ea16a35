use crate::image::PixelFormat;
use crate::tracker::TrackerParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config of the `track_frames` tool: a numbered image sequence tracked as
/// one recording.
#[derive(Clone, Debug, Deserialize)]
pub struct TrackToolConfig {
    pub frames: Vec<PathBuf>,
    #[serde(default = "default_format")]
    pub format: PixelFormat,
    /// Frame rate used to stamp frame `i` with `i / fps`; `<= 0` leaves
    /// frames unstamped.
    #[serde(default)]
    pub fps: f64,
    #[serde(default)]
    pub tracker: TrackerParams,
    pub output: TrackOutputConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TrackOutputConfig {
    pub results_json: PathBuf,
    #[serde(default)]
    pub last_mask: Option<PathBuf>,
}

fn default_format() -> PixelFormat {
    PixelFormat::Gray8
}

impl TrackToolConfig {
    pub fn timestamp(&self, index: usize) -> Option<f64> {
        (self.fps > 0.0 && self.fps.is_finite()).then(|| index as f64 / self.fps)
    }
}

pub fn load_config(path: &Path) -> Result<TrackToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(data: &str) -> Result<TrackToolConfig, serde_json::Error> {
    serde_json::from_str(data)
}
