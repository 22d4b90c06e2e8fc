// src/types.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub snapshot: SnapshotConfig,
    pub publish: PublishConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub streams: Vec<StreamConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Maximum retained center points per track identity.
    pub history_cap: usize,
    /// Maximum first-to-last displacement (pixels) for a track to count as
    /// stationary. Strict inequality: displacement == threshold is moving.
    pub stationary_threshold: f32,
    /// Class labels that participate in attribution. Empty = accept all.
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Seconds between snapshot/publish events. Converted to a frame interval
    /// per stream using that stream's fps.
    pub interval_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    /// Persist snapshot images under <run_dir>/frames/.
    pub save_frames: bool,
    /// Reuse an existing run directory instead of creating <name>2, <name>3, ...
    pub exist_ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Area name — also the run directory name for this stream's output.
    pub name: String,
    /// Parking lot this camera belongs to (groups areas in the remote store).
    pub parking: String,
    /// Detection replay file (JSONL, one record per frame).
    pub source: String,
    /// Region or parking-space definition file. Optional in point-count mode
    /// (falls back to a single whole-frame region).
    pub regions: Option<String>,
    pub mode: OccupancyMode,
    /// Capacity of the monitored area; point-count mode derives
    /// available = total - occupied from it.
    pub total_spaces: Option<u32>,
    pub fps: f64,
    /// Buffer tolerance (pixels) for space-overlap intersection tests.
    #[serde(default = "default_overlap_buffer")]
    pub overlap_buffer: f32,
    /// Frame dimensions, used for the whole-frame fallback region.
    pub frame_width: f32,
    pub frame_height: f32,
}

fn default_overlap_buffer() -> f32 {
    5.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyMode {
    /// Count stationary vehicles whose center falls in a named region.
    PointCount,
    /// Classify predefined parking-space polygons by bbox overlap.
    SpaceOverlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn center(&self) -> crate::geometry::Point {
        crate::geometry::Point {
            x: (self.x1 + self.x2) * 0.5,
            y: (self.y1 + self.y2) * 0.5,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }
}

/// One detector/tracker output for a single frame. Not retained beyond the
/// frame except as a contribution to track history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub track_id: i64,
    pub label: String,
}

/// A frame handle from the frame source. The image itself stays external;
/// the snapshot path only reads the bytes when a snapshot is due.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: u64,
    pub timestamp_ms: f64,
    pub image_path: Option<PathBuf>,
}
