// src/source.rs
//
// Seams for the external collaborators: the frame source and the
// detector/tracker. Both are replayed from a per-stream JSONL file — one
// record per frame, in source order:
//
//   {"frame": 1, "image": "frames/0001.jpg",
//    "detections": [{"bbox": [x1, y1, x2, y2], "track_id": 4, "label": "car"}]}
//
// The image field is optional; snapshots are skipped for frames without one.
// Identity persistence across frames is the upstream tracker's contract.

use crate::types::{Detection, Frame};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait FrameSource {
    /// Next frame in source order; None once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    frame: u64,
    image: Option<String>,
    #[serde(default)]
    detections: Vec<Detection>,
}

#[derive(Debug)]
pub struct ReplayFrameSource {
    frames: VecDeque<Frame>,
}

impl FrameSource for ReplayFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

#[derive(Debug)]
pub struct ReplayDetector {
    by_frame: HashMap<u64, Vec<Detection>>,
}

impl Detector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.by_frame.remove(&frame.id).unwrap_or_default())
    }
}

/// Load a replay file into a frame source and a detector sharing the same
/// recording. Fails before the frame loop if the file is missing or
/// malformed — fatal for the owning stream only.
pub fn open_replay(path: &Path, fps: f64) -> Result<(ReplayFrameSource, ReplayDetector)> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read detection replay '{}'", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut frames = VecDeque::new();
    let mut by_frame = HashMap::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(line).with_context(|| {
            format!("Malformed record at {}:{}", path.display(), line_no + 1)
        })?;
        frames.push_back(Frame {
            id: record.frame,
            timestamp_ms: record.frame as f64 / fps * 1000.0,
            image_path: record.image.map(|rel| resolve_image_path(base_dir, &rel)),
        });
        by_frame.insert(record.frame, record.detections);
    }

    info!("Replay '{}': {} frame(s)", path.display(), frames.len());
    Ok((ReplayFrameSource { frames }, ReplayDetector { by_frame }))
}

fn resolve_image_path(base_dir: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
