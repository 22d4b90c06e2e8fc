// src/snapshot.rs
//
// Snapshot cadence and frame persistence. The cadence is pure modulo
// arithmetic on the frame counter — no explicit reset state. Run directories
// use incrementing names (<area>, <area>2, <area>3, ...) so repeated runs
// never clobber earlier output unless exist_ok is set.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct SnapshotScheduler {
    interval: u64,
}

impl SnapshotScheduler {
    /// Interval in frames from a wall-clock period: fps × seconds, floored at
    /// one frame.
    pub fn from_seconds(fps: f64, interval_seconds: f64) -> Self {
        let interval = ((fps * interval_seconds) as u64).max(1);
        Self { interval }
    }

    #[cfg(test)]
    pub fn from_frames(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// True exactly at frame counts {I, 2I, 3I, ...}.
    pub fn is_due(&self, frame_count: u64) -> bool {
        frame_count > 0 && frame_count % self.interval == 0
    }
}

/// Resolve a run directory under `base`, appending a numeric suffix until the
/// name is unused (unless `exist_ok`). Creates the directory.
pub fn create_run_dir(base: &Path, name: &str, exist_ok: bool) -> Result<PathBuf> {
    let first = base.join(name);
    let dir = if exist_ok || !first.exists() {
        first
    } else {
        let mut n = 2u32;
        loop {
            let candidate = base.join(format!("{}{}", name, n));
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        }
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create run directory '{}'", dir.display()))?;
    Ok(dir)
}

pub trait FrameSink {
    /// Persist one snapshot image. Calls arrive in frame order.
    fn persist(&mut self, frame_id: u64, image: &[u8]) -> Result<PathBuf>;
}

pub struct DiskFrameSink {
    frames_dir: PathBuf,
}

impl DiskFrameSink {
    pub fn new(run_dir: &Path) -> Result<Self> {
        let frames_dir = run_dir.join("frames");
        fs::create_dir_all(&frames_dir)
            .with_context(|| format!("Failed to create '{}'", frames_dir.display()))?;
        info!("Snapshots will be written to {}", frames_dir.display());
        Ok(Self { frames_dir })
    }
}

impl FrameSink for DiskFrameSink {
    fn persist(&mut self, frame_id: u64, image: &[u8]) -> Result<PathBuf> {
        let path = self.frames_dir.join(format!("frame_{:04}.jpg", frame_id));
        fs::write(&path, image)
            .with_context(|| format!("Failed to write snapshot '{}'", path.display()))?;
        Ok(path)
    }
}
