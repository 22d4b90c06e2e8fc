// src/stream.rs
//
// Frame Cycle Controller — one per stream, owning every piece of per-stream
// state. Processing is strictly sequential: frame N+1 is never touched before
// frame N's attribution and snapshot decision complete, because track history
// and region counters are temporally stateful.
//
// Per-frame cycle:
//   pull frame -> detect -> update tracks -> attribute -> maybe snapshot/publish
//
// Error policy: a detector failure aborts the stream (fail-fast); snapshot
// and publish failures are logged and skipped.

use crate::config::check_stream_inputs;
use crate::occupancy::{FrameOccupancy, OccupancyStrategy};
use crate::publish::Publisher;
use crate::regions::RegionCatalog;
use crate::snapshot::{create_run_dir, DiskFrameSink, FrameSink, SnapshotScheduler};
use crate::source::{open_replay, Detector, FrameSource, ReplayDetector, ReplayFrameSource};
use crate::spaces::ParkingSpaceMap;
use crate::track_history::TrackHistoryStore;
use crate::types::{Config, Detection, Frame, OccupancyMode, StreamConfig};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

const PROGRESS_LOG_INTERVAL: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub frames: u64,
    pub frames_with_detections: u64,
    /// Interval boundaries reached (each one is a snapshot/publish attempt).
    pub snapshot_events: u64,
    pub snapshots_saved: u64,
    pub reports_published: u64,
    pub publish_failures: u64,
    pub peak_occupied: u32,
    pub tracked_identities: usize,
    pub last_occupancy: Option<FrameOccupancy>,
}

pub struct FrameCycleController<S: FrameSource, D: Detector> {
    parking: String,
    area: String,
    source: S,
    detector: D,
    history: TrackHistoryStore,
    strategy: OccupancyStrategy,
    scheduler: SnapshotScheduler,
    sink: Option<DiskFrameSink>,
    publisher: Option<Publisher>,
    stationary_threshold: f32,
    /// Class labels allowed to attribute; empty accepts all.
    classes: Vec<String>,
    frame_count: u64,
    stats: StreamStats,
}

impl<S: FrameSource, D: Detector> FrameCycleController<S, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parking: String,
        area: String,
        source: S,
        detector: D,
        history: TrackHistoryStore,
        strategy: OccupancyStrategy,
        scheduler: SnapshotScheduler,
        sink: Option<DiskFrameSink>,
        publisher: Option<Publisher>,
        stationary_threshold: f32,
        classes: Vec<String>,
    ) -> Self {
        Self {
            parking,
            area,
            source,
            detector,
            history,
            strategy,
            scheduler,
            sink,
            publisher,
            stationary_threshold,
            classes,
            frame_count: 0,
            stats: StreamStats::default(),
        }
    }

    /// Drive the stream to completion: loop until the frame source is
    /// exhausted, then return the accumulated stats.
    pub async fn run(mut self) -> Result<StreamStats> {
        info!(
            "Stream '{}' starting ({} mode, snapshot every {} frames)",
            self.area,
            self.strategy.mode_name(),
            self.scheduler.interval()
        );

        while let Some(frame) = self.source.next_frame()? {
            self.process_frame(frame).await?;
        }

        self.stats.tracked_identities = self.history.identity_count();
        info!(
            "Stream '{}' done: {} frames, {} snapshot event(s), {} identity(ies)",
            self.area, self.stats.frames, self.stats.snapshot_events,
            self.stats.tracked_identities
        );
        Ok(self.stats)
    }

    async fn process_frame(&mut self, frame: Frame) -> Result<()> {
        self.frame_count += 1;
        self.stats.frames += 1;

        // Detector failure is stream-fatal by policy
        let detections = self
            .detector
            .detect(&frame)
            .with_context(|| format!("Detector failed on frame {}", frame.id))?;

        let detections: Vec<Detection> = detections
            .into_iter()
            .filter(|d| self.classes.is_empty() || self.classes.iter().any(|c| c == &d.label))
            .collect();

        if !detections.is_empty() {
            self.stats.frames_with_detections += 1;
            for det in &detections {
                self.history.update(det.track_id, det.bbox.center(), &det.label);
            }
        }

        let occupancy =
            self.strategy
                .attribute_frame(&detections, &self.history, self.stationary_threshold);
        self.stats.peak_occupied = self.stats.peak_occupied.max(occupancy.occupied);

        if !occupancy.changed_spaces.is_empty() {
            debug!(
                "Frame {}: space occupancy changed for {:?}",
                self.frame_count, occupancy.changed_spaces
            );
        }

        if self.frame_count % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                "Stream '{}' frame {}: occupied={}/{} available={}",
                self.area, self.frame_count, occupancy.occupied, occupancy.total,
                occupancy.available
            );
        }

        if self.scheduler.is_due(self.frame_count) {
            self.stats.snapshot_events += 1;
            self.snapshot_and_publish(&frame, &occupancy).await;
        }

        self.stats.last_occupancy = Some(occupancy);
        Ok(())
    }

    /// Persist the snapshot image (best effort) and publish the occupancy
    /// report. Neither failure aborts the stream.
    async fn snapshot_and_publish(&mut self, frame: &Frame, occupancy: &FrameOccupancy) {
        let image = match &frame.image_path {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(
                        "Stream '{}': could not read snapshot image '{}': {}",
                        self.area,
                        path.display(),
                        e
                    );
                    None
                }
            },
            None => None,
        };

        if let (Some(sink), Some(bytes)) = (self.sink.as_mut(), image.as_deref()) {
            match sink.persist(self.frame_count, bytes) {
                Ok(path) => {
                    self.stats.snapshots_saved += 1;
                    debug!("Saved snapshot {}", path.display());
                }
                Err(e) => warn!("Stream '{}': snapshot write failed: {}", self.area, e),
            }
        }

        if let Some(publisher) = &self.publisher {
            let report = Publisher::build_report(
                &self.parking,
                &self.area,
                self.frame_count,
                occupancy,
                image.as_deref(),
            );
            match publisher.publish(&report).await {
                Ok(()) => self.stats.reports_published += 1,
                Err(e) => {
                    self.stats.publish_failures += 1;
                    warn!(
                        "Stream '{}': publish failed at frame {}: {:#}",
                        self.area, self.frame_count, e
                    );
                }
            }
        }
    }
}

/// Assemble a replay-backed controller for one configured stream. Startup
/// failures here (missing replay, missing region file) are fatal for this
/// stream only.
pub fn build_controller(
    stream: &StreamConfig,
    config: &Config,
) -> Result<FrameCycleController<ReplayFrameSource, ReplayDetector>> {
    check_stream_inputs(&stream.source, stream.regions.as_deref())?;

    let (source, detector) = open_replay(Path::new(&stream.source), stream.fps)?;

    let strategy = match stream.mode {
        OccupancyMode::PointCount => {
            let catalog = match &stream.regions {
                Some(path) => RegionCatalog::load(Path::new(path))?,
                None => RegionCatalog::full_frame(stream.frame_width, stream.frame_height),
            };
            OccupancyStrategy::PointCount {
                catalog,
                // Presence enforced by Config::validate
                total_spaces: stream.total_spaces.unwrap_or(0),
            }
        }
        OccupancyMode::SpaceOverlap => {
            let path = stream
                .regions
                .as_ref()
                .context("space_overlap mode requires a space definition file")?;
            OccupancyStrategy::SpaceOverlap {
                spaces: ParkingSpaceMap::load(Path::new(path), stream.overlap_buffer)?,
            }
        }
    };

    let scheduler =
        SnapshotScheduler::from_seconds(stream.fps, config.snapshot.interval_seconds);

    let sink = if config.output.save_frames {
        let run_dir = create_run_dir(
            Path::new(&config.output.dir),
            &stream.name,
            config.output.exist_ok,
        )?;
        Some(DiskFrameSink::new(&run_dir)?)
    } else {
        None
    };

    let publisher = if config.publish.enabled {
        Some(Publisher::new(
            config.publish.endpoint.clone(),
            config.publish.timeout_secs,
        )?)
    } else {
        None
    };

    Ok(FrameCycleController::new(
        stream.parking.clone(),
        stream.name.clone(),
        source,
        detector,
        TrackHistoryStore::new(config.tracking.history_cap),
        strategy,
        scheduler,
        sink,
        publisher,
        config.tracking.stationary_threshold,
        config.tracking.classes.clone(),
    ))
}
