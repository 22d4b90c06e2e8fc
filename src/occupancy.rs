// src/occupancy.rs
//
// Occupancy attribution strategy, selected per stream configuration:
//
//   PointCount   — stationary vehicles counted into named regions by center
//                  containment; available derives from the configured capacity.
//   SpaceOverlap — every defined space classified occupied/available by
//                  polygon overlap against all detection boxes (no
//                  stationarity gate).

use crate::motion::{classify, Motion};
use crate::regions::RegionCatalog;
use crate::spaces::ParkingSpaceMap;
use crate::track_history::TrackHistoryStore;
use crate::types::Detection;
use tracing::debug;

/// Final occupancy numbers for one frame.
#[derive(Debug, Clone)]
pub struct FrameOccupancy {
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
    /// Most/least occupied region this frame (point-count mode with more
    /// than one region only).
    pub busiest: Option<String>,
    pub quietest: Option<String>,
    /// Spaces whose occupancy flipped this frame (space-overlap mode only).
    pub changed_spaces: Vec<String>,
}

pub enum OccupancyStrategy {
    PointCount {
        catalog: RegionCatalog,
        total_spaces: u32,
    },
    SpaceOverlap {
        spaces: ParkingSpaceMap,
    },
}

impl OccupancyStrategy {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::PointCount { .. } => "point_count",
            Self::SpaceOverlap { .. } => "space_overlap",
        }
    }

    /// Run one frame's attribution pass. Counters are recomputed from zero —
    /// occupancy means "occupied in this frame", never cumulative.
    pub fn attribute_frame(
        &mut self,
        detections: &[Detection],
        history: &TrackHistoryStore,
        stationary_threshold: f32,
    ) -> FrameOccupancy {
        match self {
            Self::PointCount {
                catalog,
                total_spaces,
            } => {
                catalog.reset_counts();
                for det in detections {
                    let Some(track) = history.history_of(det.track_id) else {
                        continue;
                    };
                    match classify(track, stationary_threshold) {
                        Motion::Stationary => {
                            if let Some(region) = catalog.attribute(det.bbox.center()) {
                                debug!(
                                    "Track {} attributed to region '{}'",
                                    det.track_id, region
                                );
                            }
                        }
                        // Moving and short-history tracks do not attribute
                        Motion::Moving | Motion::Indeterminate => {}
                    }
                }

                let occupied = catalog.total_count();
                FrameOccupancy {
                    total: *total_spaces,
                    occupied,
                    available: total_spaces.saturating_sub(occupied),
                    busiest: catalog.busiest().map(|r| r.name.clone()),
                    quietest: catalog.quietest().map(|r| r.name.clone()),
                    changed_spaces: Vec::new(),
                }
            }
            Self::SpaceOverlap { spaces } => {
                let boxes: Vec<_> = detections.iter().map(|d| d.bbox).collect();
                let summary = spaces.update(&boxes);
                FrameOccupancy {
                    total: summary.total,
                    occupied: summary.occupied,
                    available: summary.available,
                    busiest: None,
                    quietest: None,
                    changed_spaces: summary.changed,
                }
            }
        }
    }
}
