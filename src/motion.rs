// src/motion.rs
//
// Stationary/moving classification from track history. This is a coarse
// overall-displacement test between the first and last retained points, not a
// framewise-velocity test: a vehicle that leaves and returns within the
// retained window reads as stationary. Known approximation, kept as-is.

use crate::track_history::TrackHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Stationary,
    Moving,
    /// Fewer than 2 points — callers must not attribute on this.
    Indeterminate,
}

pub fn classify(history: &TrackHistory, threshold: f32) -> Motion {
    if history.len() < 2 {
        return Motion::Indeterminate;
    }
    // len >= 2 guarantees both endpoints
    let (first, last) = match (history.first(), history.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Motion::Indeterminate,
    };
    if first.distance_to(last) < threshold {
        Motion::Stationary
    } else {
        Motion::Moving
    }
}
