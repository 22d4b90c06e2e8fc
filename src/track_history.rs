// src/track_history.rs
//
// Per-stream store of recent center points per track identity. Identities are
// assigned by the external tracker and persist across frames; this store only
// appends. Histories are bounded per identity, but entries for identities
// that stop appearing are never reclaimed — over an unbounded stream the map
// grows with the number of distinct identities ever seen. Known limitation.

use crate::geometry::Point;
use std::collections::HashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct TrackHistory {
    points: VecDeque<Point>,
    label: String,
}

impl TrackHistory {
    fn new(cap: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(cap),
            label: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.front().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.back().copied()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    /// Most recent class label reported for this identity.
    pub fn label(&self) -> &str {
        &self.label
    }
}

pub struct TrackHistoryStore {
    histories: HashMap<i64, TrackHistory>,
    cap: usize,
}

impl TrackHistoryStore {
    pub fn new(cap: usize) -> Self {
        Self {
            histories: HashMap::new(),
            cap,
        }
    }

    /// Append a center point for an identity, evicting the oldest point once
    /// the history exceeds the cap.
    pub fn update(&mut self, identity: i64, point: Point, label: &str) {
        let cap = self.cap;
        let history = self
            .histories
            .entry(identity)
            .or_insert_with(|| TrackHistory::new(cap));
        history.points.push_back(point);
        if history.points.len() > cap {
            history.points.pop_front();
        }
        if history.label != label {
            history.label = label.to_string();
        }
    }

    /// None for a never-seen identity — callers must check before computing
    /// motion.
    pub fn history_of(&self, identity: i64) -> Option<&TrackHistory> {
        self.histories.get(&identity)
    }

    /// Number of distinct identities ever observed.
    pub fn identity_count(&self) -> usize {
        self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_unknown_identity_has_no_history() {
        let store = TrackHistoryStore::new(30);
        assert!(store.history_of(99).is_none());
    }

    #[test]
    fn test_points_append_in_order() {
        let mut store = TrackHistoryStore::new(30);
        store.update(1, p(0.0, 0.0), "car");
        store.update(1, p(1.0, 0.0), "car");
        store.update(1, p(2.0, 0.0), "car");

        let history = store.history_of(1).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.first(), Some(p(0.0, 0.0)));
        assert_eq!(history.last(), Some(p(2.0, 0.0)));
    }

    #[test]
    fn test_cap_evicts_oldest_first() {
        let cap = 30;
        let mut store = TrackHistoryStore::new(cap);
        for i in 0..45 {
            store.update(7, p(i as f32, 0.0), "car");
        }

        let history = store.history_of(7).unwrap();
        assert_eq!(history.len(), cap);
        // Exactly the last `cap` points remain, in order
        let xs: Vec<f32> = history.points().map(|pt| pt.x).collect();
        let expected: Vec<f32> = (15..45).map(|i| i as f32).collect();
        assert_eq!(xs, expected);
    }

    #[test]
    fn test_identities_are_isolated() {
        let mut store = TrackHistoryStore::new(30);
        store.update(1, p(0.0, 0.0), "car");
        store.update(2, p(100.0, 100.0), "bus");

        assert_eq!(store.identity_count(), 2);
        assert_eq!(store.history_of(1).unwrap().len(), 1);
        assert_eq!(store.history_of(2).unwrap().label(), "bus");
    }

    #[test]
    fn test_label_tracks_most_recent() {
        let mut store = TrackHistoryStore::new(30);
        store.update(3, p(0.0, 0.0), "car");
        store.update(3, p(1.0, 0.0), "truck");
        assert_eq!(store.history_of(3).unwrap().label(), "truck");
    }
}
