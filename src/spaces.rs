// src/spaces.rs
//
// Overlap-based parking-space occupancy (the parking-management variant).
// Each predefined space polygon is tested for spatial overlap against the
// polygons implied by the current frame's detection boxes — not single-point
// containment, and with no stationarity gate. A small buffer tolerance is
// applied to the detection box before the intersection test so a vehicle
// parked fractionally outside its bay still marks the bay occupied.

use crate::geometry::{Point, Polygon};
use crate::types::BoundingBox;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ParkingSpace {
    pub name: String,
    polygon: Polygon,
    occupied: bool,
}

impl ParkingSpace {
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }
}

#[derive(Debug, Deserialize)]
struct SpaceDef {
    name: String,
    points: Vec<[f32; 2]>,
}

/// Per-frame occupancy summary for a space map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceOccupancy {
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
    /// Names of spaces whose occupancy flipped this frame.
    pub changed: Vec<String>,
}

pub struct ParkingSpaceMap {
    spaces: Vec<ParkingSpace>,
    buffer: f32,
}

impl ParkingSpaceMap {
    pub fn load(path: &Path, buffer: f32) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read space definitions '{}'", path.display()))?;
        let defs: Vec<SpaceDef> = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse space definitions '{}'", path.display()))?;

        let mut spaces = Vec::with_capacity(defs.len());
        for def in defs {
            let vertices = def.points.iter().map(|[x, y]| Point::new(*x, *y)).collect();
            let polygon = Polygon::new(vertices)
                .with_context(|| format!("Space '{}' has an invalid polygon", def.name))?;
            spaces.push(ParkingSpace {
                name: def.name,
                polygon,
                occupied: false,
            });
        }
        Ok(Self { spaces, buffer })
    }

    #[cfg(test)]
    pub fn from_spaces(spaces: Vec<(String, Polygon)>, buffer: f32) -> Self {
        Self {
            spaces: spaces
                .into_iter()
                .map(|(name, polygon)| ParkingSpace {
                    name,
                    polygon,
                    occupied: false,
                })
                .collect(),
            buffer,
        }
    }

    /// Reclassify every space against this frame's detection boxes.
    pub fn update(&mut self, boxes: &[BoundingBox]) -> SpaceOccupancy {
        let box_polygons: Vec<Polygon> = boxes
            .iter()
            .map(|b| Polygon::from_bbox(b).expanded(self.buffer))
            .collect();

        let mut occupied = 0u32;
        let mut changed = Vec::new();
        for space in &mut self.spaces {
            let now_occupied = box_polygons.iter().any(|bp| space.polygon.intersects(bp));
            if now_occupied != space.occupied {
                changed.push(space.name.clone());
            }
            space.occupied = now_occupied;
            if now_occupied {
                occupied += 1;
            }
        }

        let total = self.spaces.len() as u32;
        SpaceOccupancy {
            total,
            occupied,
            available: total - occupied,
            changed,
        }
    }

    pub fn spaces(&self) -> &[ParkingSpace] {
        &self.spaces
    }

    /// Names of currently available spaces, in declaration order.
    pub fn available_names(&self) -> Vec<&str> {
        self.spaces
            .iter()
            .filter(|s| !s.occupied)
            .map(|s| s.name.as_str())
            .collect()
    }
}
