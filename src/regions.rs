// src/regions.rs
//
// Named counting regions for the point-count occupancy mode. Regions are
// loaded once per stream and immutable afterwards; counters are per-frame and
// recomputed from zero on every attribution pass.

use crate::geometry::{Point, Polygon};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default region display color (BGR).
const DEFAULT_REGION_COLOR: [u8; 3] = [255, 42, 4];
const DEFAULT_TEXT_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    polygon: Polygon,
    count: u32,
    pub color: [u8; 3],
    pub text_color: [u8; 3],
}

impl Region {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }
}

#[derive(Debug, Deserialize)]
struct RegionDef {
    name: String,
    points: Vec<[f32; 2]>,
    color: Option<[u8; 3]>,
    text_color: Option<[u8; 3]>,
}

/// Regions in declaration order. Attribution iterates in this order, so
/// overlapping regions resolve deterministically: first match wins.
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read region definitions '{}'", path.display()))?;
        let defs: Vec<RegionDef> = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse region definitions '{}'", path.display()))?;

        let mut regions = Vec::with_capacity(defs.len());
        for def in defs {
            let vertices = def.points.iter().map(|[x, y]| Point::new(*x, *y)).collect();
            let polygon = Polygon::new(vertices)
                .with_context(|| format!("Region '{}' has an invalid polygon", def.name))?;
            regions.push(Region {
                name: def.name,
                polygon,
                count: 0,
                color: def.color.unwrap_or(DEFAULT_REGION_COLOR),
                text_color: def.text_color.unwrap_or(DEFAULT_TEXT_COLOR),
            });
        }
        Ok(Self { regions })
    }

    /// Single region covering the entire frame, the fallback when a stream
    /// has no region definition file.
    pub fn full_frame(width: f32, height: f32) -> Self {
        let polygon = Polygon::from_bbox(&crate::types::BoundingBox {
            x1: 0.0,
            y1: 0.0,
            x2: width,
            y2: height,
        });
        Self {
            regions: vec![Region {
                name: "full_frame".to_string(),
                polygon,
                count: 0,
                color: DEFAULT_REGION_COLOR,
                text_color: DEFAULT_TEXT_COLOR,
            }],
        }
    }

    #[cfg(test)]
    pub fn from_regions(regions: Vec<(String, Polygon)>) -> Self {
        Self {
            regions: regions
                .into_iter()
                .map(|(name, polygon)| Region {
                    name,
                    polygon,
                    count: 0,
                    color: DEFAULT_REGION_COLOR,
                    text_color: DEFAULT_TEXT_COLOR,
                })
                .collect(),
        }
    }

    /// Zero every counter. Called once per frame before attribution.
    pub fn reset_counts(&mut self) {
        for region in &mut self.regions {
            region.count = 0;
        }
    }

    /// Increment the first region containing the point, then stop — one
    /// object attributes to at most one region per frame. Returns the name of
    /// the credited region, or None when the point misses every region.
    pub fn attribute(&mut self, point: Point) -> Option<&str> {
        for region in &mut self.regions {
            if region.polygon.contains(point) {
                region.count += 1;
                return Some(region.name.as_str());
            }
        }
        None
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn total_count(&self) -> u32 {
        self.regions.iter().map(|r| r.count).sum()
    }

    /// Region with the highest count this frame. None with fewer than two
    /// regions — a single-region extreme carries no information.
    pub fn busiest(&self) -> Option<&Region> {
        if self.regions.len() < 2 {
            return None;
        }
        self.regions.iter().max_by_key(|r| r.count)
    }

    pub fn quietest(&self) -> Option<&Region> {
        if self.regions.len() < 2 {
            return None;
        }
        self.regions.iter().min_by_key(|r| r.count)
    }
}
