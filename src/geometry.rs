// src/geometry.rs
//
// Polygon primitives for occupancy attribution.
//
// Two containment questions drive the whole engine:
//   - point-in-polygon (whole-frame region counting) — boundary-inclusive
//   - polygon-polygon intersection (parking-space overlap, with a small
//     buffer tolerance applied to the detection box)

use crate::types::BoundingBox;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Collinearity tolerance for the boundary test, in squared pixels.
const BOUNDARY_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Result<Self> {
        if vertices.len() < 3 {
            bail!("Polygon needs at least 3 vertices, got {}", vertices.len());
        }
        Ok(Self { vertices })
    }

    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self {
            vertices: vec![
                Point::new(bbox.x1, bbox.y1),
                Point::new(bbox.x2, bbox.y1),
                Point::new(bbox.x2, bbox.y2),
                Point::new(bbox.x1, bbox.y2),
            ],
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    fn centroid(&self) -> Point {
        let n = self.vertices.len() as f32;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
        Point::new(sx / n, sy / n)
    }

    /// Grow the polygon by pushing each vertex `margin` pixels away from the
    /// centroid. Used to apply the overlap buffer tolerance to detection
    /// boxes before the intersection test.
    pub fn expanded(&self, margin: f32) -> Self {
        if margin == 0.0 {
            return self.clone();
        }
        let c = self.centroid();
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let len = v.distance_to(c);
                if len < f32::EPSILON {
                    *v
                } else {
                    Point::new(
                        v.x + (v.x - c.x) / len * margin,
                        v.y + (v.y - c.y) / len * margin,
                    )
                }
            })
            .collect();
        Self { vertices }
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    fn on_boundary(&self, p: Point) -> bool {
        self.edges().any(|(a, b)| on_segment(a, b, p))
    }

    /// Even-odd ray cast, with the boundary counted as contained.
    pub fn contains(&self, p: Point) -> bool {
        if self.on_boundary(p) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True if the polygons share any area, touch, or one contains the other.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if self.vertices.iter().any(|v| other.contains(*v))
            || other.vertices.iter().any(|v| self.contains(*v))
        {
            return true;
        }
        for (a, b) in self.edges() {
            for (c, d) in other.edges() {
                if segments_intersect(a, b, c, d) {
                    return true;
                }
            }
        }
        false
    }
}

fn cross(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    if cross(a, b, p).abs() > BOUNDARY_EPSILON * a.distance_to(b).max(1.0) {
        return false;
    }
    p.x >= a.x.min(b.x) - f32::EPSILON
        && p.x <= a.x.max(b.x) + f32::EPSILON
        && p.y >= a.y.min(b.y) - f32::EPSILON
        && p.y <= a.y.max(b.y) + f32::EPSILON
}

fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear / endpoint-touching cases
    on_segment(p3, p4, p1) || on_segment(p3, p4, p2) || on_segment(p1, p2, p3) || on_segment(p1, p2, p4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        assert!(Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_interior_point_contained() {
        assert!(unit_square().contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_exterior_point_not_contained() {
        assert!(!unit_square().contains(Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_boundary_point_contained() {
        let sq = unit_square();
        assert!(sq.contains(Point::new(10.0, 5.0)), "edge point is inside");
        assert!(sq.contains(Point::new(0.0, 0.0)), "vertex is inside");
    }

    #[test]
    fn test_concave_polygon_containment() {
        // L-shape: notch cut from the top-right quadrant
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap();
        assert!(poly.contains(Point::new(2.0, 8.0)));
        assert!(!poly.contains(Point::new(8.0, 8.0)), "notch is outside");
    }

    #[test]
    fn test_overlapping_polygons_intersect() {
        let a = unit_square();
        let b = Polygon::from_bbox(&BoundingBox {
            x1: 5.0,
            y1: 5.0,
            x2: 15.0,
            y2: 15.0,
        });
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_disjoint_polygons_do_not_intersect() {
        let a = unit_square();
        let b = Polygon::from_bbox(&BoundingBox {
            x1: 20.0,
            y1: 20.0,
            x2: 30.0,
            y2: 30.0,
        });
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contained_polygon_intersects() {
        let outer = unit_square();
        let inner = Polygon::from_bbox(&BoundingBox {
            x1: 3.0,
            y1: 3.0,
            x2: 7.0,
            y2: 7.0,
        });
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_crossing_without_contained_vertices() {
        // Plus-sign configuration: edges cross but no vertex of either
        // polygon lies inside the other.
        let horizontal = Polygon::new(vec![
            Point::new(-10.0, 4.0),
            Point::new(20.0, 4.0),
            Point::new(20.0, 6.0),
            Point::new(-10.0, 6.0),
        ])
        .unwrap();
        let vertical = Polygon::new(vec![
            Point::new(4.0, -10.0),
            Point::new(6.0, -10.0),
            Point::new(6.0, 20.0),
            Point::new(4.0, 20.0),
        ])
        .unwrap();
        assert!(horizontal.intersects(&vertical));
    }

    #[test]
    fn test_expanded_bridges_small_gap() {
        let a = unit_square();
        // 3px away from the square's right edge
        let b = Polygon::from_bbox(&BoundingBox {
            x1: 13.0,
            y1: 0.0,
            x2: 23.0,
            y2: 10.0,
        });
        assert!(!a.intersects(&b));
        assert!(a.intersects(&b.expanded(5.0)), "buffer closes the gap");
    }
}
