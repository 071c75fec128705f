//! Convex polygon overlap via the Separating Axis Theorem
//!
//! Exact for convex input only. Touching (shared edge or corner) is NOT
//! counted as overlap, so mirrors may sit flush against each other.

use glam::Vec2;

use super::polygon::{self, Aabb};

/// Projection gap below which two intervals are considered touching
const TOUCH_EPSILON: f32 = 1e-4;

/// Project a polygon onto an axis, returning the `(min, max)` interval
fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

/// Outward unit normals of every edge (for either winding)
fn edge_normals(vertices: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    let orientation = polygon::signed_area(vertices).signum();
    polygon::edges(vertices).filter_map(move |(a, b)| {
        // Rotating a CCW edge by -90° points out of the polygon
        let edge = b - a;
        let normal = Vec2::new(edge.y, -edge.x) * orientation;
        let normal = normal.normalize_or_zero();
        (normal != Vec2::ZERO).then_some(normal)
    })
}

/// True if `axis` separates the two polygons
fn separates(a: &[Vec2], b: &[Vec2], axis: Vec2) -> bool {
    let (min_a, max_a) = project(a, axis);
    let (min_b, max_b) = project(b, axis);
    max_a <= min_b + TOUCH_EPSILON || max_b <= min_a + TOUCH_EPSILON
}

/// True if the interiors of two convex polygons overlap.
///
/// Bounding boxes are compared first; otherwise every edge normal of both
/// polygons is tried as a separating axis, exiting on the first one found.
/// Degenerate polygons never overlap anything.
pub fn overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if polygon::is_degenerate(a) || polygon::is_degenerate(b) {
        return false;
    }

    if let (Some(box_a), Some(box_b)) = (Aabb::from_points(a), Aabb::from_points(b)) {
        if !box_a.overlaps(&box_b) {
            return false;
        }
    }

    edge_normals(a)
        .chain(edge_normals(b))
        .all(|axis| !separates(a, b, axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::shape::{Rotation, ShapeDescriptor};

    fn square(center: Vec2, size: f32) -> Vec<Vec2> {
        ShapeDescriptor::Square { size }.vertices(center, Rotation::Deg0)
    }

    #[test]
    fn test_disjoint_squares() {
        let a = square(Vec2::new(0.0, 0.0), 20.0);
        let b = square(Vec2::new(100.0, 0.0), 20.0);
        assert!(!overlap(&a, &b));
    }

    #[test]
    fn test_overlapping_squares() {
        let a = square(Vec2::new(0.0, 0.0), 20.0);
        let b = square(Vec2::new(15.0, 5.0), 20.0);
        assert!(overlap(&a, &b));
        assert!(overlap(&b, &a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = square(Vec2::new(0.0, 0.0), 20.0);
        let b = square(Vec2::new(20.0, 0.0), 20.0);
        assert!(!overlap(&a, &b));
        // Corner contact only
        let c = square(Vec2::new(20.0, 20.0), 20.0);
        assert!(!overlap(&a, &c));
    }

    #[test]
    fn test_contained_polygon_overlaps() {
        let outer = square(Vec2::new(0.0, 0.0), 100.0);
        let inner = square(Vec2::new(10.0, -10.0), 10.0);
        assert!(overlap(&outer, &inner));
        assert!(overlap(&inner, &outer));
    }

    #[test]
    fn test_triangle_diagonal_separation() {
        // Bounding boxes overlap but the hypotenuse separates them
        let lower = ShapeDescriptor::RightTriangle {
            width: 40.0,
            height: 40.0,
        }
        .vertices(Vec2::ZERO, Rotation::Deg0);
        let upper = ShapeDescriptor::RightTriangle {
            width: 40.0,
            height: 40.0,
        }
        .vertices(Vec2::ZERO, Rotation::Deg180);
        assert!(!overlap(&lower, &upper));

        let shifted = ShapeDescriptor::RightTriangle {
            width: 40.0,
            height: 40.0,
        }
        .vertices(Vec2::new(-5.0, -5.0), Rotation::Deg180);
        assert!(overlap(&lower, &shifted));
    }

    #[test]
    fn test_clockwise_input() {
        let a = square(Vec2::ZERO, 20.0);
        let mut b = square(Vec2::new(5.0, 0.0), 20.0);
        b.reverse();
        assert!(overlap(&a, &b));
    }

    #[test]
    fn test_degenerate_never_overlaps() {
        let a = square(Vec2::ZERO, 20.0);
        let line = vec![Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(0.0, 0.0)];
        assert!(!overlap(&a, &line));
        assert!(!overlap(&line, &a));
    }
}
