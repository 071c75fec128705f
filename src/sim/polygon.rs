//! Shared polygon primitives
//!
//! Every geometric test in the engine (SAT overlap, zone checks, swept beam
//! collision) is built from the handful of helpers in this file. Degenerate
//! inputs resolve to "no intersection" rather than NaN.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which two segments are treated as parallel
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounding box of a point set, `None` for an empty set
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// True if the interiors overlap; shared edges or corners do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Closed containment (boundary counts as inside)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Iterate the edges of a closed polygon as `(start, end)` pairs
pub fn edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

/// Signed area (positive for counter-clockwise winding)
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    edges(vertices).map(|(a, b)| a.perp_dot(b)).sum::<f32>() * 0.5
}

/// True if the polygon has fewer than three vertices or (near) zero area
pub fn is_degenerate(vertices: &[Vec2]) -> bool {
    vertices.len() < 3
        || vertices.iter().any(|v| !v.is_finite())
        || signed_area(vertices).abs() < PARALLEL_EPSILON
}

/// Strict point-in-convex-polygon test.
///
/// Points exactly on an edge are outside. Works for either winding.
pub fn point_in_convex(p: Vec2, vertices: &[Vec2]) -> bool {
    if is_degenerate(vertices) {
        return false;
    }
    let orientation = signed_area(vertices).signum();
    edges(vertices).all(|(a, b)| (b - a).perp_dot(p - a) * orientation > 0.0)
}

/// Proper intersection of segments `p0→p1` and `q0→q1`.
///
/// Returns the parameters `(t, s)` of the crossing along each segment, both in
/// [0, 1]. Parallel or collinear segments and zero-length segments yield
/// `None`.
pub fn segment_intersection(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<(f32, f32)> {
    let d1 = p1 - p0;
    let d2 = q1 - q0;

    // 2D cross product of the two directions
    let denom = d1.perp_dot(d2);
    let scale = d1.length() * d2.length();
    if scale <= f32::EPSILON || denom.abs() <= PARALLEL_EPSILON * scale {
        return None;
    }

    let offset = q0 - p0;
    let t = offset.perp_dot(d2) / denom;
    let s = offset.perp_dot(d1) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
        Some((t, s))
    } else {
        None
    }
}

/// Closest point on segment `a→b` to `p`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Index of the edge closest to `p`, `None` for an empty polygon
pub fn nearest_edge(p: Vec2, vertices: &[Vec2]) -> Option<usize> {
    edges(vertices)
        .enumerate()
        .map(|(i, (a, b))| (i, closest_point_on_segment(p, a, b).distance_squared(p)))
        .min_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_signed_area_winding() {
        let mut square = unit_square();
        assert!((signed_area(&square) - 1.0).abs() < 1e-6);
        square.reverse();
        assert!((signed_area(&square) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_convex() {
        let square = unit_square();
        assert!(point_in_convex(Vec2::new(0.5, 0.5), &square));
        assert!(!point_in_convex(Vec2::new(1.5, 0.5), &square));
        // Boundary is outside
        assert!(!point_in_convex(Vec2::new(1.0, 0.5), &square));

        let mut clockwise = square.clone();
        clockwise.reverse();
        assert!(point_in_convex(Vec2::new(0.25, 0.75), &clockwise));
    }

    #[test]
    fn test_segment_intersection_crossing() {
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
        );
        let (t, s) = hit.expect("segments cross");
        assert!((t - 0.5).abs() < 1e-6);
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_segment_intersection_parallel_is_none() {
        assert!(
            segment_intersection(
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
            )
            .is_none()
        );
        // Collinear overlap is also treated as no intersection
        assert!(
            segment_intersection(
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(3.0, 0.0),
            )
            .is_none()
        );
    }

    #[test]
    fn test_segment_intersection_zero_length() {
        let p = Vec2::new(0.5, 0.0);
        assert!(segment_intersection(p, p, Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn test_aabb_touching_is_not_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(1.0, 1.0));
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(!a.overlaps(&b));
        let c = Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        assert!(is_degenerate(&line));
        assert!(!point_in_convex(Vec2::new(1.0, 0.0), &line));
    }

    #[test]
    fn test_nearest_edge() {
        let square = unit_square();
        assert_eq!(nearest_edge(Vec2::new(0.5, -0.2), &square), Some(0));
        assert_eq!(nearest_edge(Vec2::new(1.3, 0.5), &square), Some(1));
    }
}
