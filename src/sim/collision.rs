//! Swept (continuous) beam-vs-mirror collision detection
//!
//! A beam only exists at discrete samples, one per tick. Testing the samples
//! alone lets a fast beam skip straight through a thin mirror, so each tick
//! is checked as a segment from the previous to the current position:
//!
//! 1. point-in-polygon at both ends (outside → inside is a hit)
//! 2. segment vs every edge (catches skip-through with both ends outside)
//!
//! Confirmed hits are refined with a bounded binary search so the beam can be
//! relocated to just outside the boundary before it reflects.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::polygon::{self, point_in_convex, segment_intersection};
use crate::consts::IMPACT_SEARCH_ITERATIONS;

/// Where a beam met a mirror boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Fraction of the tick's path travelled before the impact
    pub t: f32,
    /// Last sample found outside the polygon (beam relocates here)
    pub point: Vec2,
    /// Index of the struck edge (`vertices[edge]` → `vertices[edge + 1]`)
    pub edge: usize,
}

/// Outcome of a swept test against one mirror
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sweep {
    Miss,
    Hit(Impact),
    /// Inside at both samples with no boundary crossing
    Stuck,
}

impl Sweep {
    pub fn is_hit(&self) -> bool {
        matches!(self, Sweep::Hit(_))
    }
}

/// Whether the path `prev → curr` collides with the polygon
pub fn swept_collision(prev: Vec2, curr: Vec2, vertices: &[Vec2]) -> bool {
    sweep(prev, curr, vertices).is_hit()
}

/// Crossings closer than this in t are treated as simultaneous
const CROSSING_TIE_EPSILON: f32 = 1e-5;

/// Earliest edge crossed by the segment, as `(t, edge index)`.
///
/// A path through a vertex crosses both adjacent edges at the same t; the
/// edge whose outward normal most directly opposes the path wins.
fn first_crossing(prev: Vec2, curr: Vec2, vertices: &[Vec2]) -> Option<(f32, usize)> {
    let dir = (curr - prev).normalize_or_zero();
    let orientation = polygon::signed_area(vertices).signum();
    let facing = |a: Vec2, b: Vec2| {
        let e = b - a;
        let outward = Vec2::new(e.y, -e.x).normalize_or_zero() * orientation;
        dir.dot(outward)
    };

    let mut best: Option<(f32, usize, f32)> = None;
    for (i, (a, b)) in polygon::edges(vertices).enumerate() {
        let Some((t, _)) = segment_intersection(prev, curr, a, b) else {
            continue;
        };
        let score = facing(a, b);
        match best {
            Some((bt, _, bscore)) if (t - bt).abs() <= CROSSING_TIE_EPSILON => {
                if score < bscore {
                    best = Some((t.min(bt), i, score));
                }
            }
            Some((bt, _, _)) if bt < t => {}
            _ => best = Some((t, i, score)),
        }
    }
    best.map(|(t, i, _)| (t, i))
}

/// Full swept test of one tick's path against a convex polygon
pub fn sweep(prev: Vec2, curr: Vec2, vertices: &[Vec2]) -> Sweep {
    if polygon::is_degenerate(vertices) || !prev.is_finite() || !curr.is_finite() {
        return Sweep::Miss;
    }

    let inside_prev = point_in_convex(prev, vertices);
    let inside_curr = point_in_convex(curr, vertices);
    let crossing = first_crossing(prev, curr, vertices);

    match (inside_prev, inside_curr) {
        (true, true) => Sweep::Stuck,
        // Leaving the polygon is never a new collision
        (true, false) => Sweep::Miss,
        (false, true) => Sweep::Hit(refine_impact(prev, curr, vertices, crossing)),
        (false, false) => match crossing {
            Some(_) => Sweep::Hit(refine_impact(prev, curr, vertices, crossing)),
            None => Sweep::Miss,
        },
    }
}

/// True once the partial path `prev → p(t)` has reached the polygon
fn reached(prev: Vec2, p: Vec2, vertices: &[Vec2]) -> bool {
    point_in_convex(p, vertices) || first_crossing(prev, p, vertices).is_some()
}

/// Binary search on t ∈ [0, 1] for the boundary crossing.
///
/// `lo` is kept outside, `hi` past the boundary; the returned point is `lo`.
fn refine_impact(
    prev: Vec2,
    curr: Vec2,
    vertices: &[Vec2],
    crossing: Option<(f32, usize)>,
) -> Impact {
    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    for _ in 0..IMPACT_SEARCH_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        if reached(prev, prev.lerp(curr, mid), vertices) {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let point = prev.lerp(curr, lo);
    let edge = match crossing {
        Some((_, edge)) => edge,
        // Entered without a resolvable crossing (e.g. through a vertex)
        None => polygon::nearest_edge(curr, vertices).unwrap_or(0),
    };

    Impact { t: lo, point, edge }
}

/// True if the beam position is strictly inside any of the polygons
pub fn inside_any<'a>(p: Vec2, mut polygons: impl Iterator<Item = &'a [Vec2]>) -> bool {
    polygons.any(|vertices| point_in_convex(p, vertices))
}
