//! Exclusion zones - regions where mirrors may not be placed
//!
//! Zones are open sets: a point exactly on a zone boundary is allowed, and a
//! segment that only grazes a boundary (tangent to a circle, or running along
//! a rectangle edge) does not cross the zone.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::polygon::{self, Aabb};

/// Discriminant / parameter tolerance for circle tests
const CIRCLE_EPSILON: f32 = 1e-6;

/// A static forbidden region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionZone {
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned, `origin` is the minimum corner
    Rectangle { origin: Vec2, width: f32, height: f32 },
}

impl ExclusionZone {
    /// Strict containment (boundary is not inside)
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            ExclusionZone::Circle { center, radius } => {
                p.distance_squared(center) < radius * radius
            }
            ExclusionZone::Rectangle {
                origin,
                width,
                height,
            } => {
                p.x > origin.x
                    && p.x < origin.x + width
                    && p.y > origin.y
                    && p.y < origin.y + height
            }
        }
    }

    /// Whether any part of segment `a→b` passes through the zone interior
    pub fn segment_crosses(&self, a: Vec2, b: Vec2) -> bool {
        match *self {
            ExclusionZone::Circle { center, radius } => {
                segment_crosses_circle(a, b, center, radius)
            }
            ExclusionZone::Rectangle { .. } => segment_crosses_rectangle(a, b, self),
        }
    }

    fn corners(&self) -> Option<[Vec2; 4]> {
        match *self {
            ExclusionZone::Rectangle {
                origin,
                width,
                height,
            } => Some([
                origin,
                origin + Vec2::new(width, 0.0),
                origin + Vec2::new(width, height),
                origin + Vec2::new(0.0, height),
            ]),
            ExclusionZone::Circle { .. } => None,
        }
    }
}

/// Circle case: solve |a + t·d - c|² = r² and look for interior overlap of
/// the root interval with t ∈ [0, 1].
fn segment_crosses_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    let d = b - a;
    let f = a - center;

    let qa = d.dot(d);
    if qa <= f32::EPSILON {
        // Zero-length segment degenerates to a point test
        return f.length_squared() < radius * radius;
    }
    let qb = 2.0 * f.dot(d);
    let qc = f.dot(f) - radius * radius;

    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant <= CIRCLE_EPSILON * qa {
        // Misses or only touches tangentially
        return false;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-qb - sqrt_disc) / (2.0 * qa);
    let t2 = (-qb + sqrt_disc) / (2.0 * qa);

    // Open interval (t1, t2) is inside the circle
    t1 < 1.0 - CIRCLE_EPSILON && t2 > CIRCLE_EPSILON
}

/// Rectangle case: split the segment at every edge crossing, then test the
/// midpoint of each piece for strict containment. Catches both crossings and
/// segments lying entirely inside.
fn segment_crosses_rectangle(a: Vec2, b: Vec2, zone: &ExclusionZone) -> bool {
    let Some(corners) = zone.corners() else {
        return false;
    };

    let mut cuts = vec![0.0_f32, 1.0];
    for (c0, c1) in polygon::edges(&corners) {
        if let Some((t, _)) = polygon::segment_intersection(a, b, c0, c1) {
            cuts.push(t);
        }
    }
    cuts.sort_by(f32::total_cmp);

    cuts.windows(2).any(|pair| {
        let mid = a.lerp(b, (pair[0] + pair[1]) * 0.5);
        zone.contains(mid)
    })
}

/// The full set of exclusion zones for a board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub zones: Vec<ExclusionZone>,
}

impl ZoneSet {
    pub fn new(zones: Vec<ExclusionZone>) -> Self {
        Self { zones }
    }

    /// Objective circle plus a margin strip along each edge of the board
    pub fn standard(board: Aabb, margin: f32, objective: Vec2, objective_radius: f32) -> Self {
        let mut zones = vec![ExclusionZone::Circle {
            center: objective,
            radius: objective_radius,
        }];

        if margin > 0.0 {
            let (w, h) = (board.width(), board.height());
            zones.extend([
                // Bottom and top strips span the full width
                ExclusionZone::Rectangle {
                    origin: board.min,
                    width: w,
                    height: margin,
                },
                ExclusionZone::Rectangle {
                    origin: Vec2::new(board.min.x, board.max.y - margin),
                    width: w,
                    height: margin,
                },
                // Left and right strips
                ExclusionZone::Rectangle {
                    origin: board.min,
                    width: margin,
                    height: h,
                },
                ExclusionZone::Rectangle {
                    origin: Vec2::new(board.max.x - margin, board.min.y),
                    width: margin,
                    height: h,
                },
            ]);
        }

        Self { zones }
    }

    /// True if the point lies inside any zone
    pub fn point_in_zone(&self, p: Vec2) -> bool {
        self.zones.iter().any(|z| z.contains(p))
    }

    /// True if the segment passes through any zone
    pub fn segment_crosses_zone(&self, a: Vec2, b: Vec2) -> bool {
        self.zones.iter().any(|z| z.segment_crosses(a, b))
    }
}
