//! Mirror placement validation and nearest-valid-position search
//!
//! A placement is accepted only if every vertex is on the grid and outside
//! all exclusion zones, no edge crosses a zone, and the polygon does not
//! overlap any other live mirror.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::Grid;
use super::overlap::overlap;
use super::polygon::{self, Aabb};
use super::shape::Mirror;
use super::zones::ZoneSet;

/// Why a candidate placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("shape has zero area or invalid size parameters")]
    DegenerateShape,
    #[error("vertex lies outside the board")]
    OutOfBounds,
    #[error("vertex is not on a grid intersection")]
    VertexOffGrid,
    #[error("vertex lies inside an exclusion zone")]
    VertexInZone,
    #[error("edge crosses an exclusion zone")]
    EdgeCrossesZone,
    #[error("overlaps another mirror")]
    OverlapsObstacle,
    #[error("no mirror with that id")]
    UnknownMirror,
}

/// Everything the validator needs to judge a placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRules {
    pub grid: Grid,
    pub zones: ZoneSet,
    /// Board rectangle every vertex must stay within (`None` = unbounded)
    pub bounds: Option<Aabb>,
    /// Vertex-on-grid tolerance
    pub grid_tolerance: f32,
}

impl PlacementRules {
    pub fn new(grid: Grid, zones: ZoneSet, bounds: Option<Aabb>, grid_tolerance: f32) -> Self {
        Self {
            grid,
            zones,
            bounds,
            grid_tolerance,
        }
    }

    /// Validate a candidate against the rules and the live mirror set.
    ///
    /// Mirrors sharing the candidate's id are skipped, so a mirror being
    /// dragged is never rejected for overlapping its own old position.
    pub fn validate(&self, candidate: &Mirror, obstacles: &[Mirror]) -> Result<(), RejectReason> {
        if candidate.is_degenerate() {
            return Err(RejectReason::DegenerateShape);
        }

        let vertices = candidate.vertices();

        if let Some(bounds) = &self.bounds {
            if !vertices.iter().all(|v| bounds.contains(*v)) {
                return Err(RejectReason::OutOfBounds);
            }
        }

        if !vertices
            .iter()
            .all(|v| self.grid.point_on_grid(*v, self.grid_tolerance))
        {
            return Err(RejectReason::VertexOffGrid);
        }

        if vertices.iter().any(|v| self.zones.point_in_zone(*v)) {
            return Err(RejectReason::VertexInZone);
        }

        if polygon::edges(vertices).any(|(a, b)| self.zones.segment_crosses_zone(a, b)) {
            return Err(RejectReason::EdgeCrossesZone);
        }

        let overlaps = obstacles
            .iter()
            .filter(|other| other.id != candidate.id)
            .any(|other| overlap(vertices, other.vertices()));
        if overlaps {
            return Err(RejectReason::OverlapsObstacle);
        }

        Ok(())
    }

    pub fn is_valid(&self, candidate: &Mirror, obstacles: &[Mirror]) -> bool {
        self.validate(candidate, obstacles).is_ok()
    }

    /// Find the closest center at which the candidate would be accepted.
    ///
    /// An already-valid candidate returns its own center unchanged. Otherwise
    /// the candidate is aligned to the grid and rings of cell offsets are
    /// scanned outward (ring `r` holds every offset at Chebyshev distance
    /// `r`). Each offset re-derives the vertices and re-runs full
    /// validation; the Euclidean-closest passing center wins. Returns `None`
    /// when nothing within `max_radius` passes.
    pub fn find_nearest_valid_position(
        &self,
        candidate: &Mirror,
        obstacles: &[Mirror],
        max_radius: f32,
    ) -> Option<Vec2> {
        if self.is_valid(candidate, obstacles) {
            return Some(candidate.center());
        }

        let cell = self.grid.cell_size;
        if cell.is_nan() || cell <= 0.0 || max_radius.is_nan() || max_radius < 0.0 {
            return None;
        }

        let origin = candidate.aligned_to(&self.grid).center();
        // The aligned origin may sit up to a cell away from the candidate, so
        // one extra ring is needed to reach everything within `max_radius`
        let mut max_ring = ((max_radius / cell).ceil() + 1.0).min(i32::MAX as f32) as i32;
        if let Some(bounds) = &self.bounds {
            // Rings wider than the board cannot hold a valid center
            let span = bounds.width().max(bounds.height());
            max_ring = max_ring.min((span / cell).ceil() as i32 + 1);
        }

        let mut best: Option<(f32, Vec2)> = None;
        for ring in 0..=max_ring {
            // The aligned origin sits within a cell of the candidate, so every
            // offset in this ring or beyond is at least `ring - 1` cells away
            if best.is_some_and(|(best_dist, _)| (ring - 1) as f32 * cell > best_dist) {
                break;
            }

            for (dx, dy) in ring_offsets(ring) {
                let offset = Vec2::new(dx as f32, dy as f32) * cell;
                let center = origin + offset;
                let dist = center.distance(candidate.center());
                if dist > max_radius {
                    continue;
                }
                if best.is_some_and(|(best_dist, _)| dist >= best_dist) {
                    continue;
                }
                if self.is_valid(&candidate.with_center(center), obstacles) {
                    best = Some((dist, center));
                }
            }
        }

        match best {
            Some((dist, center)) => {
                log::debug!(
                    "Mirror {} ({}) relocated {:.1} units to ({:.1}, {:.1})",
                    candidate.id,
                    candidate.shape().name(),
                    dist,
                    center.x,
                    center.y
                );
                Some(center)
            }
            None => {
                log::debug!(
                    "No valid position for mirror {} within {:.1} units",
                    candidate.id,
                    max_radius
                );
                None
            }
        }
    }
}

/// Cell offsets on the perimeter of the square ring at Chebyshev distance
/// `ring`, walked row by row for a stable scan order.
fn ring_offsets(ring: i32) -> Vec<(i32, i32)> {
    if ring == 0 {
        return vec![(0, 0)];
    }
    let mut offsets = Vec::with_capacity((ring * 8) as usize);
    for dy in -ring..=ring {
        if dy.abs() == ring {
            offsets.extend((-ring..=ring).map(|dx| (dx, dy)));
        } else {
            offsets.push((-ring, dy));
            offsets.push((ring, dy));
        }
    }
    offsets
}
