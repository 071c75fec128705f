//! Seeded free-play layout generation
//!
//! Draws random mirrors from a catalog of grid-compatible shapes and drives
//! each one through placement validation, moving it to the nearest valid
//! position or swapping it for a one-cell square when it does not fit.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::placement::PlacementRules;
use super::shape::{Mirror, MirrorId, Rotation, ShapeDescriptor};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("no valid position found for any of the {requested} requested mirrors")]
    SearchExhausted { requested: usize },
}

/// Shapes whose vertices all land on the grid once one of them does.
/// Sizes are in grid cells.
pub fn catalog(cell: f32) -> Vec<ShapeDescriptor> {
    vec![
        ShapeDescriptor::Square { size: 2.0 * cell },
        ShapeDescriptor::Square { size: 3.0 * cell },
        ShapeDescriptor::Rectangle {
            width: 4.0 * cell,
            height: cell,
        },
        ShapeDescriptor::Rectangle {
            width: 3.0 * cell,
            height: 2.0 * cell,
        },
        ShapeDescriptor::RightTriangle {
            width: 3.0 * cell,
            height: 3.0 * cell,
        },
        ShapeDescriptor::RightTriangle {
            width: 4.0 * cell,
            height: 2.0 * cell,
        },
        ShapeDescriptor::IsoscelesTriangle {
            width: 4.0 * cell,
            height: 2.0 * cell,
        },
        ShapeDescriptor::Trapezoid {
            width: 4.0 * cell,
            height: 2.0 * cell,
            top_width: 2.0 * cell,
        },
        ShapeDescriptor::Parallelogram {
            width: 3.0 * cell,
            height: 2.0 * cell,
            skew: cell,
        },
    ]
}

/// Accept the mirror where it is, or at the nearest valid center
fn settle(
    candidate: &Mirror,
    placed: &[Mirror],
    rules: &PlacementRules,
    search_radius: f32,
) -> Option<Mirror> {
    rules
        .find_nearest_valid_position(candidate, placed, search_radius)
        .map(|center| candidate.with_center(center))
}

/// Generate `count` mirrors for free play, deterministically from `seed`.
///
/// Every returned mirror passes `rules` against all the others. Candidates
/// that cannot be placed even as a one-cell square are skipped; the call
/// only fails when nothing at all could be placed.
pub fn generate_layout(
    seed: u64,
    count: usize,
    rules: &PlacementRules,
    settings: &Settings,
) -> Result<Vec<Mirror>, LayoutError> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let cell = rules.grid.cell_size;
    let shapes = catalog(cell);
    let board = settings.board();
    let cols = (board.width() / cell).floor().max(0.0) as i32;
    let rows = (board.height() / cell).floor().max(0.0) as i32;

    let mut placed: Vec<Mirror> = Vec::with_capacity(count);
    let mut next_id: MirrorId = 1;

    for index in 0..count {
        let shape = shapes[rng.random_range(0..shapes.len())];
        let rotation = Rotation::ALL[rng.random_range(0..Rotation::ALL.len())];
        let center = board.min
            + Vec2::new(
                rng.random_range(0..=cols) as f32,
                rng.random_range(0..=rows) as f32,
            ) * cell;

        let candidate = Mirror::new(next_id, shape, center, rotation).aligned_to(&rules.grid);
        let mirror = settle(&candidate, &placed, rules, settings.placement_search_radius)
            .or_else(|| {
                log::debug!(
                    "Candidate {} ({}) did not fit, trying a one-cell square",
                    index,
                    shape.name()
                );
                let fallback = Mirror::new(
                    next_id,
                    ShapeDescriptor::Square { size: cell },
                    candidate.center(),
                    Rotation::Deg0,
                )
                .aligned_to(&rules.grid);
                settle(&fallback, &placed, rules, settings.placement_search_radius)
            });

        match mirror {
            Some(mirror) => {
                placed.push(mirror);
                next_id += 1;
            }
            None => log::warn!("Skipping layout candidate {}: no valid position", index),
        }
    }

    if count > 0 && placed.is_empty() {
        return Err(LayoutError::SearchExhausted { requested: count });
    }

    log::info!(
        "Generated layout with {} of {} mirrors (seed {})",
        placed.len(),
        count,
        seed
    );
    Ok(placed)
}
