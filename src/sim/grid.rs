//! Grid alignment and angle quantization
//!
//! Mirror vertices must sit on grid intersections, and beam directions are
//! restricted to multiples of a fixed angle increment. Both are the same
//! operation: round a continuous value to the nearest allowed step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_degrees;

/// A uniform square grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Distance between neighbouring intersections
    pub cell_size: f32,
}

impl Grid {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size }
    }

    /// Snap a scalar to the nearest multiple of the cell size.
    ///
    /// Exact ties round up (toward +infinity), so `snap(10.0)` with a 20 unit
    /// cell gives 20, and `snap(-10.0)` gives 0.
    #[inline]
    pub fn snap(&self, v: f32) -> f32 {
        round_half_up(v, self.cell_size)
    }

    /// Snap both coordinates of a point
    #[inline]
    pub fn snap_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.snap(p.x), self.snap(p.y))
    }

    /// Whether a scalar lies within `tolerance` of a grid line
    #[inline]
    pub fn is_on_grid(&self, v: f32, tolerance: f32) -> bool {
        (v - self.snap(v)).abs() <= tolerance
    }

    /// Whether a point lies on a grid intersection
    #[inline]
    pub fn point_on_grid(&self, p: Vec2, tolerance: f32) -> bool {
        self.is_on_grid(p.x, tolerance) && self.is_on_grid(p.y, tolerance)
    }
}

/// Round `v` to the nearest multiple of `step`, ties toward +infinity.
/// A non-positive or non-finite step leaves the value unchanged.
#[inline]
fn round_half_up(v: f32, step: f32) -> f32 {
    if step <= 0.0 || !step.is_finite() {
        return v;
    }
    (v / step + 0.5).floor() * step
}

/// Number of whole increments in a full turn, or `None` when the increment
/// does not evenly divide 360 degrees.
pub fn steps_per_turn(increment_deg: f32) -> Option<i32> {
    if increment_deg.is_nan() || increment_deg <= 0.0 || increment_deg > 360.0 {
        return None;
    }
    let steps = (360.0 / increment_deg).round();
    if (steps * increment_deg - 360.0).abs() > 1e-3 {
        return None;
    }
    Some(steps as i32)
}

/// Index of the nearest allowed direction, in `0..steps_per_turn`.
///
/// Falls back to unquantized rounding (one step per degree) when the
/// increment is unusable.
pub fn quantize_angle_steps(angle_deg: f32, increment_deg: f32) -> i32 {
    let (increment, steps) = match steps_per_turn(increment_deg) {
        Some(steps) => (increment_deg, steps),
        None => (1.0, 360),
    };
    let k = (normalize_degrees(angle_deg) / increment + 0.5).floor() as i32;
    k.rem_euclid(steps)
}

/// Snap an angle (degrees) to the nearest multiple of the increment,
/// normalized to [0, 360).
pub fn quantize_angle(angle_deg: f32, increment_deg: f32) -> f32 {
    let increment = if steps_per_turn(increment_deg).is_some() {
        increment_deg
    } else {
        1.0
    };
    quantize_angle_steps(angle_deg, increment_deg) as f32 * increment
}
