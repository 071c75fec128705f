//! Laser Grid - mirror placement and beam reflection engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (shapes, grid, zones, collisions, beam stepping)
//! - `settings`: Static configuration (grid, beam, zones, board)

pub mod settings;
pub mod sim;

pub use settings::{BoundaryMode, Settings, SettingsError};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Board dimensions
    pub const BOARD_WIDTH: f32 = 800.0;
    pub const BOARD_HEIGHT: f32 = 600.0;
    /// Width of the forbidden strip along each board edge
    pub const BOARD_MARGIN: f32 = 40.0;

    /// Grid cell size (world units)
    pub const GRID_CELL: f32 = 20.0;
    /// Vertex-on-grid tolerance
    pub const GRID_TOLERANCE: f32 = 0.01;

    /// Objective defaults - beams that reach it are reported upward
    pub const OBJECTIVE_X: f32 = 400.0;
    pub const OBJECTIVE_Y: f32 = 300.0;
    pub const OBJECTIVE_RADIUS: f32 = 15.0;
    /// Mirrors may not be placed within this radius of the objective
    pub const OBJECTIVE_EXCLUSION_RADIUS: f32 = 60.0;

    /// Beam defaults
    pub const BEAM_SPEED: f32 = 300.0; // units per second
    /// Reflection angles snap to multiples of this (degrees)
    pub const ANGLE_INCREMENT_DEG: f32 = 15.0;
    /// Ticks during which the last-hit mirror is ignored
    pub const REFRACTORY_TICKS: u32 = 3;
    /// Beams are removed after this many reflections
    pub const MAX_REFLECTIONS: u32 = 64;

    /// Escape heuristic displacement for stuck beams
    pub const ESCAPE_DISTANCE: f32 = 2.0;
    /// Binary search iterations for impact refinement
    pub const IMPACT_SEARCH_ITERATIONS: u32 = 10;

    /// Nearest-valid-position search radius (world units)
    pub const PLACEMENT_SEARCH_RADIUS: f32 = 120.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit direction for an angle in degrees (counter-clockwise from +x)
#[inline]
pub fn direction_from_degrees(angle: f32) -> Vec2 {
    Vec2::from_angle(angle.to_radians())
}

/// Angle of a vector in degrees, normalized to [0, 360)
#[inline]
pub fn degrees_of(v: Vec2) -> f32 {
    normalize_degrees(v.y.atan2(v.x).to_degrees())
}
