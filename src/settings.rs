//! Engine settings
//!
//! Static configuration for the board, grid, beams and exclusion zones.
//! Persisted as JSON; missing fields fall back to the defaults in `consts`.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::grid::{Grid, steps_per_turn};
use crate::sim::placement::PlacementRules;
use crate::sim::polygon::Aabb;
use crate::sim::zones::{ExclusionZone, ZoneSet};

/// What happens when a beam reaches the board edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Beam leaves the play area and is removed
    #[default]
    Remove,
    /// Beam bounces off the board edge like a wall
    Bounce,
}

impl BoundaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryMode::Remove => "remove",
            BoundaryMode::Bounce => "bounce",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "remove" => Some(BoundaryMode::Remove),
            "bounce" | "wall" => Some(BoundaryMode::Bounce),
            _ => None,
        }
    }
}

/// Settings load/save failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Board ===
    pub board_width: f32,
    pub board_height: f32,
    /// Forbidden strip along each board edge
    pub board_margin: f32,
    pub boundary_mode: BoundaryMode,

    // === Grid ===
    pub grid_cell: f32,
    pub grid_tolerance: f32,

    // === Objective ===
    pub objective: Vec2,
    /// Beams entering this radius reach the objective
    pub objective_radius: f32,
    /// Mirrors may not be placed within this radius
    pub objective_exclusion_radius: f32,

    // === Beams ===
    pub launch_point: Vec2,
    pub beam_speed: f32,
    pub angle_increment_deg: f32,
    pub refractory_ticks: u32,
    pub max_reflections: u32,
    pub escape_distance: f32,

    // === Placement ===
    pub placement_search_radius: f32,
    /// Additional zones on top of the standard objective/margin set
    pub extra_zones: Vec<ExclusionZone>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            board_margin: BOARD_MARGIN,
            boundary_mode: BoundaryMode::Remove,

            grid_cell: GRID_CELL,
            grid_tolerance: GRID_TOLERANCE,

            objective: Vec2::new(OBJECTIVE_X, OBJECTIVE_Y),
            objective_radius: OBJECTIVE_RADIUS,
            objective_exclusion_radius: OBJECTIVE_EXCLUSION_RADIUS,

            // Middle of the left margin strip
            launch_point: Vec2::new(BOARD_MARGIN / 2.0, BOARD_HEIGHT / 2.0),
            beam_speed: BEAM_SPEED,
            angle_increment_deg: ANGLE_INCREMENT_DEG,
            refractory_ticks: REFRACTORY_TICKS,
            max_reflections: MAX_REFLECTIONS,
            escape_distance: ESCAPE_DISTANCE,

            placement_search_radius: PLACEMENT_SEARCH_RADIUS,
            extra_zones: Vec::new(),
        }
    }
}

/// Replace a value that fails `valid` with its default, logging the fix
fn fix<T: Copy + std::fmt::Debug>(
    name: &str,
    value: &mut T,
    default: T,
    valid: impl FnOnce(T) -> bool,
) -> bool {
    if valid(*value) {
        return false;
    }
    log::warn!("Invalid setting {} = {:?}, using {:?}", name, value, default);
    *value = default;
    true
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl Settings {
    /// Read settings from a JSON file and sanitize them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&json)?;
        settings.sanitize();
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{} ({}), using default settings", err, path.display());
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reset unusable values to their defaults. Returns true if anything
    /// was changed.
    pub fn sanitize(&mut self) -> bool {
        let d = Self::default();
        let mut changed = false;

        changed |= fix("board_width", &mut self.board_width, d.board_width, positive);
        changed |= fix("board_height", &mut self.board_height, d.board_height, positive);
        let min_side = self.board_width.min(self.board_height);
        changed |= fix("board_margin", &mut self.board_margin, 0.0, |m| {
            non_negative(m) && 2.0 * m < min_side
        });

        changed |= fix("grid_cell", &mut self.grid_cell, d.grid_cell, positive);
        let cell = self.grid_cell;
        changed |= fix("grid_tolerance", &mut self.grid_tolerance, d.grid_tolerance, |t| {
            non_negative(t) && t < cell / 2.0
        });

        changed |= fix("objective", &mut self.objective, d.objective, |p: Vec2| p.is_finite());
        changed |= fix(
            "objective_radius",
            &mut self.objective_radius,
            d.objective_radius,
            non_negative,
        );
        changed |= fix(
            "objective_exclusion_radius",
            &mut self.objective_exclusion_radius,
            d.objective_exclusion_radius,
            non_negative,
        );

        changed |= fix("launch_point", &mut self.launch_point, d.launch_point, |p: Vec2| p.is_finite());
        changed |= fix("beam_speed", &mut self.beam_speed, d.beam_speed, positive);
        changed |= fix(
            "angle_increment_deg",
            &mut self.angle_increment_deg,
            d.angle_increment_deg,
            |inc| steps_per_turn(inc).is_some(),
        );
        changed |= fix("escape_distance", &mut self.escape_distance, d.escape_distance, positive);
        changed |= fix(
            "placement_search_radius",
            &mut self.placement_search_radius,
            d.placement_search_radius,
            non_negative,
        );

        changed
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_cell)
    }

    /// Board rectangle, with the origin at the bottom-left corner
    pub fn board(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.board_width, self.board_height))
    }

    pub fn zones(&self) -> ZoneSet {
        let mut zones = ZoneSet::standard(
            self.board(),
            self.board_margin,
            self.objective,
            self.objective_exclusion_radius,
        );
        zones.zones.extend(self.extra_zones.iter().copied());
        zones
    }

    pub fn placement_rules(&self) -> PlacementRules {
        PlacementRules::new(
            self.grid(),
            self.zones(),
            Some(self.board()),
            self.grid_tolerance,
        )
    }
}
