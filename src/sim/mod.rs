//! Deterministic simulation module
//!
//! All placement and beam logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod grid;
pub mod layout;
pub mod overlap;
pub mod placement;
pub mod polygon;
pub mod reflection;
pub mod shape;
pub mod state;
pub mod tick;
pub mod zones;

pub use collision::{Impact, Sweep, sweep, swept_collision};
pub use grid::{Grid, quantize_angle};
pub use layout::{LayoutError, generate_layout};
pub use overlap::overlap;
pub use placement::{PlacementRules, RejectReason};
pub use polygon::Aabb;
pub use reflection::{Escape, escape, reflect};
pub use shape::{Mirror, MirrorId, Rotation, ShapeDescriptor};
pub use state::{Beam, BeamId, BeamPhase, RemovalReason, SimEvent, SimState};
pub use tick::{StepReport, step_beam, tick};
pub use zones::{ExclusionZone, ZoneSet};
