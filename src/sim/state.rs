//! Simulation state: live mirrors, beams and outcome events
//!
//! Mirrors change only through the methods here, which all take `&mut self`
//! and therefore can never run while a tick is borrowing the mirror set.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::quantize_angle;
use super::placement::{PlacementRules, RejectReason};
use super::shape::{Mirror, MirrorId, Rotation, ShapeDescriptor};
use crate::direction_from_degrees;
use crate::settings::Settings;

/// Stable identifier of a beam
pub type BeamId = u32;

/// Why a beam left the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Left the board
    OutOfBounds,
    /// Bounced more than the configured maximum
    ReflectionCap,
    /// Hit the objective (reported upward for scoring)
    ObjectiveReached,
    /// Stuck inside a mirror and every escape attempt failed
    EscapeFailed,
}

/// Per-tick beam phase
///
/// Every tick starts in `Flying`; the transient phases record what happened
/// during the tick and settle back to `Flying` unless the beam was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamPhase {
    #[default]
    Flying,
    /// Wall contact (axis velocity negation)
    Bounced,
    /// Mirror contact (vector reflection + quantization)
    Reflecting,
    /// Stuck inside a mirror, running the escape heuristic
    Escaping,
    Removed(RemovalReason),
}

impl BeamPhase {
    pub fn is_removed(&self) -> bool {
        matches!(self, BeamPhase::Removed(_))
    }
}

/// A beam entity (constant-speed point particle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub id: BeamId,
    pub pos: Vec2,
    /// Position at the start of the last tick (swept collision)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    /// Fixed speed; reflections only change direction
    pub speed: f32,
    pub reflections: u32,
    /// Ticks left during which `last_hit` is ignored
    pub refractory: u32,
    pub last_hit: Option<MirrorId>,
    pub phase: BeamPhase,
    /// Escape heuristic invocations (anomaly counter)
    #[serde(default)]
    pub escapes: u32,
    /// Last end-of-tick position outside every mirror (escape fallback)
    #[serde(default)]
    pub last_clear: Option<Vec2>,
}

impl Beam {
    /// Spawn a beam at `origin` heading along `angle_deg`, snapped to the
    /// allowed angle increment
    pub fn launch(id: BeamId, origin: Vec2, angle_deg: f32, speed: f32, increment_deg: f32) -> Self {
        let angle = quantize_angle(angle_deg, increment_deg);
        Self {
            id,
            pos: origin,
            prev_pos: origin,
            vel: direction_from_degrees(angle) * speed,
            speed,
            reflections: 0,
            refractory: 0,
            last_hit: None,
            phase: BeamPhase::Flying,
            escapes: 0,
            last_clear: None,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.phase.is_removed()
    }

    /// Whether collisions with `mirror` are currently suppressed
    pub fn ignores(&self, mirror: MirrorId) -> bool {
        self.refractory > 0 && self.last_hit == Some(mirror)
    }

    pub fn remove(&mut self, reason: RemovalReason) {
        self.phase = BeamPhase::Removed(reason);
    }
}

/// Outcome events consumed by presentation/scoring layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    ObjectiveReached { beam: BeamId },
    BeamRemoved { beam: BeamId, reason: RemovalReason },
    BeamReflected { beam: BeamId, mirror: MirrorId, point: Vec2 },
    BeamBounced { beam: BeamId, point: Vec2 },
    /// A stuck beam was moved by the escape heuristic (anomaly)
    BeamEscaped { beam: BeamId, attempts: u32, succeeded: bool },
    PlacementRejected { mirror: MirrorId, reason: RejectReason },
}

/// Complete simulation state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimState {
    /// Live mirrors (sorted by id for determinism)
    pub mirrors: Vec<Mirror>,
    /// Active beams (sorted by id for determinism)
    pub beams: Vec<Beam>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<SimEvent>,
    /// Total escape-heuristic invocations (anomaly telemetry)
    pub escape_anomalies: u64,
    next_id: u32,
}

impl SimState {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        // Default-constructed states start at zero
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn mirror(&self, id: MirrorId) -> Option<&Mirror> {
        self.mirrors.iter().find(|m| m.id == id)
    }

    /// Validate and insert a new mirror, returning its id.
    ///
    /// Rejections are also recorded as `PlacementRejected` events.
    pub fn place_mirror(
        &mut self,
        rules: &PlacementRules,
        shape: ShapeDescriptor,
        center: Vec2,
        rotation: Rotation,
    ) -> Result<MirrorId, RejectReason> {
        let id = self.next_entity_id();
        let mirror = Mirror::new(id, shape, center, rotation);
        self.insert_mirror(rules, mirror)
    }

    /// Validate and insert an already-built mirror (e.g. from a layout)
    pub fn insert_mirror(
        &mut self,
        rules: &PlacementRules,
        mut mirror: Mirror,
    ) -> Result<MirrorId, RejectReason> {
        // Ids at the top of the range cannot advance the allocator
        if mirror.id == 0 || mirror.id == u32::MAX || self.mirror(mirror.id).is_some() {
            mirror.id = self.next_entity_id();
        }
        self.next_id = self.next_id.max(mirror.id.saturating_add(1));

        if let Err(reason) = rules.validate(&mirror, &self.mirrors) {
            self.reject(mirror.id, reason);
            return Err(reason);
        }

        let id = mirror.id;
        self.mirrors.push(mirror);
        self.normalize_order();
        Ok(id)
    }

    /// Complete a drag: move a mirror to a new center if still valid there
    pub fn move_mirror(
        &mut self,
        rules: &PlacementRules,
        id: MirrorId,
        center: Vec2,
    ) -> Result<(), RejectReason> {
        self.update_mirror(rules, id, |m| m.set_center(center))
    }

    /// Rotate a mirror in place if the rotated footprint is still valid
    pub fn rotate_mirror(
        &mut self,
        rules: &PlacementRules,
        id: MirrorId,
        rotation: Rotation,
    ) -> Result<(), RejectReason> {
        self.update_mirror(rules, id, |m| m.set_rotation(rotation))
    }

    fn update_mirror(
        &mut self,
        rules: &PlacementRules,
        id: MirrorId,
        edit: impl FnOnce(&mut Mirror),
    ) -> Result<(), RejectReason> {
        let Some(index) = self.mirrors.iter().position(|m| m.id == id) else {
            log::warn!("Update requested for unknown mirror {}", id);
            return Err(RejectReason::UnknownMirror);
        };

        let mut candidate = self.mirrors[index].clone();
        edit(&mut candidate);
        if let Err(reason) = rules.validate(&candidate, &self.mirrors) {
            self.reject(id, reason);
            return Err(reason);
        }
        self.mirrors[index] = candidate;
        Ok(())
    }

    pub fn remove_mirror(&mut self, id: MirrorId) -> Option<Mirror> {
        let index = self.mirrors.iter().position(|m| m.id == id)?;
        Some(self.mirrors.remove(index))
    }

    /// Spawn a beam from the launch point configured in `settings`
    pub fn launch_beam(&mut self, settings: &Settings, angle_deg: f32) -> BeamId {
        self.launch_beam_from(settings, settings.launch_point, angle_deg)
    }

    pub fn launch_beam_from(&mut self, settings: &Settings, origin: Vec2, angle_deg: f32) -> BeamId {
        let id = self.next_entity_id();
        self.beams.push(Beam::launch(
            id,
            origin,
            angle_deg,
            settings.beam_speed,
            settings.angle_increment_deg,
        ));
        id
    }

    /// Clear every mirror and beam
    pub fn reset(&mut self) {
        self.mirrors.clear();
        self.beams.clear();
        self.events.clear();
        self.time_ticks = 0;
        self.escape_anomalies = 0;
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.mirrors.sort_by_key(|m| m.id);
        self.beams.sort_by_key(|b| b.id);
    }

    fn reject(&mut self, mirror: MirrorId, reason: RejectReason) {
        log::debug!("Placement of mirror {} rejected: {}", mirror, reason);
        self.events
            .push(SimEvent::PlacementRejected { mirror, reason });
    }
}
