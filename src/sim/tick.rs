//! Fixed timestep beam stepping
//!
//! Advances every beam once per tick against the current mirror set.
//! Mirrors are borrowed immutably for the whole tick, so placement changes
//! can only happen between ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Impact, Sweep, inside_any, sweep};
use super::polygon::{self, closest_point_on_segment};
use super::reflection::{escape, reflect};
use super::shape::Mirror;
use super::state::{Beam, BeamPhase, RemovalReason, SimEvent, SimState};
use crate::settings::{BoundaryMode, Settings};

/// Result of stepping one beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub phase: BeamPhase,
    pub events: Vec<SimEvent>,
}

/// True if the segment `a → b` comes within `radius` of `center`
fn segment_reaches_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    radius > 0.0 && closest_point_on_segment(center, a, b).distance_squared(center) <= radius * radius
}

/// True if `velocity` points into the polygon across edge `edge`
fn moving_into(vertices: &[Vec2], edge: usize, velocity: Vec2) -> bool {
    let Some((a, b)) = polygon::edges(vertices).nth(edge) else {
        return false;
    };
    let orientation = polygon::signed_area(vertices).signum();
    let d = b - a;
    let outward = Vec2::new(d.y, -d.x) * orientation;
    velocity.dot(outward) < 0.0
}

/// Earliest hit among mirrors the beam is not ignoring, plus whether the
/// beam is stuck inside any mirror
fn detect<'m>(beam: &Beam, from: Vec2, to: Vec2, mirrors: &'m [Mirror]) -> (Option<(Impact, &'m Mirror)>, bool) {
    let mut earliest: Option<(Impact, &Mirror)> = None;
    let mut stuck = false;

    for mirror in mirrors {
        match sweep(from, to, mirror.vertices()) {
            Sweep::Stuck => stuck = true,
            Sweep::Hit(impact) => {
                if beam.ignores(mirror.id) || !moving_into(mirror.vertices(), impact.edge, beam.vel) {
                    continue;
                }
                // Ties keep the lower id (mirrors are id-sorted)
                if earliest.is_none_or(|(best, _)| impact.t < best.t) {
                    earliest = Some((impact, mirror));
                }
            }
            Sweep::Miss => {}
        }
    }

    (earliest, stuck)
}

/// Wall contact: clamp to the board and reflect off the crossed edge(s)
fn bounce_off_walls(beam: &mut Beam, settings: &Settings) -> bool {
    let board = settings.board();
    let corners = [
        board.min,
        Vec2::new(board.max.x, board.min.y),
        board.max,
        Vec2::new(board.min.x, board.max.y),
    ];
    let mut bounced = false;
    let inc = settings.angle_increment_deg;

    if beam.pos.x < board.min.x || beam.pos.x > board.max.x {
        let (a, b) = if beam.pos.x < board.min.x {
            (corners[3], corners[0])
        } else {
            (corners[1], corners[2])
        };
        beam.pos.x = beam.pos.x.clamp(board.min.x, board.max.x);
        beam.vel = reflect(a, b, beam.vel, inc, beam.speed);
        bounced = true;
    }
    if beam.pos.y < board.min.y || beam.pos.y > board.max.y {
        let (a, b) = if beam.pos.y < board.min.y {
            (corners[0], corners[1])
        } else {
            (corners[2], corners[3])
        };
        beam.pos.y = beam.pos.y.clamp(board.min.y, board.max.y);
        beam.vel = reflect(a, b, beam.vel, inc, beam.speed);
        bounced = true;
    }

    bounced
}

/// Step a single beam by `dt` against the mirror set.
///
/// Order within the tick: refractory countdown, swept mirror detection,
/// objective test on the travelled path, reflect or escape, wall handling,
/// reflection cap. A beam that strikes a mirror stops at the impact point
/// for the rest of the tick.
pub fn step_beam(beam: &mut Beam, mirrors: &[Mirror], settings: &Settings, dt: f32) -> StepReport {
    let mut events = Vec::new();

    if beam.is_removed() || !dt.is_finite() || dt <= 0.0 {
        return StepReport {
            phase: beam.phase,
            events,
        };
    }

    beam.phase = BeamPhase::Flying;

    // Refractory counts the tick of the hit, so the mirror is skipped for
    // `refractory_ticks - 1` further ticks
    if beam.refractory > 0 {
        beam.refractory -= 1;
        if beam.refractory == 0 {
            beam.last_hit = None;
        }
    }

    let start = beam.pos;
    let next = start + beam.vel * dt;
    beam.prev_pos = start;

    let (hit, stuck) = detect(beam, start, next, mirrors);
    let travelled_to = hit.map_or(next, |(impact, _)| impact.point);

    if segment_reaches_circle(start, travelled_to, settings.objective, settings.objective_radius) {
        log::info!("Beam {} reached the objective", beam.id);
        beam.pos = travelled_to;
        beam.remove(RemovalReason::ObjectiveReached);
        events.push(SimEvent::ObjectiveReached { beam: beam.id });
        events.push(SimEvent::BeamRemoved {
            beam: beam.id,
            reason: RemovalReason::ObjectiveReached,
        });
        return StepReport {
            phase: beam.phase,
            events,
        };
    }

    if let Some((impact, mirror)) = hit {
        let vertices = mirror.vertices();
        let a = vertices[impact.edge];
        let b = vertices[(impact.edge + 1) % vertices.len()];
        beam.vel = reflect(a, b, beam.vel, settings.angle_increment_deg, beam.speed);
        beam.pos = impact.point;
        beam.reflections += 1;
        beam.last_hit = Some(mirror.id);
        beam.refractory = settings.refractory_ticks;
        beam.phase = BeamPhase::Reflecting;
        log::debug!(
            "Beam {} reflected off mirror {} edge {} at ({:.2}, {:.2})",
            beam.id,
            mirror.id,
            impact.edge,
            impact.point.x,
            impact.point.y
        );
        events.push(SimEvent::BeamReflected {
            beam: beam.id,
            mirror: mirror.id,
            point: impact.point,
        });
    } else if stuck {
        beam.phase = BeamPhase::Escaping;
        beam.escapes += 1;
        let result = escape(
            next,
            beam.vel,
            beam.last_clear.unwrap_or(start),
            settings.escape_distance,
            mirrors.iter().map(|m| m.vertices()),
        );
        log::warn!(
            "Beam {} stuck inside a mirror at ({:.2}, {:.2}); escape {} after {} attempts",
            beam.id,
            next.x,
            next.y,
            if result.succeeded { "succeeded" } else { "failed" },
            result.attempts
        );
        events.push(SimEvent::BeamEscaped {
            beam: beam.id,
            attempts: result.attempts,
            succeeded: result.succeeded,
        });
        beam.pos = result.position;

        if !result.succeeded && inside_any(beam.pos, mirrors.iter().map(|m| m.vertices())) {
            beam.remove(RemovalReason::EscapeFailed);
        }
    } else {
        beam.pos = next;
    }

    if !beam.is_removed() && !settings.board().contains(beam.pos) {
        match settings.boundary_mode {
            BoundaryMode::Remove => beam.remove(RemovalReason::OutOfBounds),
            BoundaryMode::Bounce => {
                if bounce_off_walls(beam, settings) {
                    beam.reflections += 1;
                    beam.phase = BeamPhase::Bounced;
                    events.push(SimEvent::BeamBounced {
                        beam: beam.id,
                        point: beam.pos,
                    });
                }
            }
        }
    }

    if !beam.is_removed() && beam.reflections > settings.max_reflections {
        log::debug!("Beam {} exceeded {} reflections", beam.id, settings.max_reflections);
        beam.remove(RemovalReason::ReflectionCap);
    }

    if !beam.is_removed() && !inside_any(beam.pos, mirrors.iter().map(|m| m.vertices())) {
        beam.last_clear = Some(beam.pos);
    }

    if let BeamPhase::Removed(reason) = beam.phase {
        events.push(SimEvent::BeamRemoved {
            beam: beam.id,
            reason,
        });
    }

    StepReport {
        phase: beam.phase,
        events,
    }
}

/// Advance the simulation by one fixed timestep.
///
/// Every live beam is stepped once in id order, then removed beams are
/// dropped. Returns the events of this tick (also appended to
/// `state.events`).
pub fn tick(state: &mut SimState, settings: &Settings, dt: f32) -> Vec<SimEvent> {
    state.time_ticks += 1;
    state.normalize_order();

    let mirrors = &state.mirrors;
    let mut events = Vec::new();
    for beam in state.beams.iter_mut() {
        let report = step_beam(beam, mirrors, settings, dt);
        if report.phase == BeamPhase::Escaping {
            state.escape_anomalies += 1;
        }
        events.extend(report.events);
    }

    state.beams.retain(|b| !b.is_removed());
    state.events.extend(events.iter().copied());
    events
}
