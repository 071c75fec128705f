//! Beam reflection and stuck-beam escape
//!
//! Reflection is the standard mirror formula `v' = v - 2(v·n)n`, followed by
//! snapping the outgoing direction to the allowed angle increment and
//! rescaling to the fixed beam speed. Speed never changes, only direction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::inside_any;
use super::grid::{quantize_angle_steps, steps_per_turn};
use crate::{degrees_of, direction_from_degrees};

/// Mirror reflection about a unit normal
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Unit normal of edge `a→b` facing the incoming velocity (`n·v < 0`).
///
/// Returns `None` for a zero-length edge.
pub fn facing_normal(a: Vec2, b: Vec2, velocity: Vec2) -> Option<Vec2> {
    let normal = (b - a).perp().normalize_or_zero();
    if normal == Vec2::ZERO {
        return None;
    }
    if normal.dot(velocity) > 0.0 {
        Some(-normal)
    } else {
        Some(normal)
    }
}

/// Velocity pointing along the `k`-th allowed direction at the given speed
fn quantized_velocity(k: i32, increment_deg: f32, speed: f32) -> Vec2 {
    direction_from_degrees(k as f32 * increment_deg) * speed
}

/// Snap a velocity's direction to the nearest allowed angle, keeping `speed`
pub fn quantize_velocity(velocity: Vec2, increment_deg: f32, speed: f32) -> Vec2 {
    let increment = effective_increment(increment_deg);
    let k = quantize_angle_steps(degrees_of(velocity), increment);
    quantized_velocity(k, increment, speed)
}

/// Increment actually used for quantization (1° when the configured one
/// does not divide a full turn)
fn effective_increment(increment_deg: f32) -> f32 {
    if steps_per_turn(increment_deg).is_some() {
        increment_deg
    } else {
        1.0
    }
}

/// Reflect a velocity off edge `a→b` and quantize the result.
///
/// The outgoing direction must leave the surface. If rounding to the
/// nearest increment would tip it into the mirror (grazing hits), it is
/// stepped toward the normal one increment at a time. Degenerate edges
/// leave the direction unchanged apart from quantization.
pub fn reflect(a: Vec2, b: Vec2, velocity: Vec2, increment_deg: f32, speed: f32) -> Vec2 {
    let increment = effective_increment(increment_deg);
    let Some(normal) = facing_normal(a, b, velocity) else {
        return quantize_velocity(velocity, increment, speed);
    };

    let reflected = reflect_velocity(velocity, normal);
    let mut k = quantize_angle_steps(degrees_of(reflected), increment);

    if quantized_velocity(k, increment, speed).dot(normal) <= 1e-4 * speed {
        let steps = steps_per_turn(increment).unwrap_or(360);
        let normal_k = quantize_angle_steps(degrees_of(normal), increment);
        // Walk the shorter way around toward the normal direction
        let diff = (normal_k - k).rem_euclid(steps);
        let dir = if diff <= steps / 2 { 1 } else { -1 };
        for _ in 0..steps / 2 {
            if quantized_velocity(k, increment, speed).dot(normal) > 1e-4 * speed {
                break;
            }
            k = (k + dir).rem_euclid(steps);
        }
    }

    quantized_velocity(k, increment, speed)
}

/// Outcome of the escape heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Escape {
    pub position: Vec2,
    /// Number of candidate positions tried
    pub attempts: u32,
    /// False when every candidate was blocked and the beam fell back to its
    /// previous position
    pub succeeded: bool,
}

/// Move a beam that is stuck inside a mirror back into free space.
///
/// Tries, in order: backing up against the velocity, then the four axis
/// directions (+x, -x, +y, -y), each by `distance`. If all are blocked the
/// beam reverts to `previous`, the last position known to be outside every
/// mirror. At most five candidates are tried.
pub fn escape<'a, I>(
    position: Vec2,
    velocity: Vec2,
    previous: Vec2,
    distance: f32,
    polygons: I,
) -> Escape
where
    I: Iterator<Item = &'a [Vec2]> + Clone,
{
    let back = -velocity.normalize_or_zero();
    let candidates = [back, Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y];

    let mut attempts = 0;
    for dir in candidates {
        if dir == Vec2::ZERO {
            continue;
        }
        attempts += 1;
        let candidate = position + dir * distance;
        if !inside_any(candidate, polygons.clone()) {
            return Escape {
                position: candidate,
                attempts,
                succeeded: true,
            };
        }
    }

    Escape {
        position: previous,
        attempts,
        succeeded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::shape::{Rotation, ShapeDescriptor};

    fn is_multiple_of(angle: f32, increment: f32) -> bool {
        let steps = angle / increment;
        (steps - steps.round()).abs() < 1e-3
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_facing_normal_opposes_velocity() {
        let a = Vec2::new(40.0, 10.0);
        let b = Vec2::new(40.0, -10.0);
        let n = facing_normal(a, b, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(n, Vec2::new(-1.0, 0.0));
        let n = facing_normal(b, a, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(n, Vec2::new(-1.0, 0.0));
        assert!(facing_normal(a, a, Vec2::X).is_none());
    }

    #[test]
    fn test_head_on_reflection_negates_vx() {
        let v = reflect(
            Vec2::new(40.0, 10.0),
            Vec2::new(40.0, -10.0),
            Vec2::new(300.0, 0.0),
            15.0,
            300.0,
        );
        assert!((v.x + 300.0).abs() < 1e-3);
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn test_diagonal_mirror_turns_ninety_degrees() {
        // 45° edge turns a rightward beam straight down
        let v = reflect(
            Vec2::new(0.0, 0.0),
            Vec2::new(-20.0, 20.0),
            Vec2::new(300.0, 0.0),
            15.0,
            300.0,
        );
        assert!(v.x.abs() < 1e-3, "{v:?}");
        assert!((v.y.abs() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_reflection_is_quantized_and_keeps_speed() {
        let edge_a = Vec2::new(0.0, 0.0);
        let edge_b = Vec2::new(37.0, 11.0);
        for deg in (0..360).step_by(7) {
            let v = direction_from_degrees(deg as f32) * 250.0;
            let out = reflect(edge_a, edge_b, v, 15.0, 250.0);
            assert!((out.length() - 250.0).abs() < 1e-2);
            assert!(is_multiple_of(degrees_of(out), 15.0), "{deg} -> {out:?}");
        }
    }

    #[test]
    fn test_grazing_reflection_leaves_surface() {
        // Nearly parallel to a horizontal edge, coming from above
        let v = direction_from_degrees(-3.0) * 100.0;
        let out = reflect(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), v, 15.0, 100.0);
        assert!(out.y > 0.0, "{out:?}");
        assert!(is_multiple_of(degrees_of(out), 15.0));
    }

    #[test]
    fn test_degenerate_edge_keeps_direction() {
        let v = Vec2::new(0.0, 200.0);
        let out = reflect(Vec2::ONE, Vec2::ONE, v, 15.0, 200.0);
        assert!((out - v).length() < 1e-3);
    }

    #[test]
    fn test_escape_backs_up() {
        let square = ShapeDescriptor::Square { size: 20.0 }.vertices(Vec2::ZERO, Rotation::Deg0);
        let polygons = [square.as_slice()];
        let result = escape(
            Vec2::new(-9.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(-20.0, 0.0),
            2.0,
            polygons.iter().copied(),
        );
        assert!(result.succeeded);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.position, Vec2::new(-11.0, 0.0));
    }

    #[test]
    fn test_escape_tries_axis_directions() {
        // Backing up and both x moves stay inside; +y clears the top edge
        let a = ShapeDescriptor::Rectangle {
            width: 40.0,
            height: 20.0,
        }
        .vertices(Vec2::ZERO, Rotation::Deg0);
        let result = escape(
            Vec2::new(0.0, 9.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(-30.0, 0.0),
            2.0,
            [a.as_slice()].into_iter(),
        );
        assert!(result.succeeded);
        assert_eq!(result.attempts, 4);
        assert_eq!(result.position, Vec2::new(0.0, 11.0));
    }

    #[test]
    fn test_escape_falls_back_to_previous() {
        let big = ShapeDescriptor::Square { size: 100.0 }.vertices(Vec2::ZERO, Rotation::Deg0);
        let result = escape(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            Vec2::new(-80.0, 0.0),
            2.0,
            [big.as_slice()].into_iter(),
        );
        assert!(!result.succeeded);
        assert_eq!(result.attempts, 5);
        assert_eq!(result.position, Vec2::new(-80.0, 0.0));
    }
}
