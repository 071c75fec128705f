//! Property tests for the geometric invariants

use glam::Vec2;
use proptest::prelude::*;

use laser_grid::consts::SIM_DT;
use laser_grid::sim::{
    Beam, Grid, Mirror, PlacementRules, Rotation, ShapeDescriptor, overlap, quantize_angle,
    reflect, step_beam, sweep, Sweep,
};
use laser_grid::{Settings, degrees_of, direction_from_degrees};

fn rotation() -> impl Strategy<Value = Rotation> {
    prop::sample::select(Rotation::ALL.to_vec())
}

/// Grid-compatible shapes with sizes given in whole cells
fn shape(cell: f32) -> impl Strategy<Value = ShapeDescriptor> {
    (1..5u32, 1..5u32, 0..6u32).prop_map(move |(w, h, kind)| {
        let (w, h) = (w as f32 * cell, h as f32 * cell);
        match kind {
            0 => ShapeDescriptor::Square { size: w },
            1 => ShapeDescriptor::Rectangle {
                width: w,
                height: h,
            },
            2 => ShapeDescriptor::RightTriangle {
                width: w,
                height: h,
            },
            3 => ShapeDescriptor::IsoscelesTriangle {
                width: 2.0 * w,
                height: h,
            },
            4 => ShapeDescriptor::Trapezoid {
                width: w + 2.0 * cell,
                height: h,
                top_width: w,
            },
            _ => ShapeDescriptor::Parallelogram {
                width: w,
                height: h,
                skew: cell,
            },
        }
    })
}

fn mirror(cell: f32) -> impl Strategy<Value = Mirror> {
    (shape(cell), rotation(), 0.0f32..800.0, 0.0f32..600.0)
        .prop_map(|(shape, rotation, x, y)| Mirror::new(1, shape, Vec2::new(x, y), rotation))
}

fn is_multiple_of(angle: f32, increment: f32) -> bool {
    let steps = angle / increment;
    (steps - steps.round()).abs() < 1e-3
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in mirror(20.0), b in mirror(20.0)) {
        prop_assert_eq!(overlap(a.vertices(), b.vertices()), overlap(b.vertices(), a.vertices()));
    }

    #[test]
    fn mirror_overlaps_itself(a in mirror(20.0)) {
        prop_assert!(overlap(a.vertices(), a.vertices()));
    }

    #[test]
    fn aligned_mirrors_have_on_grid_vertices(a in mirror(20.0)) {
        let grid = Grid::new(20.0);
        let aligned = a.aligned_to(&grid);
        for v in aligned.vertices() {
            prop_assert!(grid.point_on_grid(*v, 0.01), "{:?}", v);
        }
    }

    #[test]
    fn accepted_placements_are_on_grid_and_clear(
        a in mirror(20.0),
        b in mirror(20.0),
    ) {
        let settings = Settings::default();
        let rules: PlacementRules = settings.placement_rules();
        let a = a.aligned_to(&rules.grid);
        let mut b = b.aligned_to(&rules.grid);
        b.id = 2;
        prop_assume!(rules.is_valid(&a, std::slice::from_ref(&b)));

        let board = settings.board();
        for v in a.vertices() {
            prop_assert!(rules.grid.point_on_grid(*v, rules.grid_tolerance));
            prop_assert!(!rules.zones.point_in_zone(*v));
            prop_assert!(board.contains(*v), "{:?}", v);
        }
        prop_assert!(!overlap(a.vertices(), b.vertices()));
    }

    #[test]
    fn nearest_valid_position_is_valid(a in mirror(20.0)) {
        let settings = Settings::default();
        let rules = settings.placement_rules();
        if let Some(center) = rules.find_nearest_valid_position(&a, &[], 120.0) {
            prop_assert!(rules.is_valid(&a.with_center(center), &[]));
            prop_assert!(center.distance(a.center()) <= 120.0);
        }
    }

    #[test]
    fn reflection_keeps_speed_and_quantizes(
        angle in 0.0f32..360.0,
        edge_angle in 0.0f32..360.0,
        speed in 10.0f32..1000.0,
    ) {
        let a = Vec2::new(100.0, 100.0);
        let b = a + direction_from_degrees(edge_angle) * 40.0;
        let out = reflect(a, b, direction_from_degrees(angle) * speed, 15.0, speed);
        prop_assert!((out.length() - speed).abs() < speed * 1e-4);
        prop_assert!(is_multiple_of(degrees_of(out), 15.0));
    }

    #[test]
    fn quantized_angles_are_multiples(angle in -720.0f32..720.0, inc in prop::sample::select(vec![1.0f32, 5.0, 15.0, 30.0, 45.0, 90.0])) {
        let q = quantize_angle(angle, inc);
        prop_assert!((0.0..360.0).contains(&q));
        prop_assert!(is_multiple_of(q, inc));
    }

    #[test]
    fn beam_never_ends_inside_a_mirror(
        target in mirror(20.0),
        angle in 0.0f32..360.0,
        ticks in 1usize..200,
    ) {
        let settings = Settings::default();
        let rules = settings.placement_rules();
        let target = target.aligned_to(&rules.grid);
        prop_assume!(rules.is_valid(&target, &[]));

        let mut beam = Beam::launch(1, settings.launch_point, angle, settings.beam_speed, settings.angle_increment_deg);
        let mirrors = [target];
        for _ in 0..ticks {
            step_beam(&mut beam, &mirrors, &settings, SIM_DT);
            if beam.is_removed() {
                break;
            }
            prop_assert!((beam.vel.length() - settings.beam_speed).abs() < 1e-2);
            prop_assert_ne!(sweep(beam.pos, beam.pos, mirrors[0].vertices()), Sweep::Stuck);
        }
    }
}
