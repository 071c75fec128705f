//! Mirror shapes and vertex generation
//!
//! A mirror is described by a shape descriptor, a center and a quarter-turn
//! rotation. Its vertex list is derived from those parameters and is the
//! only geometry the rest of the engine looks at, so every setter recomputes
//! it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::polygon::{self, Aabb};

/// Stable identifier of a live mirror
pub type MirrorId = u32;

/// Quarter-turn rotation applied about the mirror center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Parse a rotation given in degrees; only multiples of 90 are accepted
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Next quarter turn (used when cycling rotations)
    pub fn next(&self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Rotate a local offset counter-clockwise. Exact: only swaps and negations.
    #[inline]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        match self {
            Rotation::Deg0 => v,
            Rotation::Deg90 => Vec2::new(-v.y, v.x),
            Rotation::Deg180 => Vec2::new(-v.x, -v.y),
            Rotation::Deg270 => Vec2::new(v.y, -v.x),
        }
    }
}

/// Shape and size parameters of a mirror
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDescriptor {
    Square {
        size: f32,
    },
    Rectangle {
        width: f32,
        height: f32,
    },
    /// Right angle at the bottom-left corner before rotation
    RightTriangle {
        width: f32,
        height: f32,
    },
    /// Base along the bottom, apex centered at the top
    IsoscelesTriangle {
        width: f32,
        height: f32,
    },
    /// `width` is the bottom edge, `top_width` the parallel top edge
    Trapezoid {
        width: f32,
        height: f32,
        top_width: f32,
    },
    /// Bottom and top edges of `width`, top shifted right by `skew`
    Parallelogram {
        width: f32,
        height: f32,
        skew: f32,
    },
}

impl ShapeDescriptor {
    /// Short human-readable name (for logs)
    pub fn name(&self) -> &'static str {
        match self {
            ShapeDescriptor::Square { .. } => "square",
            ShapeDescriptor::Rectangle { .. } => "rectangle",
            ShapeDescriptor::RightTriangle { .. } => "right_triangle",
            ShapeDescriptor::IsoscelesTriangle { .. } => "isosceles_triangle",
            ShapeDescriptor::Trapezoid { .. } => "trapezoid",
            ShapeDescriptor::Parallelogram { .. } => "parallelogram",
        }
    }

    /// Sizes that cannot produce a convex polygon with positive area
    pub fn is_degenerate(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            ShapeDescriptor::Square { size } => !positive(size),
            ShapeDescriptor::Rectangle { width, height }
            | ShapeDescriptor::RightTriangle { width, height }
            | ShapeDescriptor::IsoscelesTriangle { width, height } => {
                !positive(width) || !positive(height)
            }
            ShapeDescriptor::Trapezoid {
                width,
                height,
                top_width,
            } => !positive(width) || !positive(height) || !positive(top_width),
            ShapeDescriptor::Parallelogram {
                width,
                height,
                skew,
            } => !positive(width) || !positive(height) || !skew.is_finite(),
        }
    }

    /// Vertices relative to the center, counter-clockwise, before rotation
    pub fn local_vertices(&self) -> Vec<Vec2> {
        match *self {
            ShapeDescriptor::Square { size } => box_vertices(size, size),
            ShapeDescriptor::Rectangle { width, height } => box_vertices(width, height),
            ShapeDescriptor::RightTriangle { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(-hw, hh),
                ]
            }
            ShapeDescriptor::IsoscelesTriangle { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                vec![Vec2::new(-hw, -hh), Vec2::new(hw, -hh), Vec2::new(0.0, hh)]
            }
            ShapeDescriptor::Trapezoid {
                width,
                height,
                top_width,
            } => {
                let (hw, hh, ht) = (width / 2.0, height / 2.0, top_width / 2.0);
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(ht, hh),
                    Vec2::new(-ht, hh),
                ]
            }
            ShapeDescriptor::Parallelogram {
                width,
                height,
                skew,
            } => {
                let (hw, hh, hs) = (width / 2.0, height / 2.0, skew / 2.0);
                vec![
                    Vec2::new(-hw - hs, -hh),
                    Vec2::new(hw - hs, -hh),
                    Vec2::new(hw + hs, hh),
                    Vec2::new(-hw + hs, hh),
                ]
            }
        }
    }

    /// World-space vertices for a placement
    pub fn vertices(&self, center: Vec2, rotation: Rotation) -> Vec<Vec2> {
        self.local_vertices()
            .into_iter()
            .map(|v| center + rotation.apply(v))
            .collect()
    }
}

fn box_vertices(width: f32, height: f32) -> Vec<Vec2> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(hw, hh),
        Vec2::new(-hw, hh),
    ]
}

/// A mirror entity (convex polygon obstacle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MirrorParams", into = "MirrorParams")]
pub struct Mirror {
    pub id: MirrorId,
    shape: ShapeDescriptor,
    center: Vec2,
    rotation: Rotation,
    /// Derived from the fields above, never written directly
    vertices: Vec<Vec2>,
}

/// Serialized form of a mirror: parameters only, vertices are re-derived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorParams {
    #[serde(default)]
    pub id: MirrorId,
    pub shape: ShapeDescriptor,
    pub center: Vec2,
    #[serde(default)]
    pub rotation: Rotation,
}

impl From<MirrorParams> for Mirror {
    fn from(params: MirrorParams) -> Self {
        Mirror::new(params.id, params.shape, params.center, params.rotation)
    }
}

impl From<Mirror> for MirrorParams {
    fn from(mirror: Mirror) -> Self {
        Self {
            id: mirror.id,
            shape: mirror.shape,
            center: mirror.center,
            rotation: mirror.rotation,
        }
    }
}

impl Mirror {
    pub fn new(id: MirrorId, shape: ShapeDescriptor, center: Vec2, rotation: Rotation) -> Self {
        let vertices = shape.vertices(center, rotation);
        Self {
            id,
            shape,
            center,
            rotation,
            vertices,
        }
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Ordered world-space vertices (counter-clockwise)
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
        self.refresh();
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.refresh();
    }

    pub fn set_shape(&mut self, shape: ShapeDescriptor) {
        self.shape = shape;
        self.refresh();
    }

    /// Same mirror moved to a new center
    pub fn with_center(&self, center: Vec2) -> Self {
        let mut moved = self.clone();
        moved.set_center(center);
        moved
    }

    /// Shift the center so the first vertex lands on a grid intersection.
    ///
    /// With grid-multiple sizes this puts every vertex on the grid.
    pub fn aligned_to(&self, grid: &Grid) -> Self {
        match self.vertices.first() {
            Some(&first) => {
                let delta = grid.snap_point(first) - first;
                self.with_center(self.center + delta)
            }
            None => self.clone(),
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Zero-area or badly sized mirror
    pub fn is_degenerate(&self) -> bool {
        self.shape.is_degenerate() || polygon::is_degenerate(&self.vertices)
    }

    fn refresh(&mut self) {
        self.vertices = self.shape.vertices(self.center, self.rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::polygon::signed_area;

    fn all_shapes() -> Vec<ShapeDescriptor> {
        vec![
            ShapeDescriptor::Square { size: 40.0 },
            ShapeDescriptor::Rectangle {
                width: 60.0,
                height: 20.0,
            },
            ShapeDescriptor::RightTriangle {
                width: 40.0,
                height: 40.0,
            },
            ShapeDescriptor::IsoscelesTriangle {
                width: 40.0,
                height: 40.0,
            },
            ShapeDescriptor::Trapezoid {
                width: 80.0,
                height: 40.0,
                top_width: 40.0,
            },
            ShapeDescriptor::Parallelogram {
                width: 40.0,
                height: 40.0,
                skew: 40.0,
            },
        ]
    }

    /// Every edge turns left: convex with counter-clockwise winding
    fn is_convex_ccw(vertices: &[Vec2]) -> bool {
        let n = vertices.len();
        (0..n).all(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            (b - a).perp_dot(c - b) > 0.0
        })
    }

    #[test]
    fn test_vertex_counts() {
        let counts: Vec<usize> = all_shapes()
            .iter()
            .map(|s| s.local_vertices().len())
            .collect();
        assert_eq!(counts, vec![4, 4, 3, 3, 4, 4]);
    }

    #[test]
    fn test_all_shapes_convex_ccw_in_every_rotation() {
        for shape in all_shapes() {
            for rotation in Rotation::ALL {
                let verts = shape.vertices(Vec2::new(100.0, 100.0), rotation);
                assert!(is_convex_ccw(&verts), "{} at {:?}", shape.name(), rotation);
                assert!(signed_area(&verts) > 0.0);
            }
        }
    }

    #[test]
    fn test_square_vertices() {
        let mirror = Mirror::new(
            1,
            ShapeDescriptor::Square { size: 20.0 },
            Vec2::new(50.0, 0.0),
            Rotation::Deg0,
        );
        assert_eq!(
            mirror.vertices(),
            &[
                Vec2::new(40.0, -10.0),
                Vec2::new(60.0, -10.0),
                Vec2::new(60.0, 10.0),
                Vec2::new(40.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_rotation_about_center() {
        let shape = ShapeDescriptor::RightTriangle {
            width: 40.0,
            height: 20.0,
        };
        let center = Vec2::new(100.0, 60.0);
        let verts = shape.vertices(center, Rotation::Deg90);
        // (-20,-10) rotated 90° CCW -> (10,-20)
        assert_eq!(verts[0], Vec2::new(110.0, 40.0));
        // Centroid of the bounding box stays at the center
        let bounds = Aabb::from_points(&verts).unwrap();
        assert_eq!((bounds.min + bounds.max) / 2.0, center);
    }

    #[test]
    fn test_setters_recompute_vertices() {
        let mut mirror = Mirror::new(
            7,
            ShapeDescriptor::Rectangle {
                width: 40.0,
                height: 20.0,
            },
            Vec2::ZERO,
            Rotation::Deg0,
        );
        mirror.set_rotation(Rotation::Deg90);
        let bounds = mirror.bounds().unwrap();
        assert_eq!(bounds.width(), 20.0);
        assert_eq!(bounds.height(), 40.0);

        mirror.set_center(Vec2::new(100.0, 0.0));
        assert!(mirror.vertices().iter().all(|v| v.x >= 90.0 && v.x <= 110.0));

        mirror.set_shape(ShapeDescriptor::Square { size: 60.0 });
        assert_eq!(mirror.bounds().unwrap().width(), 60.0);
    }

    #[test]
    fn test_aligned_to_grid() {
        let grid = Grid::new(20.0);
        let mirror = Mirror::new(
            1,
            ShapeDescriptor::Square { size: 20.0 },
            Vec2::new(103.0, 47.0),
            Rotation::Deg0,
        );
        let aligned = mirror.aligned_to(&grid);
        assert!(aligned.vertices().iter().all(|v| grid.point_on_grid(*v, 0.01)));
        assert_eq!(aligned.center(), Vec2::new(110.0, 50.0));
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(ShapeDescriptor::Square { size: 0.0 }.is_degenerate());
        assert!(
            ShapeDescriptor::Trapezoid {
                width: 40.0,
                height: 20.0,
                top_width: -1.0
            }
            .is_degenerate()
        );
        assert!(
            ShapeDescriptor::Rectangle {
                width: f32::NAN,
                height: 20.0
            }
            .is_degenerate()
        );
        assert!(!ShapeDescriptor::Square { size: 20.0 }.is_degenerate());
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg270.next(), Rotation::Deg0);
    }

    #[test]
    fn test_serde_rederives_vertices() {
        let mirror = Mirror::new(
            3,
            ShapeDescriptor::Parallelogram {
                width: 40.0,
                height: 20.0,
                skew: 20.0,
            },
            Vec2::new(200.0, 100.0),
            Rotation::Deg180,
        );
        let json = serde_json::to_string(&mirror).unwrap();
        assert!(json.contains("\"type\":\"parallelogram\""));
        let back: Mirror = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mirror);
    }
}
