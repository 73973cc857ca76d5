pub mod chain;
pub mod circle;
pub mod edge;
pub mod polygon;

pub use chain::Chain;
pub use circle::Circle;
pub use edge::Edge;
pub use polygon::Polygon;

use crate::collision::{RayCastInput, RayCastOutput, AABB};
use crate::math::{Transform, Vec2};

/// Mass properties of a shape. `inertia` is about the local origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassData {
    pub mass: f64,
    pub center: Vec2,
    pub inertia: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Edge,
    Polygon,
    Chain,
}

/// Collision geometry attached to a body through a fixture.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Edge(Edge),
    Polygon(Polygon),
    Chain(Chain),
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Edge(_) => ShapeType::Edge,
            Shape::Polygon(_) => ShapeType::Polygon,
            Shape::Chain(_) => ShapeType::Chain,
        }
    }

    /// Rounding radius. Collision treats the shape as its core inflated by this.
    pub fn radius(&self) -> f64 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Edge(e) => e.radius,
            Shape::Polygon(p) => p.radius,
            Shape::Chain(c) => c.radius,
        }
    }

    /// Number of child primitives. Only chains have more than one.
    pub fn child_count(&self) -> usize {
        match self {
            Shape::Chain(c) => c.child_count(),
            _ => 1,
        }
    }

    /// Point containment in world space. Edges and chains contain nothing.
    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        match self {
            Shape::Circle(c) => c.test_point(xf, p),
            Shape::Polygon(poly) => poly.test_point(xf, p),
            Shape::Edge(_) | Shape::Chain(_) => false,
        }
    }

    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform, child_index: usize) -> Option<RayCastOutput> {
        match self {
            Shape::Circle(c) => c.ray_cast(input, xf),
            Shape::Edge(e) => e.ray_cast(input, xf),
            Shape::Polygon(p) => p.ray_cast(input, xf),
            Shape::Chain(c) => c.ray_cast(input, xf, child_index),
        }
    }

    /// Bounding box of one child, inflated by the rounding radius.
    pub fn compute_aabb(&self, xf: &Transform, child_index: usize) -> AABB {
        match self {
            Shape::Circle(c) => c.compute_aabb(xf),
            Shape::Edge(e) => e.compute_aabb(xf),
            Shape::Polygon(p) => p.compute_aabb(xf),
            Shape::Chain(c) => c.compute_aabb(xf, child_index),
        }
    }

    pub fn compute_mass(&self, density: f64) -> MassData {
        match self {
            Shape::Circle(c) => c.compute_mass(density),
            Shape::Edge(e) => e.compute_mass(density),
            Shape::Polygon(p) => p.compute_mass(density),
            Shape::Chain(c) => c.compute_mass(density),
        }
    }

    /// Distance from the shape to a world point and the direction away from the shape.
    pub fn compute_distance(&self, xf: &Transform, p: Vec2, child_index: usize) -> (f64, Vec2) {
        match self {
            Shape::Circle(c) => c.compute_distance(xf, p),
            Shape::Edge(e) => e.compute_distance(xf, p),
            Shape::Polygon(poly) => poly.compute_distance(xf, p),
            Shape::Chain(c) => c.compute_distance(xf, p, child_index),
        }
    }

    /// Area and world centroid below the plane `dot(normal, x) = offset`.
    /// Edges and chains have no area.
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f64, xf: &Transform) -> (f64, Vec2) {
        match self {
            Shape::Circle(c) => c.compute_submerged_area(normal, offset, xf),
            Shape::Polygon(p) => p.compute_submerged_area(normal, offset, xf),
            Shape::Edge(_) | Shape::Chain(_) => (0.0, xf.position),
        }
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Edge> for Shape {
    fn from(e: Edge) -> Self {
        Shape::Edge(e)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}

impl From<Chain> for Shape {
    fn from(c: Chain) -> Self {
        Shape::Chain(c)
    }
}
