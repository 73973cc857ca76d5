use crate::math::vec2::Vec2;

/// A ray from `p1` towards `p2`, clipped at `p1 + max_fraction * (p2 - p1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f64,
}

impl RayCastInput {
    /// A ray covering the whole segment `p1 -> p2`.
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }

    /// Point along the ray at `fraction`.
    pub fn point_at(&self, fraction: f64) -> Vec2 {
        self.p1 + (self.p2 - self.p1) * fraction
    }
}

/// A ray hit. `fraction` is along `p2 - p1`; `normal` is the outward surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastOutput {
    pub normal: Vec2,
    pub fraction: f64,
}
