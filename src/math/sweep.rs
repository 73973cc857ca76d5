use super::rot::Rot;
use super::transform::Transform;
use super::vec2::Vec2;
use std::f64::consts::PI;

/// Describes the motion of a body over one time step for continuous collision.
/// Positions are of the center of mass, not the body origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sweep {
    /// Center of mass relative to the body origin.
    pub local_center: Vec2,
    /// World center at `alpha0`.
    pub c0: Vec2,
    /// World center at the end of the step.
    pub c: Vec2,
    pub a0: f64,
    pub a: f64,
    /// Fraction of the current step already consumed, in `[0, 1)`.
    pub alpha0: f64,
}

impl Sweep {
    /// Interpolated body transform at `beta` in `[0, 1]`, where 0 is `alpha0`.
    pub fn transform_at(&self, beta: f64) -> Transform {
        let center = self.c0 * (1.0 - beta) + self.c * beta;
        let angle = (1.0 - beta) * self.a0 + beta * self.a;
        let q = Rot::new(angle);
        Transform::from_rot(center - q.apply(self.local_center), q)
    }

    /// Moves the start of the sweep forward to `alpha`.
    pub fn advance(&mut self, alpha: f64) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += (self.c - self.c0) * beta;
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }

    /// Wraps the start angle into `[0, 2PI)` and shifts the end angle with it.
    pub fn normalize(&mut self) {
        let two_pi = 2.0 * PI;
        let d = two_pi * (self.a0 / two_pi).floor();
        self.a0 -= d;
        self.a -= d;
    }
}
