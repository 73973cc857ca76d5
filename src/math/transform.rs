use super::rot::Rot;
use super::vec2::Vec2;

/// A rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: Rot,
}

impl Transform {
    /// Creates a new transform from a position and an angle in radians.
    pub fn new(position: Vec2, angle: f64) -> Self {
        Self {
            position,
            rotation: Rot::new(angle),
        }
    }

    /// Creates a transform from a position and a precomputed rotation.
    pub fn from_rot(position: Vec2, rotation: Rot) -> Self {
        Self { position, rotation }
    }

    /// Creates an identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: Rot::IDENTITY,
        }
    }

    /// Rotation angle in radians.
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Applies the transform (rotation then translation) to a point.
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotation.apply(point) + self.position
    }

    /// Applies the inverse transform (inverse translation then inverse rotation) to a point.
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        self.rotation.apply_inverse(point - self.position)
    }

    /// Composes two transforms: the result maps through `other` first, then `self`.
    pub fn mul(&self, other: &Transform) -> Transform {
        Transform {
            rotation: self.rotation.mul(other.rotation),
            position: self.rotation.apply(other.position) + self.position,
        }
    }

    /// Computes `self^-1 * other`, i.e. expresses `other` in the frame of `self`.
    pub fn mul_inverse(&self, other: &Transform) -> Transform {
        Transform {
            rotation: self.rotation.mul_inverse(other.rotation),
            position: self.rotation.apply_inverse(other.position - self.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_transform_new() {
        let pos = Vec2::new(1.0, 2.0);
        let rot = PI / 4.0;
        let t = Transform::new(pos, rot);
        assert_eq!(t.position, pos);
        assert!((t.angle() - rot).abs() < EPSILON);
    }

    #[test]
    fn test_transform_identity() {
        let t = Transform::identity();
        let p = Vec2::new(5.0, -3.0);
        assert_eq!(t.apply(p), p);
        assert_eq!(t.apply_inverse(p), p);
    }

    #[test]
    fn test_transform_apply_combined() {
        // Rotate (1,0) by 90 degrees to (0,1), then translate by (10,5).
        let t = Transform::new(Vec2::new(10.0, 5.0), PI / 2.0);
        let tp = t.apply(Vec2::new(1.0, 0.0));
        assert!((tp.x - 10.0).abs() < EPSILON);
        assert!((tp.y - 6.0).abs() < EPSILON);
    }

    #[test]
    fn test_transform_apply_inverse_round_trip() {
        let t = Transform::new(Vec2::new(10.0, 5.0), PI / 4.0);
        let p_local = Vec2::new(1.0, 1.0);
        let p_world = t.apply(p_local);
        let p_local_again = t.apply_inverse(p_world);
        assert!((p_local_again - p_local).magnitude() < EPSILON);
    }

    #[test]
    fn test_transform_composition() {
        let a = Transform::new(Vec2::new(1.0, 2.0), 0.4);
        let b = Transform::new(Vec2::new(-3.0, 0.5), -1.1);
        let p = Vec2::new(0.7, -0.2);

        let ab = a.mul(&b);
        assert!((ab.apply(p) - a.apply(b.apply(p))).magnitude() < EPSILON);

        // a^-1 * (a * b) == b
        let back = a.mul_inverse(&ab);
        assert!((back.position - b.position).magnitude() < EPSILON);
        assert!((back.angle() - b.angle()).abs() < EPSILON);
    }
}
