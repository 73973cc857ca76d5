use super::vec2::Vec2;

/// A rotation stored as its sine and cosine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rot {
    pub s: f64,
    pub c: f64,
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot {
    pub const IDENTITY: Rot = Rot { s: 0.0, c: 1.0 };

    /// Creates a rotation from an angle in radians.
    pub fn new(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    /// Returns the angle in radians, in `(-PI, PI]`.
    pub fn angle(self) -> f64 {
        self.s.atan2(self.c)
    }

    pub fn x_axis(self) -> Vec2 {
        Vec2::new(self.c, self.s)
    }

    pub fn y_axis(self) -> Vec2 {
        Vec2::new(-self.s, self.c)
    }

    /// Rotates a vector.
    pub fn apply(self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse rotates a vector.
    pub fn apply_inverse(self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }

    /// Composes two rotations: `self * other`.
    pub fn mul(self, other: Rot) -> Rot {
        Rot {
            s: self.s * other.c + self.c * other.s,
            c: self.c * other.c - self.s * other.s,
        }
    }

    /// Composes the inverse of `self` with `other`: `self^T * other`.
    pub fn mul_inverse(self, other: Rot) -> Rot {
        Rot {
            s: self.c * other.s - self.s * other.c,
            c: self.c * other.c + self.s * other.s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_rot_angle_round_trip() {
        for angle in [-3.0, -1.0, 0.0, 0.5, 2.0, 3.1] {
            assert!((Rot::new(angle).angle() - angle).abs() < EPSILON);
        }
    }

    #[test]
    fn test_rot_apply_matches_vec_rotate() {
        let q = Rot::new(PI / 3.0);
        let v = Vec2::new(2.0, -1.0);
        let a = q.apply(v);
        let b = v.rotate(PI / 3.0);
        assert!((a - b).magnitude() < EPSILON);
        let back = q.apply_inverse(a);
        assert!((back - v).magnitude() < EPSILON);
    }

    #[test]
    fn test_rot_composition() {
        let a = Rot::new(0.3);
        let b = Rot::new(0.9);
        assert!((a.mul(b).angle() - 1.2).abs() < EPSILON);
        assert!((a.mul_inverse(b).angle() - 0.6).abs() < EPSILON);
    }
}
