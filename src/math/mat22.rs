use super::vec2::Vec2;

/// A 2-by-2 matrix stored in column-major order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat22 {
    pub ex: Vec2,
    pub ey: Vec2,
}

impl Mat22 {
    pub const ZERO: Mat22 = Mat22 {
        ex: Vec2::ZERO,
        ey: Vec2::ZERO,
    };

    /// Creates a matrix from its two columns.
    pub fn new(ex: Vec2, ey: Vec2) -> Self {
        Self { ex, ey }
    }

    pub fn identity() -> Self {
        Self::new(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0))
    }

    pub fn determinant(&self) -> f64 {
        self.ex.x * self.ey.y - self.ey.x * self.ex.y
    }

    /// Returns the inverse, or the zero matrix when singular.
    pub fn inverse(&self) -> Mat22 {
        let (a, b, c, d) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a * d - b * c;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Mat22::new(Vec2::new(det * d, -det * c), Vec2::new(-det * b, det * a))
    }

    /// Solves `A * x = b` without forming the inverse. Singular systems yield zero.
    pub fn solve(&self, b: Vec2) -> Vec2 {
        let (a11, a12, a21, a22) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a11 * a22 - a12 * a21;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
    }

    /// Multiplies this matrix by a vector.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.ex.x * v.x + self.ey.x * v.y,
            self.ex.y * v.x + self.ey.y * v.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_mat22_solve_and_inverse_agree() {
        let m = Mat22::new(Vec2::new(4.0, 1.0), Vec2::new(2.0, 3.0));
        let b = Vec2::new(1.0, -2.0);
        let x = m.solve(b);
        assert!((m.apply(x) - b).magnitude() < EPSILON);
        assert!((m.inverse().apply(b) - x).magnitude() < EPSILON);
        assert!((m.determinant() - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_mat22_singular_is_zero() {
        let m = Mat22::new(Vec2::new(1.0, 2.0), Vec2::new(2.0, 4.0));
        assert_eq!(m.inverse(), Mat22::ZERO);
        assert_eq!(m.solve(Vec2::new(1.0, 1.0)), Vec2::ZERO);
    }
}
