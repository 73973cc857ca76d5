use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const X: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    /// Creates a new Vec2.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the dot product of two vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Calculates the squared magnitude (length) of the vector.
    /// Useful for comparisons as it avoids a square root.
    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    /// Calculates the magnitude (length) of the vector.
    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Returns a normalized version of the vector (unit vector).
    /// Vectors shorter than `f64::EPSILON` normalize to zero.
    pub fn normalize(self) -> Self {
        self.normalize_with_length().0
    }

    /// Normalizes the vector and also returns its original length.
    /// Returns `(ZERO, 0.0)` for vectors shorter than `f64::EPSILON`.
    pub fn normalize_with_length(self) -> (Self, f64) {
        let mag = self.magnitude();
        if mag < f64::EPSILON {
            (Self::ZERO, 0.0)
        } else {
            (self * (1.0 / mag), mag)
        }
    }

    /// Calculates the squared distance between two vector points.
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).magnitude_squared()
    }

    /// Calculates the distance between two vector points.
    pub fn distance(self, other: Self) -> f64 {
        (self - other).magnitude()
    }

    /// Returns a vector perpendicular to this vector (90-degree counter-clockwise rotation).
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Returns a vector perpendicular to this vector (90-degree clockwise rotation).
    /// For a counter-clockwise polygon edge this is the outward normal direction.
    pub fn perpendicular_cw(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Rotates the vector by a given angle (in radians).
    pub fn rotate(self, angle: f64) -> Self {
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        Self::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
        )
    }

    /// Computes the 2D cross product (scalar). Equivalent to z-component of 3D cross product.
    pub fn cross(&self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of this vector with a scalar treated as a z-axis vector: `v x s`.
    pub fn cross_scalar(self, s: f64) -> Vec2 {
        Vec2::new(s * self.y, -s * self.x)
    }

    /// Cross product of a scalar z-axis vector with a vector: `s x v`.
    /// Used to turn an angular velocity into the linear velocity of an offset point.
    pub fn scalar_cross(s: f64, v: Vec2) -> Vec2 {
        Vec2::new(-s * v.y, s * v.x)
    }

    /// Component-wise minimum.
    pub fn min(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Component-wise absolute value.
    pub fn abs(self) -> Vec2 {
        Vec2::new(self.x.abs(), self.y.abs())
    }

    /// True when both components are finite.
    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1).
    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        self * (1.0 - t) + other * t
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

// Vec2 * f64
impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

// f64 * Vec2
impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, vec: Vec2) -> Vec2 {
        vec * self
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_vec2_add_sub() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(3.0, 4.0);
        assert_eq!(v1 + v2, Vec2::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_vec2_scalar_mul() {
        let v = Vec2::new(1.0, 2.0);
        assert_eq!(v * 3.0, Vec2::new(3.0, 6.0));
        assert_eq!(3.0 * v, Vec2::new(3.0, 6.0));
        let mut w = v;
        w *= 2.0;
        assert_eq!(w, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2::new(3.0, 4.0);
        let (n, len) = v.normalize_with_length();
        assert!((len - 5.0).abs() < EPSILON);
        assert!((n.magnitude() - 1.0).abs() < EPSILON);
        assert!((n.x - 0.6).abs() < EPSILON);

        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(Vec2::new(1e-20, 0.0).normalize_with_length().1, 0.0);
    }

    #[test]
    fn test_vec2_perpendiculars() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.perpendicular(), Vec2::new(-4.0, 3.0));
        assert_eq!(v.perpendicular_cw(), Vec2::new(4.0, -3.0));
        assert!(v.dot(v.perpendicular()).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_cross_helpers() {
        let v = Vec2::new(2.0, 3.0);
        // s x v is the CCW perpendicular scaled by s
        assert_eq!(Vec2::scalar_cross(1.0, v), v.perpendicular());
        // v x s is the CW perpendicular scaled by s
        assert_eq!(v.cross_scalar(1.0), v.perpendicular_cw());
        assert!((Vec2::X.cross(Vec2::UP) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_min_max_abs() {
        let a = Vec2::new(-1.0, 5.0);
        let b = Vec2::new(2.0, -3.0);
        assert_eq!(a.min(b), Vec2::new(-1.0, -3.0));
        assert_eq!(a.max(b), Vec2::new(2.0, 5.0));
        assert_eq!(b.abs(), Vec2::new(2.0, 3.0));
        assert!(a.is_valid());
        assert!(!Vec2::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_vec2_rotate() {
        let v = Vec2::new(1.0, 0.0);
        let v90 = v.rotate(PI / 2.0);
        assert!((v90.x - 0.0).abs() < EPSILON);
        assert!((v90.y - 1.0).abs() < EPSILON);

        let v2_rot90 = Vec2::new(1.0, 1.0).rotate(PI / 2.0);
        assert!((v2_rot90.x - -1.0).abs() < EPSILON);
        assert!((v2_rot90.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vec2_distance() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(4.0, 6.0);
        assert!((v1.distance(v2) - 5.0).abs() < EPSILON);
        assert!((v2.distance_squared(v1) - 25.0).abs() < EPSILON);
        assert_eq!(v1.lerp(v2, 0.5), Vec2::new(2.5, 4.0));
    }
}
