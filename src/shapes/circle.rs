use crate::collision::{RayCastInput, RayCastOutput, AABB};
use crate::math::{Transform, Vec2};
use crate::shapes::MassData;
use std::f64::consts::PI;

/// A solid disc. `position` is the center in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub position: Vec2,
    pub radius: f64,
}

impl Circle {
    /// Creates a circle centered on the body origin.
    pub fn new(radius: f64) -> Self {
        assert!(radius >= 0.0, "Circle radius cannot be negative");
        Self {
            position: Vec2::ZERO,
            radius,
        }
    }

    /// Creates a circle centered at a local offset.
    pub fn with_position(radius: f64, position: Vec2) -> Self {
        Self {
            position,
            ..Self::new(radius)
        }
    }

    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let center = xf.apply(self.position);
        (p - center).magnitude_squared() <= self.radius * self.radius
    }

    /// Solves `|p1 + t * d - center| = r` for the smallest admissible `t`.
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let position = xf.apply(self.position);
        let s = input.p1 - position;
        let b = s.magnitude_squared() - self.radius * self.radius;

        let r = input.p2 - input.p1;
        let c = s.dot(r);
        let rr = r.magnitude_squared();
        let sigma = c * c - rr * b;

        if sigma < 0.0 || rr < f64::EPSILON {
            return None;
        }

        let a = -(c + sigma.sqrt());
        if 0.0 <= a && a <= input.max_fraction * rr {
            let fraction = a / rr;
            return Some(RayCastOutput {
                normal: (s + r * fraction).normalize(),
                fraction,
            });
        }
        None
    }

    pub fn compute_aabb(&self, xf: &Transform) -> AABB {
        let p = xf.apply(self.position);
        let r = Vec2::new(self.radius, self.radius);
        AABB {
            min: p - r,
            max: p + r,
        }
    }

    pub fn compute_mass(&self, density: f64) -> MassData {
        let r2 = self.radius * self.radius;
        let mass = density * PI * r2;
        MassData {
            mass,
            center: self.position,
            // Inertia about the local origin.
            inertia: mass * (0.5 * r2 + self.position.magnitude_squared()),
        }
    }

    /// Signed distance from the surface to `p`, and the outward direction.
    pub fn compute_distance(&self, xf: &Transform, p: Vec2) -> (f64, Vec2) {
        let center = xf.apply(self.position);
        let (normal, length) = (p - center).normalize_with_length();
        (length - self.radius, normal)
    }

    /// Area and centroid of the part below the plane `dot(normal, x) = offset`.
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f64, xf: &Transform) -> (f64, Vec2) {
        let p = xf.apply(self.position);
        let l = -(normal.dot(p) - offset);
        let r = self.radius;

        if l < -r + f64::EPSILON {
            // Completely dry.
            return (0.0, p);
        }
        if l > r {
            // Completely wet.
            return (PI * r * r, p);
        }

        let r2 = r * r;
        let l2 = l * l;
        let area = r2 * ((l / r).asin() + PI / 2.0) + l * (r2 - l2).sqrt();
        let com = -2.0 / 3.0 * (r2 - l2).powf(1.5) / area;
        (area, p + normal * com)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_circle_new() {
        let c = Circle::new(5.0);
        assert_eq!(c.radius, 5.0);
        assert_eq!(c.position, Vec2::ZERO);
    }

    #[test]
    #[should_panic]
    fn test_circle_new_negative_radius() {
        Circle::new(-1.0);
    }

    #[test]
    fn test_circle_test_point() {
        let c = Circle::with_position(1.0, Vec2::new(1.0, 0.0));
        let xf = Transform::new(Vec2::new(0.0, 2.0), 0.0);
        assert!(c.test_point(&xf, Vec2::new(1.5, 2.0)));
        assert!(!c.test_point(&xf, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_circle_mass_about_origin() {
        let c = Circle::with_position(2.0, Vec2::new(3.0, 0.0));
        let md = c.compute_mass(1.0);
        let mass = PI * 4.0;
        assert!((md.mass - mass).abs() < EPSILON);
        assert_eq!(md.center, Vec2::new(3.0, 0.0));
        assert!((md.inertia - mass * (2.0 + 9.0)).abs() < EPSILON);
    }

    #[test]
    fn test_circle_ray_cast() {
        let c = Circle::new(1.0);
        let xf = Transform::identity();
        let input = RayCastInput::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0));
        let hit = c.ray_cast(&input, &xf).unwrap();
        assert!((hit.fraction - 2.0 / 6.0).abs() < EPSILON);
        assert!((hit.normal - Vec2::new(-1.0, 0.0)).magnitude() < EPSILON);

        let miss = RayCastInput::new(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 2.0));
        assert!(c.ray_cast(&miss, &xf).is_none());
    }

    #[test]
    fn test_circle_distance_and_aabb() {
        let c = Circle::new(1.0);
        let xf = Transform::new(Vec2::new(1.0, 1.0), 0.0);
        let (d, n) = c.compute_distance(&xf, Vec2::new(4.0, 1.0));
        assert!((d - 2.0).abs() < EPSILON);
        assert!((n - Vec2::new(1.0, 0.0)).magnitude() < EPSILON);

        let aabb = c.compute_aabb(&xf);
        assert_eq!(aabb.min, Vec2::ZERO);
        assert_eq!(aabb.max, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_circle_submerged_half() {
        let c = Circle::new(1.0);
        let xf = Transform::identity();
        let (area, centroid) = c.compute_submerged_area(Vec2::UP, 0.0, &xf);
        assert!((area - PI / 2.0).abs() < 1e-9);
        // Centroid of a half disc is 4r/(3pi) below the cut.
        assert!((centroid.y + 4.0 / (3.0 * PI)).abs() < 1e-9);

        let (dry, _) = c.compute_submerged_area(Vec2::UP, -5.0, &xf);
        assert_eq!(dry, 0.0);
        let (wet, _) = c.compute_submerged_area(Vec2::UP, 5.0, &xf);
        assert!((wet - PI).abs() < EPSILON);
    }
}
