use crate::collision::{RayCastInput, RayCastOutput, AABB};
use crate::common::settings::POLYGON_RADIUS;
use crate::math::{Transform, Vec2};
use crate::shapes::MassData;

/// A line segment. Two-sided by default; one-sided edges collide only on the
/// right of `vertex1 -> vertex2` and use the ghost vertices `vertex0` and
/// `vertex3` to smooth collisions across neighbouring segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub vertex0: Vec2,
    pub vertex1: Vec2,
    pub vertex2: Vec2,
    pub vertex3: Vec2,
    pub one_sided: bool,
    pub radius: f64,
}

impl Edge {
    /// Creates a two-sided segment.
    pub fn new(v1: Vec2, v2: Vec2) -> Self {
        Self {
            vertex0: Vec2::ZERO,
            vertex1: v1,
            vertex2: v2,
            vertex3: Vec2::ZERO,
            one_sided: false,
            radius: POLYGON_RADIUS,
        }
    }

    /// Creates a one-sided segment `v1 -> v2` with ghost neighbours `v0` and `v3`.
    pub fn new_one_sided(v0: Vec2, v1: Vec2, v2: Vec2, v3: Vec2) -> Self {
        Self {
            vertex0: v0,
            vertex1: v1,
            vertex2: v2,
            vertex3: v3,
            one_sided: true,
            radius: POLYGON_RADIUS,
        }
    }

    pub fn length(&self) -> f64 {
        self.vertex1.distance(self.vertex2)
    }

    /// Unit direction from `vertex1` to `vertex2`.
    pub fn direction(&self) -> Vec2 {
        (self.vertex2 - self.vertex1).normalize()
    }

    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        // Put the ray into the edge's frame of reference.
        let p1 = xf.rotation.apply_inverse(input.p1 - xf.position);
        let p2 = xf.rotation.apply_inverse(input.p2 - xf.position);
        let d = p2 - p1;

        let v1 = self.vertex1;
        let v2 = self.vertex2;
        let e = v2 - v1;
        let normal = e.perpendicular_cw().normalize();

        // q = p1 + t * d
        // dot(normal, q - v1) = 0
        let numerator = normal.dot(v1 - p1);
        if self.one_sided && numerator > 0.0 {
            // Back side.
            return None;
        }

        let denominator = normal.dot(d);
        if denominator == 0.0 {
            return None;
        }

        let t = numerator / denominator;
        if t < 0.0 || input.max_fraction < t {
            return None;
        }

        let q = p1 + d * t;
        let rr = e.magnitude_squared();
        if rr == 0.0 {
            return None;
        }

        // q = v1 + s * e
        let s = (q - v1).dot(e) / rr;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let world_normal = xf.rotation.apply(normal);
        Some(RayCastOutput {
            normal: if numerator > 0.0 { -world_normal } else { world_normal },
            fraction: t,
        })
    }

    pub fn compute_aabb(&self, xf: &Transform) -> AABB {
        let v1 = xf.apply(self.vertex1);
        let v2 = xf.apply(self.vertex2);
        AABB {
            min: v1.min(v2),
            max: v1.max(v2),
        }
        .expanded(self.radius)
    }

    /// Edges are massless.
    pub fn compute_mass(&self, _density: f64) -> MassData {
        MassData {
            mass: 0.0,
            center: (self.vertex1 + self.vertex2) * 0.5,
            inertia: 0.0,
        }
    }

    /// Distance from the segment core to `p`, and the direction from the
    /// closest point towards `p`.
    pub fn compute_distance(&self, xf: &Transform, p: Vec2) -> (f64, Vec2) {
        let v1 = xf.apply(self.vertex1);
        let v2 = xf.apply(self.vertex2);

        let mut d = p - v1;
        let s = v2 - v1;
        let ds = d.dot(s);
        if ds > 0.0 {
            let s2 = s.magnitude_squared();
            if ds > s2 {
                d = p - v2;
            } else {
                d -= s * (ds / s2);
            }
        }

        let (normal, length) = d.normalize_with_length();
        (length, normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    fn ground() -> Edge {
        Edge::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0))
    }

    #[test]
    fn test_edge_length_direction() {
        let e = Edge::new(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((e.length() - 5.0).abs() < EPSILON);
        assert!((e.direction() - Vec2::new(0.6, 0.8)).magnitude() < EPSILON);
    }

    #[test]
    fn test_edge_ray_cast_two_sided() {
        let e = ground();
        let xf = Transform::identity();
        let down = RayCastInput::new(Vec2::new(1.0, 2.0), Vec2::new(1.0, -2.0));
        let hit = e.ray_cast(&down, &xf).unwrap();
        assert!((hit.fraction - 0.5).abs() < EPSILON);
        assert!((hit.normal - Vec2::UP).magnitude() < EPSILON);

        let up = RayCastInput::new(Vec2::new(1.0, -2.0), Vec2::new(1.0, 2.0));
        let hit = e.ray_cast(&up, &xf).unwrap();
        assert!((hit.normal + Vec2::UP).magnitude() < EPSILON);

        let beside = RayCastInput::new(Vec2::new(6.0, 2.0), Vec2::new(6.0, -2.0));
        assert!(e.ray_cast(&beside, &xf).is_none());
    }

    #[test]
    fn test_edge_ray_cast_one_sided() {
        // Solid side is to the right of v1 -> v2, i.e. the normal points up for
        // a segment running right to left.
        let e = Edge::new_one_sided(
            Vec2::new(6.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(-5.0, 0.0),
            Vec2::new(-6.0, 0.0),
        );
        let xf = Transform::identity();
        let down = RayCastInput::new(Vec2::new(1.0, 2.0), Vec2::new(1.0, -2.0));
        let up = RayCastInput::new(Vec2::new(1.0, -2.0), Vec2::new(1.0, 2.0));
        assert!(e.ray_cast(&down, &xf).is_some());
        assert!(e.ray_cast(&up, &xf).is_none());
    }

    #[test]
    fn test_edge_distance() {
        let e = ground();
        let xf = Transform::identity();
        let (d, n) = e.compute_distance(&xf, Vec2::new(0.0, 3.0));
        assert!((d - 3.0).abs() < EPSILON);
        assert!((n - Vec2::UP).magnitude() < EPSILON);

        let (d, _) = e.compute_distance(&xf, Vec2::new(8.0, 4.0));
        assert!((d - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_edge_is_massless() {
        let md = ground().compute_mass(10.0);
        assert_eq!(md.mass, 0.0);
        assert_eq!(md.inertia, 0.0);
    }
}
