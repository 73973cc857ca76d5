// Defines an Axis-Aligned Bounding Box

use super::raycast::{RayCastInput, RayCastOutput};
use crate::math::vec2::Vec2;

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corner points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AABB {
    pub min: Vec2,
    pub max: Vec2,
}

impl AABB {
    /// Creates a new AABB.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        // Ensure min coordinates are <= max coordinates
        AABB {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Checks if this AABB overlaps with another AABB. Touching boxes overlap.
    pub fn overlaps(&self, other: &AABB) -> bool {
        let d1 = other.min - self.max;
        let d2 = self.min - other.max;
        !(d1.x > 0.0 || d1.y > 0.0 || d2.x > 0.0 || d2.y > 0.0)
    }

    /// Merges another AABB into this one, expanding this AABB to contain both.
    pub fn merge(&mut self, other: &AABB) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Returns the smallest AABB containing both inputs.
    pub fn combine(a: &AABB, b: &AABB) -> AABB {
        AABB {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Grows the box by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> AABB {
        let r = Vec2::new(margin, margin);
        AABB {
            min: self.min - r,
            max: self.max + r,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half-widths.
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * ((self.max.x - self.min.x) + (self.max.y - self.min.y))
    }

    /// True when the bounds are ordered and finite.
    pub fn is_valid(&self) -> bool {
        let d = self.max - self.min;
        d.x >= 0.0 && d.y >= 0.0 && self.min.is_valid() && self.max.is_valid()
    }

    /// Creates an AABB that encompasses a set of points.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = AABB {
            min: *first,
            max: *first,
        };
        for point in rest {
            aabb.min = aabb.min.min(*point);
            aabb.max = aabb.max.max(*point);
        }
        Some(aabb)
    }

    /// Slab test against the box. Rays starting inside the box miss.
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        let mut tmin = f64::MIN;
        let mut tmax = f64::MAX;

        let p = input.p1;
        let d = input.p2 - input.p1;
        let abs_d = d.abs();
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            let (p_i, d_i, abs_i, lo, hi) = if axis == 0 {
                (p.x, d.x, abs_d.x, self.min.x, self.max.x)
            } else {
                (p.y, d.y, abs_d.y, self.min.y, self.max.y)
            };

            if abs_i < f64::EPSILON {
                // Parallel.
                if p_i < lo || hi < p_i {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d_i;
                let mut t1 = (lo - p_i) * inv_d;
                let mut t2 = (hi - p_i) * inv_d;

                // Sign of the normal vector.
                let mut s = -1.0;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                    s = 1.0;
                }

                if t1 > tmin {
                    normal = if axis == 0 {
                        Vec2::new(s, 0.0)
                    } else {
                        Vec2::new(0.0, s)
                    };
                    tmin = t1;
                }

                tmax = tmax.min(t2);
                if tmin > tmax {
                    return None;
                }
            }
        }

        // Does the ray start inside the box? Does the ray intersect beyond the max fraction?
        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastOutput {
            normal,
            fraction: tmin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AABB {
        AABB::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn test_aabb_overlap_includes_touching() {
        let a = unit_box();
        let b = AABB::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = AABB::new(Vec2::new(1.1, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_aabb_combine_contains() {
        let a = unit_box();
        let b = AABB::new(Vec2::new(3.0, 3.0), Vec2::new(4.0, 5.0));
        let c = AABB::combine(&a, &b);
        assert!(c.contains(&a));
        assert!(c.contains(&b));
        assert!(!a.contains(&c));
        assert_eq!(c.perimeter(), 2.0 * (5.0 + 6.0));
        assert_eq!(a.center(), Vec2::ZERO);
        assert_eq!(a.extents(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_aabb_from_points() {
        assert!(AABB::from_points(&[]).is_none());
        let aabb = AABB::from_points(&[Vec2::new(1.0, -2.0), Vec2::new(-3.0, 4.0)]).unwrap();
        assert_eq!(aabb.min, Vec2::new(-3.0, -2.0));
        assert_eq!(aabb.max, Vec2::new(1.0, 4.0));
        assert!(aabb.is_valid());
    }

    #[test]
    fn test_aabb_ray_cast() {
        let aabb = unit_box();
        let input = RayCastInput::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0));
        let hit = aabb.ray_cast(&input).unwrap();
        assert!((hit.fraction - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

        // Parallel and outside.
        let miss = RayCastInput::new(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 2.0));
        assert!(aabb.ray_cast(&miss).is_none());

        // Too short.
        let short = RayCastInput {
            max_fraction: 0.1,
            ..input
        };
        assert!(aabb.ray_cast(&short).is_none());
    }
}
