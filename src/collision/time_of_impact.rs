//! Conservative advancement for continuous collision.

use tracing::debug;

use crate::collision::distance::{distance, DistanceInput, DistanceProxy, SimplexCache};
use crate::common::settings::{LINEAR_SLOP, MAX_POLYGON_VERTICES, MAX_ROOT_ITERATIONS, MAX_TOI_ITERATIONS};
use crate::math::{Sweep, Transform, Vec2};

pub struct ToiInput<'a> {
    pub proxy_a: &'a DistanceProxy,
    pub proxy_b: &'a DistanceProxy,
    pub sweep_a: Sweep,
    pub sweep_b: Sweep,
    /// Upper bound of the sweep interval, in `[0, 1]`.
    pub t_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToiState {
    Unknown,
    Failed,
    Overlapped,
    Touching,
    Separated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToiOutput {
    pub state: ToiState,
    pub t: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeparationType {
    Points,
    FaceA,
    FaceB,
}

/// Separation along a fixed axis as a function of sweep time.
struct SeparationFunction<'a> {
    proxy_a: &'a DistanceProxy,
    proxy_b: &'a DistanceProxy,
    sweep_a: Sweep,
    sweep_b: Sweep,
    separation_type: SeparationType,
    local_point: Vec2,
    axis: Vec2,
}

impl<'a> SeparationFunction<'a> {
    /// Builds the axis from the simplex left in `cache` by the last distance query.
    fn new(
        cache: &SimplexCache,
        proxy_a: &'a DistanceProxy,
        sweep_a: Sweep,
        proxy_b: &'a DistanceProxy,
        sweep_b: Sweep,
        t1: f64,
    ) -> (Self, f64) {
        debug_assert!(0 < cache.count && cache.count < 3);

        let xf_a = sweep_a.transform_at(t1);
        let xf_b = sweep_b.transform_at(t1);

        let mut f = SeparationFunction {
            proxy_a,
            proxy_b,
            sweep_a,
            sweep_b,
            separation_type: SeparationType::Points,
            local_point: Vec2::ZERO,
            axis: Vec2::ZERO,
        };

        if cache.count == 1 {
            let point_a = xf_a.apply(proxy_a.vertex(cache.index_a[0]));
            let point_b = xf_b.apply(proxy_b.vertex(cache.index_b[0]));
            let (axis, s) = (point_b - point_a).normalize_with_length();
            f.axis = axis;
            return (f, s);
        }

        if cache.index_a[0] == cache.index_a[1] {
            // Two points on B and one on A.
            f.separation_type = SeparationType::FaceB;
            let local_b1 = proxy_b.vertex(cache.index_b[0]);
            let local_b2 = proxy_b.vertex(cache.index_b[1]);

            f.axis = (local_b2 - local_b1).cross_scalar(1.0).normalize();
            let normal = xf_b.rotation.apply(f.axis);

            f.local_point = (local_b1 + local_b2) * 0.5;
            let point_b = xf_b.apply(f.local_point);
            let point_a = xf_a.apply(proxy_a.vertex(cache.index_a[0]));

            let mut s = (point_a - point_b).dot(normal);
            if s < 0.0 {
                f.axis = -f.axis;
                s = -s;
            }
            (f, s)
        } else {
            // Two points on A and one or two points on B.
            f.separation_type = SeparationType::FaceA;
            let local_a1 = proxy_a.vertex(cache.index_a[0]);
            let local_a2 = proxy_a.vertex(cache.index_a[1]);

            f.axis = (local_a2 - local_a1).cross_scalar(1.0).normalize();
            let normal = xf_a.rotation.apply(f.axis);

            f.local_point = (local_a1 + local_a2) * 0.5;
            let point_a = xf_a.apply(f.local_point);
            let point_b = xf_b.apply(proxy_b.vertex(cache.index_b[0]));

            let mut s = (point_b - point_a).dot(normal);
            if s < 0.0 {
                f.axis = -f.axis;
                s = -s;
            }
            (f, s)
        }
    }

    fn transforms(&self, t: f64) -> (Transform, Transform) {
        (self.sweep_a.transform_at(t), self.sweep_b.transform_at(t))
    }

    /// The deepest pair of support points at time `t` and their separation.
    fn find_min_separation(&self, t: f64) -> (usize, usize, f64) {
        let (xf_a, xf_b) = self.transforms(t);

        match self.separation_type {
            SeparationType::Points => {
                let axis_a = xf_a.rotation.apply_inverse(self.axis);
                let axis_b = xf_b.rotation.apply_inverse(-self.axis);
                let index_a = self.proxy_a.support(axis_a);
                let index_b = self.proxy_b.support(axis_b);
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (index_a, index_b, (point_b - point_a).dot(self.axis))
            }
            SeparationType::FaceA => {
                let normal = xf_a.rotation.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);
                let index_b = self.proxy_b.support(xf_b.rotation.apply_inverse(-normal));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (0, index_b, (point_b - point_a).dot(normal))
            }
            SeparationType::FaceB => {
                let normal = xf_b.rotation.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);
                let index_a = self.proxy_a.support(xf_a.rotation.apply_inverse(-normal));
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                (index_a, 0, (point_a - point_b).dot(normal))
            }
        }
    }

    /// Separation of a fixed pair of support points at time `t`.
    fn evaluate(&self, index_a: usize, index_b: usize, t: f64) -> f64 {
        let (xf_a, xf_b) = self.transforms(t);

        match self.separation_type {
            SeparationType::Points => {
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(self.axis)
            }
            SeparationType::FaceA => {
                let normal = xf_a.rotation.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(normal)
            }
            SeparationType::FaceB => {
                let normal = xf_b.rotation.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                (point_a - point_b).dot(normal)
            }
        }
    }
}

/// Finds the first time in `[0, t_max]` at which the two swept proxies come
/// within `LINEAR_SLOP` of touching.
///
/// Rotation can make the shapes tunnel; the separating axis is refreshed
/// every outer iteration to keep the advancement conservative. A `Failed`
/// state still carries the best time found.
pub fn time_of_impact(input: &ToiInput<'_>) -> ToiOutput {
    let proxy_a = input.proxy_a;
    let proxy_b = input.proxy_b;

    let mut sweep_a = input.sweep_a;
    let mut sweep_b = input.sweep_b;

    // Large rotations can make the root finder fail, so normalize the sweep angles.
    sweep_a.normalize();
    sweep_b.normalize();

    let t_max = input.t_max;

    let total_radius = proxy_a.radius + proxy_b.radius;
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    let mut t1 = 0.0;
    let mut cache = SimplexCache::default();
    let mut output = ToiOutput {
        state: ToiState::Unknown,
        t: t_max,
    };

    // Each outer pass picks a new separating axis from the current closest features.
    let mut iter = 0;
    loop {
        let distance_input = DistanceInput {
            proxy_a,
            proxy_b,
            transform_a: sweep_a.transform_at(t1),
            transform_b: sweep_b.transform_at(t1),
            use_radii: false,
        };

        // Get the distance between shapes. The radii are left out so the
        // cores stay separated and a valid axis exists.
        let distance_output = distance(&mut cache, &distance_input);

        if distance_output.distance <= 0.0 {
            output = ToiOutput {
                state: ToiState::Overlapped,
                t: 0.0,
            };
            break;
        }

        if distance_output.distance < target + tolerance {
            // Close enough.
            output = ToiOutput {
                state: ToiState::Touching,
                t: t1,
            };
            break;
        }

        let (fcn, _) = SeparationFunction::new(&cache, proxy_a, sweep_a, proxy_b, sweep_b, t1);

        // Resolve the deepest point over the interval [t1, t2] by pushing
        // t2 back until the separation is within tolerance.
        let mut done = false;
        let mut t2 = t_max;
        let mut push_back_iter = 0;
        loop {
            let (index_a, index_b, mut s2) = fcn.find_min_separation(t2);

            if s2 > target + tolerance {
                output = ToiOutput {
                    state: ToiState::Separated,
                    t: t_max,
                };
                done = true;
                break;
            }

            if s2 > target - tolerance {
                t1 = t2;
                break;
            }

            let mut s1 = fcn.evaluate(index_a, index_b, t1);

            // Initial overlap: the root finder would be unreliable.
            if s1 < target - tolerance {
                output = ToiOutput {
                    state: ToiState::Failed,
                    t: t1,
                };
                done = true;
                break;
            }

            if s1 <= target + tolerance {
                // `t1` is the impact time, possibly zero.
                output = ToiOutput {
                    state: ToiState::Touching,
                    t: t1,
                };
                done = true;
                break;
            }

            // 1D root of f(t) - target = 0, alternating bisection and secant.
            let mut root_iter = 0;
            let mut a1 = t1;
            let mut a2 = t2;
            loop {
                let t = if root_iter & 1 == 1 {
                    // Secant on odd passes.
                    a1 + (target - s1) * (a2 - a1) / (s2 - s1)
                } else {
                    0.5 * (a1 + a2)
                };
                root_iter += 1;

                let s = fcn.evaluate(index_a, index_b, t);

                if (s - target).abs() < tolerance {
                    t2 = t;
                    break;
                }

                // Keep the root bracketed.
                if s > target {
                    a1 = t;
                    s1 = s;
                } else {
                    a2 = t;
                    s2 = s;
                }

                if root_iter == MAX_ROOT_ITERATIONS {
                    break;
                }
            }

            push_back_iter += 1;
            if push_back_iter == MAX_POLYGON_VERTICES {
                break;
            }
        }

        iter += 1;

        if done {
            break;
        }

        if iter == MAX_TOI_ITERATIONS {
            debug!(t = t1, "time of impact did not converge");
            output = ToiOutput {
                state: ToiState::Failed,
                t: t1,
            };
            break;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Edge, Polygon, Shape};
    use approx::assert_relative_eq;

    fn still_sweep(center: Vec2) -> Sweep {
        Sweep {
            local_center: Vec2::ZERO,
            c0: center,
            c: center,
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        }
    }

    fn moving_sweep(from: Vec2, to: Vec2) -> Sweep {
        Sweep {
            c0: from,
            c: to,
            ..still_sweep(from)
        }
    }

    #[test]
    fn test_fast_circle_hits_thin_edge() {
        let wall = Shape::from(Edge::new(Vec2::new(0.0, -5.0), Vec2::new(0.0, 5.0)));
        let ball = Shape::from(Circle::new(0.1));
        let proxy_a = DistanceProxy::new(&wall, 0);
        let proxy_b = DistanceProxy::new(&ball, 0);

        let input = ToiInput {
            proxy_a: &proxy_a,
            proxy_b: &proxy_b,
            sweep_a: still_sweep(Vec2::ZERO),
            sweep_b: moving_sweep(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)),
            t_max: 1.0,
        };
        let output = time_of_impact(&input);
        assert_eq!(output.state, ToiState::Touching);

        // The ball stops just short of the wall: its center is about one
        // radius (less the target slop) away at t.
        let x = -10.0 + 20.0 * output.t;
        let target = LINEAR_SLOP.max(proxy_a.radius + proxy_b.radius - 3.0 * LINEAR_SLOP);
        assert!(x < 0.0);
        assert_relative_eq!(-x, target, epsilon = 0.25 * LINEAR_SLOP + 1e-9);
    }

    #[test]
    fn test_separated_motion() {
        let a = Shape::from(Polygon::new_box(0.5, 0.5));
        let b = Shape::from(Polygon::new_box(0.5, 0.5));
        let proxy_a = DistanceProxy::new(&a, 0);
        let proxy_b = DistanceProxy::new(&b, 0);

        let input = ToiInput {
            proxy_a: &proxy_a,
            proxy_b: &proxy_b,
            sweep_a: still_sweep(Vec2::ZERO),
            sweep_b: moving_sweep(Vec2::new(3.0, 5.0), Vec2::new(3.0, -5.0)),
            t_max: 1.0,
        };
        let output = time_of_impact(&input);
        assert_eq!(output.state, ToiState::Separated);
        assert_eq!(output.t, 1.0);
    }

    #[test]
    fn test_overlapped_at_start() {
        let a = Shape::from(Polygon::new_box(1.0, 1.0));
        let b = Shape::from(Polygon::new_box(1.0, 1.0));
        let proxy_a = DistanceProxy::new(&a, 0);
        let proxy_b = DistanceProxy::new(&b, 0);

        let input = ToiInput {
            proxy_a: &proxy_a,
            proxy_b: &proxy_b,
            sweep_a: still_sweep(Vec2::ZERO),
            sweep_b: moving_sweep(Vec2::new(0.5, 0.0), Vec2::new(5.0, 0.0)),
            t_max: 1.0,
        };
        let output = time_of_impact(&input);
        assert_eq!(output.state, ToiState::Overlapped);
        assert_eq!(output.t, 0.0);
    }

    #[test]
    fn test_rotating_box_contact() {
        let a = Shape::from(Polygon::new_box(5.0, 0.5));
        let b = Shape::from(Polygon::new_box(0.25, 2.0));
        let proxy_a = DistanceProxy::new(&a, 0);
        let proxy_b = DistanceProxy::new(&b, 0);

        let mut sweep_b = moving_sweep(Vec2::new(0.0, 4.0), Vec2::new(0.0, -1.0));
        sweep_b.a = 1.0;
        let input = ToiInput {
            proxy_a: &proxy_a,
            proxy_b: &proxy_b,
            sweep_a: still_sweep(Vec2::ZERO),
            sweep_b,
            t_max: 1.0,
        };
        let output = time_of_impact(&input);
        assert_eq!(output.state, ToiState::Touching);
        assert!(output.t > 0.0 && output.t < 1.0);

        // At the reported time the cores are just apart.
        let mut cache = SimplexCache::default();
        let d = distance(
            &mut cache,
            &DistanceInput {
                proxy_a: &proxy_a,
                proxy_b: &proxy_b,
                transform_a: Transform::identity(),
                transform_b: input.sweep_b.transform_at(output.t),
                use_radii: false,
            },
        );
        assert!(d.distance > 0.0);
        assert!(d.distance < proxy_a.radius + proxy_b.radius + LINEAR_SLOP);
    }
}
