use arrayvec::ArrayVec;
use slotmap::SlotMap;

use crate::collision::{Manifold, ManifoldPoint, ManifoldType, WorldManifold};
use crate::common::settings::{
    BAUMGARTE, LINEAR_SLOP, MAX_CONDITION_NUMBER, MAX_LINEAR_CORRECTION, MAX_MANIFOLD_POINTS, TOI_BAUMGARTE,
    VELOCITY_THRESHOLD,
};
use crate::integration::{Position, SolverBody, TimeStep, Velocity};
use crate::math::{Mat22, Rot, Transform, Vec2};
use crate::objects::{Contact, ContactHandle};

/// Impulses applied at each manifold point during the last solve, reported
/// to post-solve listeners.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactImpulse {
    pub normal_impulses: ArrayVec<f64, MAX_MANIFOLD_POINTS>,
    pub tangent_impulses: ArrayVec<f64, MAX_MANIFOLD_POINTS>,
}

/// What the solver needs to know about one touching contact.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContactConstraintInput {
    pub manifold: Manifold,
    pub friction: f64,
    pub restitution: f64,
    pub tangent_speed: f64,
    pub radius_a: f64,
    pub radius_b: f64,
    pub body_a: SolverBody,
    pub body_b: SolverBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f64,
    tangent_impulse: f64,
    normal_mass: f64,
    tangent_mass: f64,
    velocity_bias: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ContactVelocityConstraint {
    points: ArrayVec<VelocityConstraintPoint, MAX_MANIFOLD_POINTS>,
    normal: Vec2,
    normal_mass: Mat22,
    k: Mat22,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f64,
    inv_mass_b: f64,
    inv_i_a: f64,
    inv_i_b: f64,
    friction: f64,
    restitution: f64,
    tangent_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ContactPositionConstraint {
    local_points: ArrayVec<Vec2, MAX_MANIFOLD_POINTS>,
    local_normal: Vec2,
    local_point: Vec2,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f64,
    inv_mass_b: f64,
    local_center_a: Vec2,
    local_center_b: Vec2,
    inv_i_a: f64,
    inv_i_b: f64,
    manifold_type: ManifoldType,
    radius_a: f64,
    radius_b: f64,
}

/// Normal, point and separation of one manifold point at the solver's
/// current positions.
fn position_solver_manifold(
    pc: &ContactPositionConstraint,
    xf_a: &Transform,
    xf_b: &Transform,
    index: usize,
) -> (Vec2, Vec2, f64) {
    match pc.manifold_type {
        ManifoldType::Circles => {
            let point_a = xf_a.apply(pc.local_point);
            let point_b = xf_b.apply(pc.local_points[0]);
            let normal = (point_b - point_a).normalize();
            let point = (point_a + point_b) * 0.5;
            let separation = (point_b - point_a).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, point, separation)
        }
        ManifoldType::FaceA => {
            let normal = xf_a.rotation.apply(pc.local_normal);
            let plane_point = xf_a.apply(pc.local_point);
            let clip_point = xf_b.apply(pc.local_points[index]);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (normal, clip_point, separation)
        }
        ManifoldType::FaceB => {
            let normal = xf_b.rotation.apply(pc.local_normal);
            let plane_point = xf_b.apply(pc.local_point);
            let clip_point = xf_a.apply(pc.local_points[index]);
            let separation = (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b;
            (-normal, clip_point, separation)
        }
    }
}

fn body_transform(position: &Position, local_center: Vec2) -> Transform {
    let q = Rot::new(position.a);
    Transform::from_rot(position.c - q.apply(local_center), q)
}

/// Sequential impulse solver for the contacts of one island.
#[derive(Debug, Clone)]
pub struct ContactSolver {
    velocity_constraints: Vec<ContactVelocityConstraint>,
    position_constraints: Vec<ContactPositionConstraint>,
}

impl ContactSolver {
    pub(crate) fn new(step: TimeStep, inputs: &[ContactConstraintInput]) -> Self {
        let mut velocity_constraints = Vec::with_capacity(inputs.len());
        let mut position_constraints = Vec::with_capacity(inputs.len());

        for input in inputs {
            let manifold = &input.manifold;
            debug_assert!(!manifold.is_empty());

            let points = manifold
                .points
                .iter()
                .map(|mp| {
                    let (normal_impulse, tangent_impulse) = if step.warm_starting {
                        (step.dt_ratio * mp.normal_impulse, step.dt_ratio * mp.tangent_impulse)
                    } else {
                        (0.0, 0.0)
                    };
                    VelocityConstraintPoint {
                        normal_impulse,
                        tangent_impulse,
                        ..Default::default()
                    }
                })
                .collect();

            velocity_constraints.push(ContactVelocityConstraint {
                points,
                normal: Vec2::ZERO,
                normal_mass: Mat22::ZERO,
                k: Mat22::ZERO,
                index_a: input.body_a.index,
                index_b: input.body_b.index,
                inv_mass_a: input.body_a.inv_mass,
                inv_mass_b: input.body_b.inv_mass,
                inv_i_a: input.body_a.inv_inertia,
                inv_i_b: input.body_b.inv_inertia,
                friction: input.friction,
                restitution: input.restitution,
                tangent_speed: input.tangent_speed,
            });

            position_constraints.push(ContactPositionConstraint {
                local_points: manifold.points.iter().map(|mp| mp.local_point).collect(),
                local_normal: manifold.local_normal,
                local_point: manifold.local_point,
                index_a: input.body_a.index,
                index_b: input.body_b.index,
                inv_mass_a: input.body_a.inv_mass,
                inv_mass_b: input.body_b.inv_mass,
                local_center_a: input.body_a.local_center,
                local_center_b: input.body_b.local_center,
                inv_i_a: input.body_a.inv_inertia,
                inv_i_b: input.body_b.inv_inertia,
                manifold_type: manifold.manifold_type,
                radius_a: input.radius_a,
                radius_b: input.radius_b,
            });
        }

        Self {
            velocity_constraints,
            position_constraints,
        }
    }

    pub fn constraint_count(&self) -> usize {
        self.velocity_constraints.len()
    }

    /// Computes effective masses and restitution bias from the current positions.
    pub fn initialize_velocity_constraints(&mut self, positions: &[Position], velocities: &[Velocity]) {
        for (vc, pc) in self.velocity_constraints.iter_mut().zip(&self.position_constraints) {
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);

            let c_a = positions[vc.index_a].c;
            let v_a = velocities[vc.index_a].v;
            let w_a = velocities[vc.index_a].w;

            let c_b = positions[vc.index_b].c;
            let v_b = velocities[vc.index_b].v;
            let w_b = velocities[vc.index_b].w;

            let xf_a = body_transform(&positions[vc.index_a], pc.local_center_a);
            let xf_b = body_transform(&positions[vc.index_b], pc.local_center_b);

            let manifold = Manifold {
                points: pc
                    .local_points
                    .iter()
                    .map(|&local_point| ManifoldPoint {
                        local_point,
                        ..Default::default()
                    })
                    .collect(),
                local_normal: pc.local_normal,
                local_point: pc.local_point,
                manifold_type: pc.manifold_type,
            };
            let world_manifold = WorldManifold::new(&manifold, &xf_a, pc.radius_a, &xf_b, pc.radius_b);

            vc.normal = world_manifold.normal;
            let normal = vc.normal;
            let tangent = normal.cross_scalar(1.0);

            for (j, vcp) in vc.points.iter_mut().enumerate() {
                vcp.r_a = world_manifold.points[j] - c_a;
                vcp.r_b = world_manifold.points[j] - c_b;

                let rn_a = vcp.r_a.cross(normal);
                let rn_b = vcp.r_b.cross(normal);
                let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = vcp.r_a.cross(tangent);
                let rt_b = vcp.r_b.cross(tangent);
                let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                vcp.velocity_bias = 0.0;
                let v_rel = normal.dot(v_b + Vec2::scalar_cross(w_b, vcp.r_b) - v_a - Vec2::scalar_cross(w_a, vcp.r_a));
                if v_rel < -VELOCITY_THRESHOLD {
                    vcp.velocity_bias = -vc.restitution * v_rel;
                }
            }

            if vc.points.len() == 2 {
                let vcp1 = vc.points[0];
                let vcp2 = vc.points[1];

                let rn1_a = vcp1.r_a.cross(normal);
                let rn1_b = vcp1.r_b.cross(normal);
                let rn2_a = vcp2.r_a.cross(normal);
                let rn2_b = vcp2.r_b.cross(normal);

                let k11 = m_a + m_b + i_a * rn1_a * rn1_a + i_b * rn1_b * rn1_b;
                let k22 = m_a + m_b + i_a * rn2_a * rn2_a + i_b * rn2_b * rn2_b;
                let k12 = m_a + m_b + i_a * rn1_a * rn2_a + i_b * rn1_b * rn2_b;

                if k11 * k11 < MAX_CONDITION_NUMBER * (k11 * k22 - k12 * k12) {
                    // K is safe to invert.
                    vc.k = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22));
                    vc.normal_mass = vc.k.inverse();
                } else {
                    // Ill-conditioned: keep only the first point.
                    vc.points.truncate(1);
                }
            }
        }
    }

    /// Applies the impulses carried over from the last step.
    pub fn warm_start(&self, velocities: &mut [Velocity]) {
        for vc in &self.velocity_constraints {
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);
            let mut v_a = velocities[vc.index_a].v;
            let mut w_a = velocities[vc.index_a].w;
            let mut v_b = velocities[vc.index_b].v;
            let mut w_b = velocities[vc.index_b].w;

            let normal = vc.normal;
            let tangent = normal.cross_scalar(1.0);

            for vcp in &vc.points {
                let p = normal * vcp.normal_impulse + tangent * vcp.tangent_impulse;
                w_a -= i_a * vcp.r_a.cross(p);
                v_a -= p * m_a;
                w_b += i_b * vcp.r_b.cross(p);
                v_b += p * m_b;
            }

            velocities[vc.index_a].v = v_a;
            velocities[vc.index_a].w = w_a;
            velocities[vc.index_b].v = v_b;
            velocities[vc.index_b].w = w_b;
        }
    }

    /// One Gauss-Seidel pass over friction then normal impulses.
    pub fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        for vc in self.velocity_constraints.iter_mut() {
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);

            let mut v_a = velocities[vc.index_a].v;
            let mut w_a = velocities[vc.index_a].w;
            let mut v_b = velocities[vc.index_b].v;
            let mut w_b = velocities[vc.index_b].w;

            let normal = vc.normal;
            let tangent = normal.cross_scalar(1.0);
            let friction = vc.friction;

            // Friction first; the normal pass then has the last word.
            for vcp in vc.points.iter_mut() {
                let dv = v_b + Vec2::scalar_cross(w_b, vcp.r_b) - v_a - Vec2::scalar_cross(w_a, vcp.r_a);

                let vt = dv.dot(tangent) - vc.tangent_speed;
                let mut lambda = vcp.tangent_mass * (-vt);

                let max_friction = friction * vcp.normal_impulse;
                let new_impulse = (vcp.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                let p = tangent * lambda;
                v_a -= p * m_a;
                w_a -= i_a * vcp.r_a.cross(p);
                v_b += p * m_b;
                w_b += i_b * vcp.r_b.cross(p);
            }

            if vc.points.len() == 1 {
                let vcp = &mut vc.points[0];

                let dv = v_b + Vec2::scalar_cross(w_b, vcp.r_b) - v_a - Vec2::scalar_cross(w_a, vcp.r_a);

                let vn = dv.dot(normal);
                let mut lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

                let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                lambda = new_impulse - vcp.normal_impulse;
                vcp.normal_impulse = new_impulse;

                let p = normal * lambda;
                v_a -= p * m_a;
                w_a -= i_a * vcp.r_a.cross(p);
                v_b += p * m_b;
                w_b += i_b * vcp.r_b.cross(p);
            } else if vc.points.len() == 2 {
                // Two-point block solver. Solves the mixed LCP
                //   vn = K * x + b, vn >= 0, x >= 0, vn_i * x_i = 0
                // by total enumeration of the four complementary cases, in
                // terms of the accumulated impulse `a` so that only the
                // total impulse is clamped: x = a + d, b' = b - K * a.
                let cp1 = vc.points[0];
                let cp2 = vc.points[1];

                let a = Vec2::new(cp1.normal_impulse, cp2.normal_impulse);
                debug_assert!(a.x >= 0.0 && a.y >= 0.0);

                let dv1 = v_b + Vec2::scalar_cross(w_b, cp1.r_b) - v_a - Vec2::scalar_cross(w_a, cp1.r_a);
                let dv2 = v_b + Vec2::scalar_cross(w_b, cp2.r_b) - v_a - Vec2::scalar_cross(w_a, cp2.r_a);

                let vn1 = dv1.dot(normal);
                let vn2 = dv2.dot(normal);

                let mut b = Vec2::new(vn1 - cp1.velocity_bias, vn2 - cp2.velocity_bias);

                // Compute b'
                b -= vc.k.apply(a);

                let candidates = [
                    // Case 1: vn = 0, x = -inv(K) * b'
                    {
                        let x = -vc.normal_mass.apply(b);
                        (x, x.x >= 0.0 && x.y >= 0.0)
                    },
                    // Case 2: vn1 = 0 and x2 = 0
                    {
                        let x = Vec2::new(-cp1.normal_mass * b.x, 0.0);
                        let vn2 = vc.k.ex.y * x.x + b.y;
                        (x, x.x >= 0.0 && vn2 >= 0.0)
                    },
                    // Case 3: vn2 = 0 and x1 = 0
                    {
                        let x = Vec2::new(0.0, -cp2.normal_mass * b.y);
                        let vn1 = vc.k.ey.x * x.y + b.x;
                        (x, x.y >= 0.0 && vn1 >= 0.0)
                    },
                    // Case 4: x1 = 0 and x2 = 0
                    (Vec2::ZERO, b.x >= 0.0 && b.y >= 0.0),
                ];

                // No valid case leaves the impulses unchanged.
                if let Some(&(x, _)) = candidates.iter().find(|(_, valid)| *valid) {
                    let d = x - a;

                    let p1 = normal * d.x;
                    let p2 = normal * d.y;
                    v_a -= (p1 + p2) * m_a;
                    w_a -= i_a * (cp1.r_a.cross(p1) + cp2.r_a.cross(p2));

                    v_b += (p1 + p2) * m_b;
                    w_b += i_b * (cp1.r_b.cross(p1) + cp2.r_b.cross(p2));

                    vc.points[0].normal_impulse = x.x;
                    vc.points[1].normal_impulse = x.y;
                }
            }

            velocities[vc.index_a].v = v_a;
            velocities[vc.index_a].w = w_a;
            velocities[vc.index_b].v = v_b;
            velocities[vc.index_b].w = w_b;
        }
    }

    /// Writes the accumulated impulses back into the contact manifolds for
    /// warm starting. `handles` is parallel to the solver inputs.
    pub(crate) fn store_impulses(&self, handles: &[ContactHandle], contacts: &mut SlotMap<ContactHandle, Contact>) {
        for (vc, handle) in self.velocity_constraints.iter().zip(handles) {
            let Some(contact) = contacts.get_mut(*handle) else {
                continue;
            };
            for (mp, vcp) in contact.manifold.points.iter_mut().zip(&vc.points) {
                mp.normal_impulse = vcp.normal_impulse;
                mp.tangent_impulse = vcp.tangent_impulse;
            }
        }
    }

    /// Impulses of constraint `index`, for post-solve reporting.
    pub fn impulse(&self, index: usize) -> ContactImpulse {
        let vc = &self.velocity_constraints[index];
        ContactImpulse {
            normal_impulses: vc.points.iter().map(|p| p.normal_impulse).collect(),
            tangent_impulses: vc.points.iter().map(|p| p.tangent_impulse).collect(),
        }
    }

    /// Pushes overlapping shapes apart. Returns true when no point
    /// penetrates deeper than three times the linear slop.
    pub fn solve_position_constraints(&self, positions: &mut [Position]) -> bool {
        let mut min_separation: f64 = 0.0;

        for pc in &self.position_constraints {
            let min = self.solve_position_constraint(pc, positions, BAUMGARTE, pc.inv_mass_a, pc.inv_i_a, pc.inv_mass_b, pc.inv_i_b);
            min_separation = min_separation.min(min);
        }

        // Separation is only pushed up to -LINEAR_SLOP, so allow some margin.
        min_separation >= -3.0 * LINEAR_SLOP
    }

    /// Position pass for a TOI sub-step. Only the two TOI bodies move; the
    /// rest of the island is treated as static.
    pub fn solve_toi_position_constraints(&self, positions: &mut [Position], toi_index_a: usize, toi_index_b: usize) -> bool {
        let mut min_separation: f64 = 0.0;

        for pc in &self.position_constraints {
            let (mut m_a, mut i_a) = (0.0, 0.0);
            if pc.index_a == toi_index_a || pc.index_a == toi_index_b {
                m_a = pc.inv_mass_a;
                i_a = pc.inv_i_a;
            }

            let (mut m_b, mut i_b) = (0.0, 0.0);
            if pc.index_b == toi_index_a || pc.index_b == toi_index_b {
                m_b = pc.inv_mass_b;
                i_b = pc.inv_i_b;
            }

            let min = self.solve_position_constraint(pc, positions, TOI_BAUMGARTE, m_a, i_a, m_b, i_b);
            min_separation = min_separation.min(min);
        }

        min_separation >= -1.5 * LINEAR_SLOP
    }

    #[allow(clippy::too_many_arguments)]
    fn solve_position_constraint(
        &self,
        pc: &ContactPositionConstraint,
        positions: &mut [Position],
        baumgarte: f64,
        m_a: f64,
        i_a: f64,
        m_b: f64,
        i_b: f64,
    ) -> f64 {
        let mut min_separation = 0.0f64;

        let mut c_a = positions[pc.index_a].c;
        let mut a_a = positions[pc.index_a].a;
        let mut c_b = positions[pc.index_b].c;
        let mut a_b = positions[pc.index_b].a;

        for j in 0..pc.local_points.len() {
            let xf_a = body_transform(&Position { c: c_a, a: a_a }, pc.local_center_a);
            let xf_b = body_transform(&Position { c: c_b, a: a_b }, pc.local_center_b);

            let (normal, point, separation) = position_solver_manifold(pc, &xf_a, &xf_b, j);

            let r_a = point - c_a;
            let r_b = point - c_b;

            min_separation = min_separation.min(separation);

            let c = (baumgarte * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);

            let rn_a = r_a.cross(normal);
            let rn_b = r_b.cross(normal);
            let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;

            let impulse = if k > 0.0 { -c / k } else { 0.0 };

            let p = normal * impulse;

            c_a -= p * m_a;
            a_a -= i_a * r_a.cross(p);

            c_b += p * m_b;
            a_b += i_b * r_b.cross(p);
        }

        positions[pc.index_a].c = c_a;
        positions[pc.index_a].a = a_a;
        positions[pc.index_b].c = c_b;
        positions[pc.index_b].a = a_b;

        min_separation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::collide_shapes;
    use crate::shapes::{Polygon, Shape};
    use approx::assert_relative_eq;

    /// A unit box (body B, index 1) resting on a wide static box (body A, index 0).
    fn resting_box(gap: f64, warm: bool) -> (ContactSolver, Vec<Position>, Vec<Velocity>) {
        let ground = Shape::Polygon(Polygon::new_box(5.0, 0.5));
        let crate_shape = Shape::Polygon(Polygon::new_box(0.5, 0.5));
        let xf_a = Transform::identity();
        let xf_b = Transform::new(Vec2::new(0.0, 1.0 + gap), 0.0);
        let manifold = collide_shapes(&ground, 0, &xf_a, &crate_shape, &xf_b);
        assert_eq!(manifold.point_count(), 2);

        let mut step = TimeStep::new(1.0 / 60.0, 8, 3);
        step.warm_starting = warm;
        let input = ContactConstraintInput {
            manifold,
            friction: 0.6,
            restitution: 0.0,
            tangent_speed: 0.0,
            radius_a: ground.radius(),
            radius_b: crate_shape.radius(),
            body_a: SolverBody {
                index: 0,
                ..Default::default()
            },
            body_b: SolverBody {
                index: 1,
                local_center: Vec2::ZERO,
                inv_mass: 1.0,
                inv_inertia: 6.0,
            },
        };
        let positions = vec![
            Position::default(),
            Position {
                c: xf_b.position,
                a: 0.0,
            },
        ];
        let velocities = vec![
            Velocity::default(),
            Velocity {
                v: Vec2::new(0.5, -2.0),
                w: 0.0,
            },
        ];
        (ContactSolver::new(step, &[input]), positions, velocities)
    }

    #[test]
    fn test_block_solver_stops_normal_motion() {
        let (mut solver, positions, mut velocities) = resting_box(0.0, true);
        solver.initialize_velocity_constraints(&positions, &velocities);
        solver.warm_start(&mut velocities);
        for _ in 0..8 {
            solver.solve_velocity_constraints(&mut velocities);
        }

        assert!(velocities[1].v.y.abs() < 1e-9);
        assert!(velocities[1].w.abs() < 1e-9);
        // Friction slows the slide.
        assert!(velocities[1].v.x.abs() < 0.5);

        let impulse = solver.impulse(0);
        assert_eq!(impulse.normal_impulses.len(), 2);
        let total: f64 = impulse.normal_impulses.iter().sum();
        assert_relative_eq!(total, 2.0, epsilon = 1e-9);
        assert!(impulse.tangent_impulses.iter().sum::<f64>() < 0.0);
    }

    #[test]
    fn test_restitution_bias_bounces() {
        let (mut solver, positions, mut velocities) = resting_box(0.0, false);
        solver.velocity_constraints[0].restitution = 1.0;
        solver.initialize_velocity_constraints(&positions, &velocities);
        for _ in 0..8 {
            solver.solve_velocity_constraints(&mut velocities);
        }
        assert_relative_eq!(velocities[1].v.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_position_solver_resolves_overlap() {
        let (solver, mut positions, _) = resting_box(-0.1, true);
        let start = positions[1].c.y;
        assert!(!solver.solve_position_constraints(&mut positions));
        assert!(positions[1].c.y > start);

        let mut solved = false;
        for _ in 0..100 {
            if solver.solve_position_constraints(&mut positions) {
                solved = true;
                break;
            }
        }
        assert!(solved);
        assert_eq!(positions[0].c, Vec2::ZERO);
    }

    #[test]
    fn test_toi_position_solver_moves_only_toi_bodies() {
        let (solver, mut positions, _) = resting_box(-0.1, true);
        let before = positions.clone();
        // Body 1 is not part of the TOI pair: nothing moves.
        solver.solve_toi_position_constraints(&mut positions, 0, 2);
        assert_eq!(positions, before);

        solver.solve_toi_position_constraints(&mut positions, 0, 1);
        assert!(positions[1].c.y > before[1].c.y);
    }
}
