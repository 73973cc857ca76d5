use std::any::Any;

use super::{Joint, JointBodies, JointType};
use crate::common::settings::LINEAR_SLOP;
use crate::integration::{SolverBody, SolverData};
use crate::math::{Mat22, Rot, Vec2};
use crate::objects::rigid_body::RigidBody;
use crate::objects::BodyHandle;

/// Creation parameters for a [`RevoluteJoint`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevoluteJointDef {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub collide_connected: bool,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Body B angle minus body A angle in the reference state.
    pub reference_angle: f64,
}

impl RevoluteJointDef {
    /// Pins both bodies together at a world anchor.
    pub fn initialize(handle_a: BodyHandle, body_a: &RigidBody, handle_b: BodyHandle, body_b: &RigidBody, anchor: Vec2) -> Self {
        Self {
            body_a: handle_a,
            body_b: handle_b,
            collide_connected: false,
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            reference_angle: body_b.angle() - body_a.angle(),
        }
    }
}

/// Forces two anchor points to coincide while leaving relative rotation free.
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    collide_connected: bool,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    reference_angle: f64,

    impulse: Vec2,

    bodies: JointBodies,
    r_a: Vec2,
    r_b: Vec2,
    mass: Mat22,
}

/// Effective mass of a point-to-point constraint.
fn point_mass(b: &JointBodies, r_a: Vec2, r_b: Vec2) -> Mat22 {
    let (m_a, m_b, i_a, i_b) = (b.inv_mass_a, b.inv_mass_b, b.inv_i_a, b.inv_i_b);

    // J = [-I -r1_skew I r2_skew]
    // K = J * invM * JT
    let ex_x = m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b;
    let ey_x = -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b;
    let ey_y = m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b;
    Mat22::new(Vec2::new(ex_x, ey_x), Vec2::new(ey_x, ey_y))
}

impl RevoluteJoint {
    pub fn new(def: &RevoluteJointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            reference_angle: def.reference_angle,
            impulse: Vec2::ZERO,
            bodies: JointBodies::default(),
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: Mat22::ZERO,
        }
    }

    pub fn reference_angle(&self) -> f64 {
        self.reference_angle
    }

    /// Current relative angle, zero in the reference state.
    pub fn joint_angle(&self, body_a: &RigidBody, body_b: &RigidBody) -> f64 {
        body_b.angle() - body_a.angle() - self.reference_angle
    }

    /// Relative angular velocity.
    pub fn joint_speed(&self, body_a: &RigidBody, body_b: &RigidBody) -> f64 {
        body_b.angular_velocity() - body_a.angular_velocity()
    }
}

impl Joint for RevoluteJoint {
    fn joint_type(&self) -> JointType {
        JointType::Revolute
    }

    fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    fn local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    fn local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    fn reaction_force(&self, inv_dt: f64) -> Vec2 {
        self.impulse * inv_dt
    }

    fn reaction_torque(&self, _inv_dt: f64) -> f64 {
        0.0
    }

    fn init_velocity_constraints(&mut self, body_a: &SolverBody, body_b: &SolverBody, data: &mut SolverData<'_>) {
        self.bodies = JointBodies::new(body_a, body_b);
        let b = self.bodies;

        let a_a = data.positions[b.index_a].a;
        let a_b = data.positions[b.index_b].a;
        let mut v_a = data.velocities[b.index_a].v;
        let mut w_a = data.velocities[b.index_a].w;
        let mut v_b = data.velocities[b.index_b].v;
        let mut w_b = data.velocities[b.index_b].w;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        self.r_a = q_a.apply(self.local_anchor_a - b.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - b.local_center_b);
        self.mass = point_mass(&b, self.r_a, self.r_b);

        if data.step.warm_starting {
            // Rescale for a changed time step.
            self.impulse *= data.step.dt_ratio;

            let p = self.impulse;
            v_a -= p * b.inv_mass_a;
            w_a -= b.inv_i_a * self.r_a.cross(p);
            v_b += p * b.inv_mass_b;
            w_b += b.inv_i_b * self.r_b.cross(p);
        } else {
            self.impulse = Vec2::ZERO;
        }

        data.velocities[b.index_a].v = v_a;
        data.velocities[b.index_a].w = w_a;
        data.velocities[b.index_b].v = v_b;
        data.velocities[b.index_b].w = w_b;
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData<'_>) {
        let b = self.bodies;
        let mut v_a = data.velocities[b.index_a].v;
        let mut w_a = data.velocities[b.index_a].w;
        let mut v_b = data.velocities[b.index_b].v;
        let mut w_b = data.velocities[b.index_b].w;

        let cdot = v_b + Vec2::scalar_cross(w_b, self.r_b) - v_a - Vec2::scalar_cross(w_a, self.r_a);
        let impulse = self.mass.solve(-cdot);

        self.impulse += impulse;

        v_a -= impulse * b.inv_mass_a;
        w_a -= b.inv_i_a * self.r_a.cross(impulse);
        v_b += impulse * b.inv_mass_b;
        w_b += b.inv_i_b * self.r_b.cross(impulse);

        data.velocities[b.index_a].v = v_a;
        data.velocities[b.index_a].w = w_a;
        data.velocities[b.index_b].v = v_b;
        data.velocities[b.index_b].w = w_b;
    }

    fn solve_position_constraints(&mut self, data: &mut SolverData<'_>) -> bool {
        let b = self.bodies;
        let mut c_a = data.positions[b.index_a].c;
        let mut a_a = data.positions[b.index_a].a;
        let mut c_b = data.positions[b.index_b].c;
        let mut a_b = data.positions[b.index_b].a;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        let r_a = q_a.apply(self.local_anchor_a - b.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - b.local_center_b);

        let c = c_b + r_b - c_a - r_a;
        let position_error = c.magnitude();

        let k = point_mass(&b, r_a, r_b);
        let impulse = -k.solve(c);

        c_a -= impulse * b.inv_mass_a;
        a_a -= b.inv_i_a * r_a.cross(impulse);
        c_b += impulse * b.inv_mass_b;
        a_b += b.inv_i_b * r_b.cross(impulse);

        data.positions[b.index_a].c = c_a;
        data.positions[b.index_a].a = a_a;
        data.positions[b.index_b].c = c_b;
        data.positions[b.index_b].a = a_b;

        position_error <= LINEAR_SLOP
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{Position, TimeStep, Velocity};

    #[test]
    fn test_pin_pulls_anchor_together() {
        let def = RevoluteJointDef {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        let mut joint = RevoluteJoint::new(&def);
        let a = SolverBody {
            index: 0,
            ..Default::default()
        };
        let b = SolverBody {
            index: 1,
            local_center: Vec2::ZERO,
            inv_mass: 1.0,
            inv_inertia: 6.0,
        };
        let mut positions = [
            Position::default(),
            Position {
                c: Vec2::new(1.1, 0.05),
                a: 0.0,
            },
        ];
        let mut velocities = [
            Velocity::default(),
            Velocity {
                v: Vec2::new(0.0, -1.0),
                w: 0.0,
            },
        ];
        let mut data = SolverData {
            step: TimeStep::new(1.0 / 60.0, 8, 3),
            positions: &mut positions,
            velocities: &mut velocities,
        };

        joint.init_velocity_constraints(&a, &b, &mut data);
        for _ in 0..8 {
            joint.solve_velocity_constraints(&mut data);
        }
        let mut solved = false;
        for _ in 0..20 {
            if joint.solve_position_constraints(&mut data) {
                solved = true;
                break;
            }
        }
        assert!(solved);

        // The anchor of B sits on A's origin; B may swing around it.
        let q = Rot::new(positions[1].a);
        let anchor = positions[1].c + q.apply(Vec2::new(-1.0, 0.0));
        assert!(anchor.magnitude() < 2.0 * LINEAR_SLOP);
        // Anchor velocity is zero after the velocity pass.
        let r_b = Rot::new(0.0).apply(Vec2::new(-1.0, 0.0));
        let vp = velocities[1].v + Vec2::scalar_cross(velocities[1].w, r_b);
        assert!(vp.magnitude() < 1e-9);
    }
}
