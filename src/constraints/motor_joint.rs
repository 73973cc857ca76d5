use std::any::Any;

use super::{Joint, JointBodies, JointType};
use crate::integration::{SolverBody, SolverData};
use crate::math::{Mat22, Rot, Vec2};
use crate::objects::rigid_body::RigidBody;
use crate::objects::BodyHandle;

/// Creation parameters for a [`MotorJoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct MotorJointDef {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub collide_connected: bool,
    /// Target position of body B in body A's frame.
    pub linear_offset: Vec2,
    /// Target angle of body B minus angle of body A, in radians.
    pub angular_offset: f64,
    /// Maximum motor force in newtons.
    pub max_force: f64,
    /// Maximum motor torque in newton-meters.
    pub max_torque: f64,
    /// Position correction factor in `[0, 1]`.
    pub correction_factor: f64,
}

impl Default for MotorJointDef {
    fn default() -> Self {
        Self {
            body_a: BodyHandle::default(),
            body_b: BodyHandle::default(),
            collide_connected: false,
            linear_offset: Vec2::ZERO,
            angular_offset: 0.0,
            max_force: 1.0,
            max_torque: 1.0,
            correction_factor: 0.3,
        }
    }
}

impl MotorJointDef {
    /// Targets the current relative placement of the two bodies.
    pub fn initialize(handle_a: BodyHandle, body_a: &RigidBody, handle_b: BodyHandle, body_b: &RigidBody) -> Self {
        Self {
            body_a: handle_a,
            body_b: handle_b,
            linear_offset: body_a.local_point(body_b.position()),
            angular_offset: body_b.angle() - body_a.angle(),
            ..Default::default()
        }
    }
}

/// Drives body B towards a position and angle relative to body A, with
/// bounded force and torque. Typically used to move a body around a
/// static one as if by a muscle.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    collide_connected: bool,
    linear_offset: Vec2,
    angular_offset: f64,
    max_force: f64,
    max_torque: f64,
    correction_factor: f64,

    linear_impulse: Vec2,
    angular_impulse: f64,

    bodies: JointBodies,
    r_a: Vec2,
    r_b: Vec2,
    linear_error: Vec2,
    angular_error: f64,
    linear_mass: Mat22,
    angular_mass: f64,
}

impl MotorJoint {
    pub fn new(def: &MotorJointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            linear_offset: def.linear_offset,
            angular_offset: def.angular_offset,
            max_force: def.max_force,
            max_torque: def.max_torque,
            correction_factor: def.correction_factor,
            linear_impulse: Vec2::ZERO,
            angular_impulse: 0.0,
            bodies: JointBodies::default(),
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            linear_error: Vec2::ZERO,
            angular_error: 0.0,
            linear_mass: Mat22::ZERO,
            angular_mass: 0.0,
        }
    }

    pub fn linear_offset(&self) -> Vec2 {
        self.linear_offset
    }

    /// Does not wake the bodies.
    pub fn set_linear_offset(&mut self, offset: Vec2) {
        self.linear_offset = offset;
    }

    pub fn angular_offset(&self) -> f64 {
        self.angular_offset
    }

    pub fn set_angular_offset(&mut self, offset: f64) {
        self.angular_offset = offset;
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn set_max_force(&mut self, force: f64) {
        self.max_force = force.max(0.0);
    }

    pub fn max_torque(&self) -> f64 {
        self.max_torque
    }

    pub fn set_max_torque(&mut self, torque: f64) {
        self.max_torque = torque.max(0.0);
    }

    pub fn correction_factor(&self) -> f64 {
        self.correction_factor
    }

    pub fn set_correction_factor(&mut self, factor: f64) {
        self.correction_factor = factor.clamp(0.0, 1.0);
    }
}

impl Joint for MotorJoint {
    fn joint_type(&self) -> JointType {
        JointType::Motor
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

    /// The motor acts between the body origins.
    fn local_anchor_a(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn local_anchor_b(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn reaction_force(&self, inv_dt: f64) -> Vec2 {
        self.linear_impulse * inv_dt
    }

    fn reaction_torque(&self, inv_dt: f64) -> f64 {
        inv_dt * self.angular_impulse
    }

    fn init_velocity_constraints(&mut self, body_a: &SolverBody, body_b: &SolverBody, data: &mut SolverData<'_>) {
        self.bodies = JointBodies::new(body_a, body_b);
        let b = self.bodies;
        let (m_a, m_b, i_a, i_b) = (b.inv_mass_a, b.inv_mass_b, b.inv_i_a, b.inv_i_b);

        let c_a = data.positions[b.index_a].c;
        let a_a = data.positions[b.index_a].a;
        let mut v_a = data.velocities[b.index_a].v;
        let mut w_a = data.velocities[b.index_a].w;

        let c_b = data.positions[b.index_b].c;
        let a_b = data.positions[b.index_b].a;
        let mut v_b = data.velocities[b.index_b].v;
        let mut w_b = data.velocities[b.index_b].w;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        self.r_a = q_a.apply(-b.local_center_a);
        self.r_b = q_b.apply(-b.local_center_b);
        let (r_a, r_b) = (self.r_a, self.r_b);

        let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
        let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
        let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
        self.linear_mass = Mat22::new(Vec2::new(k11, k12), Vec2::new(k12, k22)).inverse();

        self.angular_mass = i_a + i_b;
        if self.angular_mass > 0.0 {
            self.angular_mass = 1.0 / self.angular_mass;
        }

        self.linear_error = c_b + r_b - c_a - r_a - q_a.apply(self.linear_offset);
        self.angular_error = a_b - a_a - self.angular_offset;

        if data.step.warm_starting {
            // Rescale for a changed time step.
            self.linear_impulse *= data.step.dt_ratio;
            self.angular_impulse *= data.step.dt_ratio;

            let p = self.linear_impulse;
            v_a -= p * m_a;
            w_a -= i_a * (r_a.cross(p) + self.angular_impulse);
            v_b += p * m_b;
            w_b += i_b * (r_b.cross(p) + self.angular_impulse);
        } else {
            self.linear_impulse = Vec2::ZERO;
            self.angular_impulse = 0.0;
        }

        data.velocities[b.index_a].v = v_a;
        data.velocities[b.index_a].w = w_a;
        data.velocities[b.index_b].v = v_b;
        data.velocities[b.index_b].w = w_b;
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData<'_>) {
        let b = self.bodies;
        let (m_a, m_b, i_a, i_b) = (b.inv_mass_a, b.inv_mass_b, b.inv_i_a, b.inv_i_b);

        let mut v_a = data.velocities[b.index_a].v;
        let mut w_a = data.velocities[b.index_a].w;
        let mut v_b = data.velocities[b.index_b].v;
        let mut w_b = data.velocities[b.index_b].w;

        let h = data.step.dt;
        let inv_h = data.step.inv_dt;

        // Angular
        {
            let cdot = w_b - w_a + inv_h * self.correction_factor * self.angular_error;
            let mut impulse = -self.angular_mass * cdot;

            let old_impulse = self.angular_impulse;
            let max_impulse = h * self.max_torque;
            self.angular_impulse = (old_impulse + impulse).clamp(-max_impulse, max_impulse);
            impulse = self.angular_impulse - old_impulse;

            w_a -= i_a * impulse;
            w_b += i_b * impulse;
        }

        // Linear
        {
            let (r_a, r_b) = (self.r_a, self.r_b);
            let cdot = v_b + Vec2::scalar_cross(w_b, r_b) - v_a - Vec2::scalar_cross(w_a, r_a)
                + self.linear_error * (inv_h * self.correction_factor);

            let mut impulse = -self.linear_mass.apply(cdot);
            let old_impulse = self.linear_impulse;
            self.linear_impulse += impulse;

            let max_impulse = h * self.max_force;
            if self.linear_impulse.magnitude_squared() > max_impulse * max_impulse {
                self.linear_impulse = self.linear_impulse.normalize() * max_impulse;
            }

            impulse = self.linear_impulse - old_impulse;

            v_a -= impulse * m_a;
            w_a -= i_a * r_a.cross(impulse);
            v_b += impulse * m_b;
            w_b += i_b * r_b.cross(impulse);
        }

        data.velocities[b.index_a].v = v_a;
        data.velocities[b.index_a].w = w_a;
        data.velocities[b.index_b].v = v_b;
        data.velocities[b.index_b].w = w_b;
    }

    fn solve_position_constraints(&mut self, _data: &mut SolverData<'_>) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
