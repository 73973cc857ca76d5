use std::any::Any;
use std::f64::consts::PI;

use super::{Joint, JointBodies, JointType};
use crate::common::settings::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};
use crate::integration::{SolverBody, SolverData};
use crate::math::{Rot, Vec2};
use crate::objects::rigid_body::RigidBody;
use crate::objects::BodyHandle;

/// Creation parameters for a [`DistanceJoint`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceJointDef {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub collide_connected: bool,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Rest length. Should not be near zero.
    pub length: f64,
    /// Mass-spring-damper frequency in hertz. Zero makes the joint rigid.
    pub frequency_hz: f64,
    /// Damping ratio. 0 = no damping, 1 = critical damping.
    pub damping_ratio: f64,
}

impl Default for DistanceJointDef {
    fn default() -> Self {
        Self {
            body_a: BodyHandle::default(),
            body_b: BodyHandle::default(),
            collide_connected: false,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length: 1.0,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
        }
    }
}

impl DistanceJointDef {
    /// Connects two world anchors; the rest length is their current distance.
    pub fn initialize(
        handle_a: BodyHandle,
        body_a: &RigidBody,
        handle_b: BodyHandle,
        body_b: &RigidBody,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> Self {
        Self {
            body_a: handle_a,
            body_b: handle_b,
            local_anchor_a: body_a.local_point(anchor_a),
            local_anchor_b: body_b.local_point(anchor_b),
            length: anchor_a.distance(anchor_b),
            ..Default::default()
        }
    }
}

/// Keeps two anchor points at a fixed distance, either rigidly or as a
/// soft spring.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,
    collide_connected: bool,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    length: f64,
    frequency_hz: f64,
    damping_ratio: f64,

    impulse: f64,
    gamma: f64,
    bias: f64,

    bodies: JointBodies,
    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    mass: f64,
}

impl DistanceJoint {
    pub fn new(def: &DistanceJointDef) -> Self {
        Self {
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            length: def.length,
            frequency_hz: def.frequency_hz,
            damping_ratio: def.damping_ratio,
            impulse: 0.0,
            gamma: 0.0,
            bias: 0.0,
            bodies: JointBodies::default(),
            u: Vec2::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: 0.0,
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub fn frequency(&self) -> f64 {
        self.frequency_hz
    }

    pub fn set_frequency(&mut self, hz: f64) {
        self.frequency_hz = hz;
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping_ratio
    }

    pub fn set_damping_ratio(&mut self, ratio: f64) {
        self.damping_ratio = ratio;
    }
}

impl Joint for DistanceJoint {
    fn joint_type(&self) -> JointType {
        JointType::Distance
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
        self.u * (inv_dt * self.impulse)
    }

    fn reaction_torque(&self, _inv_dt: f64) -> f64 {
        0.0
    }

    fn init_velocity_constraints(&mut self, body_a: &SolverBody, body_b: &SolverBody, data: &mut SolverData<'_>) {
        self.bodies = JointBodies::new(body_a, body_b);
        let JointBodies {
            index_a,
            index_b,
            inv_mass_a: m_a,
            inv_mass_b: m_b,
            inv_i_a: i_a,
            inv_i_b: i_b,
            ..
        } = self.bodies;

        let c_a = data.positions[index_a].c;
        let a_a = data.positions[index_a].a;
        let mut v_a = data.velocities[index_a].v;
        let mut w_a = data.velocities[index_a].w;

        let c_b = data.positions[index_b].c;
        let a_b = data.positions[index_b].a;
        let mut v_b = data.velocities[index_b].v;
        let mut w_b = data.velocities[index_b].w;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        self.r_a = q_a.apply(self.local_anchor_a - self.bodies.local_center_a);
        self.r_b = q_b.apply(self.local_anchor_b - self.bodies.local_center_b);
        self.u = c_b + self.r_b - c_a - self.r_a;

        let length = self.u.magnitude();
        if length > LINEAR_SLOP {
            self.u *= 1.0 / length;
        } else {
            self.u = Vec2::ZERO;
        }

        let cr_au = self.r_a.cross(self.u);
        let cr_bu = self.r_b.cross(self.u);
        let mut inv_mass = m_a + i_a * cr_au * cr_au + m_b + i_b * cr_bu * cr_bu;

        self.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };

        if self.frequency_hz > 0.0 {
            let c = length - self.length;

            let omega = 2.0 * PI * self.frequency_hz;

            let d = 2.0 * self.mass * self.damping_ratio * omega;

            let k = self.mass * omega * omega;

            // Implicit spring: softness and bias from stiffness and damping.
            let h = data.step.dt;
            self.gamma = h * (d + h * k);
            self.gamma = if self.gamma != 0.0 { 1.0 / self.gamma } else { 0.0 };
            self.bias = c * h * k * self.gamma;

            inv_mass += self.gamma;
            self.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
        }

        if data.step.warm_starting {
            // Rescale for a changed time step.
            self.impulse *= data.step.dt_ratio;

            let p = self.u * self.impulse;
            v_a -= p * m_a;
            w_a -= i_a * self.r_a.cross(p);
            v_b += p * m_b;
            w_b += i_b * self.r_b.cross(p);
        } else {
            self.impulse = 0.0;
        }

        data.velocities[index_a].v = v_a;
        data.velocities[index_a].w = w_a;
        data.velocities[index_b].v = v_b;
        data.velocities[index_b].w = w_b;
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData<'_>) {
        let b = self.bodies;
        let mut v_a = data.velocities[b.index_a].v;
        let mut w_a = data.velocities[b.index_a].w;
        let mut v_b = data.velocities[b.index_b].v;
        let mut w_b = data.velocities[b.index_b].w;

        // Cdot = dot(u, v + cross(w, r))
        let vp_a = v_a + Vec2::scalar_cross(w_a, self.r_a);
        let vp_b = v_b + Vec2::scalar_cross(w_b, self.r_b);
        let cdot = self.u.dot(vp_b - vp_a);

        let impulse = -self.mass * (cdot + self.bias + self.gamma * self.impulse);
        self.impulse += impulse;

        let p = self.u * impulse;
        v_a -= p * b.inv_mass_a;
        w_a -= b.inv_i_a * self.r_a.cross(p);
        v_b += p * b.inv_mass_b;
        w_b += b.inv_i_b * self.r_b.cross(p);

        data.velocities[b.index_a].v = v_a;
        data.velocities[b.index_a].w = w_a;
        data.velocities[b.index_b].v = v_b;
        data.velocities[b.index_b].w = w_b;
    }

    fn solve_position_constraints(&mut self, data: &mut SolverData<'_>) -> bool {
        // Soft joints skip position correction.
        if self.frequency_hz > 0.0 {
            return true;
        }

        let b = self.bodies;
        let mut c_a = data.positions[b.index_a].c;
        let mut a_a = data.positions[b.index_a].a;
        let mut c_b = data.positions[b.index_b].c;
        let mut a_b = data.positions[b.index_b].a;

        let q_a = Rot::new(a_a);
        let q_b = Rot::new(a_b);

        let r_a = q_a.apply(self.local_anchor_a - b.local_center_a);
        let r_b = q_b.apply(self.local_anchor_b - b.local_center_b);
        let (u, length) = (c_b + r_b - c_a - r_a).normalize_with_length();
        let c = (length - self.length).clamp(-MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

        let impulse = -self.mass * c;
        let p = u * impulse;

        c_a -= p * b.inv_mass_a;
        a_a -= b.inv_i_a * r_a.cross(p);
        c_b += p * b.inv_mass_b;
        a_b += b.inv_i_b * r_b.cross(p);

        data.positions[b.index_a].c = c_a;
        data.positions[b.index_a].a = a_a;
        data.positions[b.index_b].c = c_b;
        data.positions[b.index_b].a = a_b;

        c.abs() < LINEAR_SLOP
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
