use std::any::Any;
use std::fmt::Debug;

use crate::integration::{SolverBody, SolverData};
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;
use crate::objects::BodyHandle;

pub mod contact_solver;
pub mod distance_joint;
pub mod motor_joint;
pub mod revolute_joint;

// Re-export the constraint types for easier access
pub use contact_solver::{ContactImpulse, ContactSolver};
pub use distance_joint::{DistanceJoint, DistanceJointDef};
pub use motor_joint::{MotorJoint, MotorJointDef};
pub use revolute_joint::{RevoluteJoint, RevoluteJointDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    Distance,
    Revolute,
    Motor,
}

/// A constraint between two bodies, solved alongside contacts.
///
/// The solver drives every joint through the same two-phase contract:
/// velocity constraints are initialized once per step and iterated, then
/// position constraints are iterated after integration until they report
/// convergence.
pub trait Joint: Any + Debug {
    fn joint_type(&self) -> JointType;

    fn body_a(&self) -> BodyHandle;

    fn body_b(&self) -> BodyHandle;

    /// Whether the connected bodies may still collide with each other.
    fn collide_connected(&self) -> bool;

    /// Anchor on body A in body A's coordinates.
    fn local_anchor_a(&self) -> Vec2;

    /// Anchor on body B in body B's coordinates.
    fn local_anchor_b(&self) -> Vec2;

    /// World anchor on body A.
    fn anchor_a(&self, body_a: &RigidBody) -> Vec2 {
        body_a.world_point(self.local_anchor_a())
    }

    /// World anchor on body B.
    fn anchor_b(&self, body_b: &RigidBody) -> Vec2 {
        body_b.world_point(self.local_anchor_b())
    }

    /// Reaction force on body B at the joint anchor, in newtons.
    fn reaction_force(&self, inv_dt: f64) -> Vec2;

    /// Reaction torque on body B, in newton-meters.
    fn reaction_torque(&self, inv_dt: f64) -> f64;

    fn init_velocity_constraints(&mut self, body_a: &SolverBody, body_b: &SolverBody, data: &mut SolverData<'_>);

    fn solve_velocity_constraints(&mut self, data: &mut SolverData<'_>);

    /// Returns true when the position error is within tolerance.
    fn solve_position_constraints(&mut self, data: &mut SolverData<'_>) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creation parameters for any joint type.
#[derive(Debug, Clone, PartialEq)]
pub enum JointDef {
    Distance(DistanceJointDef),
    Revolute(RevoluteJointDef),
    Motor(MotorJointDef),
}

impl JointDef {
    pub fn body_a(&self) -> BodyHandle {
        match self {
            JointDef::Distance(def) => def.body_a,
            JointDef::Revolute(def) => def.body_a,
            JointDef::Motor(def) => def.body_a,
        }
    }

    pub fn body_b(&self) -> BodyHandle {
        match self {
            JointDef::Distance(def) => def.body_b,
            JointDef::Revolute(def) => def.body_b,
            JointDef::Motor(def) => def.body_b,
        }
    }

    pub fn collide_connected(&self) -> bool {
        match self {
            JointDef::Distance(def) => def.collide_connected,
            JointDef::Revolute(def) => def.collide_connected,
            JointDef::Motor(def) => def.collide_connected,
        }
    }

    pub(crate) fn build(&self) -> Box<dyn Joint> {
        match self {
            JointDef::Distance(def) => Box::new(DistanceJoint::new(def)),
            JointDef::Revolute(def) => Box::new(RevoluteJoint::new(def)),
            JointDef::Motor(def) => Box::new(MotorJoint::new(def)),
        }
    }
}

impl From<DistanceJointDef> for JointDef {
    fn from(def: DistanceJointDef) -> Self {
        JointDef::Distance(def)
    }
}

impl From<RevoluteJointDef> for JointDef {
    fn from(def: RevoluteJointDef) -> Self {
        JointDef::Revolute(def)
    }
}

impl From<MotorJointDef> for JointDef {
    fn from(def: MotorJointDef) -> Self {
        JointDef::Motor(def)
    }
}

/// A joint as stored by the world, with its island bookkeeping.
#[derive(Debug)]
pub(crate) struct JointEntry {
    pub joint: Box<dyn Joint>,
    pub island_flag: bool,
}

/// Shared body data a joint caches in `init_velocity_constraints`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct JointBodies {
    pub index_a: usize,
    pub index_b: usize,
    pub local_center_a: Vec2,
    pub local_center_b: Vec2,
    pub inv_mass_a: f64,
    pub inv_mass_b: f64,
    pub inv_i_a: f64,
    pub inv_i_b: f64,
}

impl JointBodies {
    pub fn new(a: &SolverBody, b: &SolverBody) -> Self {
        Self {
            index_a: a.index,
            index_b: b.index,
            local_center_a: a.local_center,
            local_center_b: b.local_center,
            inv_mass_a: a.inv_mass,
            inv_mass_b: b.inv_mass,
            inv_i_a: a.inv_inertia,
            inv_i_b: b.inv_inertia,
        }
    }
}
