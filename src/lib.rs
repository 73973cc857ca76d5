//! A 2-D rigid body physics engine.
//!
//! Bodies carry fixtures (shapes with material and filtering data), the
//! broad-phase finds candidate pairs, the narrow-phase builds persistent
//! contact manifolds and a sequential impulse solver resolves contacts and
//! joints island by island. Fast bodies are swept for time of impact so they
//! do not tunnel through thin geometry.
//!
//! ```
//! use impulse2d::{BodyDef, FixtureDef, PhysicsWorld, Polygon, Vec2};
//!
//! let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
//! let ground = world.create_body(&BodyDef::fixed(Vec2::new(0.0, -10.0))).unwrap();
//! world.create_fixture(ground, &FixtureDef::new(Polygon::new_box(50.0, 10.0))).unwrap();
//!
//! let body = world.create_body(&BodyDef::dynamic(Vec2::new(0.0, 4.0))).unwrap();
//! world
//!     .create_fixture(body, &FixtureDef::new(Polygon::new_box(1.0, 1.0)).with_density(1.0).with_friction(0.3))
//!     .unwrap();
//!
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0, 6, 2);
//! }
//! assert!(world.body(body).unwrap().position().y < 4.0);
//! ```

pub mod collision;
pub mod common;
pub mod constraints;
pub mod error;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{Manifold, RayCastInput, RayCastOutput, AABB};
pub use common::Material;
pub use constraints::{
    ContactImpulse, DistanceJoint, DistanceJointDef, Joint, JointDef, JointType, MotorJoint, MotorJointDef,
    RevoluteJoint, RevoluteJointDef,
};
pub use error::{WorldError, WorldResult};
pub use math::{Rot, Transform, Vec2};
pub use objects::{
    BodyDef, BodyHandle, BodyType, Contact, ContactHandle, Filter, Fixture, FixtureDef, FixtureHandle, JointHandle,
    RigidBody,
};
pub use shapes::{Chain, Circle, Edge, MassData, Polygon, Shape, ShapeType};
pub use world::{ContactFilter, ContactListener, PhysicsWorld, StepStats, WorldConfig, WorldQuery};
