pub mod contact;
pub mod fixture;
pub mod rigid_body;

pub use contact::Contact;
pub use fixture::{Filter, Fixture, FixtureDef, FixtureProxy, ProxyKey};
pub use rigid_body::{BodyDef, BodyType, RigidBody};

slotmap::new_key_type! {
    /// Generational handle to a body owned by a world.
    pub struct BodyHandle;
    /// Generational handle to a fixture owned by a world.
    pub struct FixtureHandle;
    /// Generational handle to a joint owned by a world.
    pub struct JointHandle;
    /// Generational handle to a live contact.
    pub struct ContactHandle;
}
