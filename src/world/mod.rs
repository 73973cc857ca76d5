pub mod callbacks;
pub mod config;
pub(crate) mod contact_manager;
pub mod physics_world;
pub mod query;

pub use callbacks::{ContactFilter, ContactListener, DefaultContactFilter};
pub use config::WorldConfig;
pub use physics_world::{PhysicsWorld, StepStats};
pub use query::WorldQuery;
