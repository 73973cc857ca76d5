//! Small linear-algebra toolkit used throughout the engine.

pub mod mat22;
pub mod rot;
pub mod sweep;
pub mod transform;
pub mod vec2;

pub use mat22::Mat22;
pub use rot::Rot;
pub use sweep::Sweep;
pub use transform::Transform;
pub use vec2::Vec2;
