//! World-level simulation switches.

use crate::math::Vec2;

/// Configuration for a [`PhysicsWorld`](crate::world::PhysicsWorld).
///
/// # Builder Pattern
/// ```
/// use impulse2d::world::WorldConfig;
/// use impulse2d::Vec2;
///
/// let config = WorldConfig::new()
///     .with_gravity(Vec2::new(0.0, -9.8))
///     .with_allow_sleeping(false)
///     .with_max_toi_events(16);
/// assert_eq!(config.max_toi_events, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    /// Gravity acceleration. Default: (0, -10).
    pub gravity: Vec2,
    /// Let islands at rest fall asleep. Default: true.
    pub allow_sleeping: bool,
    /// Seed the solver with the previous step's impulses. Default: true.
    pub warm_starting: bool,
    /// Resolve time of impact events for fast bodies. Default: true.
    pub continuous_physics: bool,
    /// Stop after one TOI event per step and finish on the next call.
    /// Meant for debugging. Default: false.
    pub sub_stepping: bool,
    /// Maximum TOI events resolved per step. Default: 64.
    pub max_toi_events: usize,
}

impl WorldConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        WorldConfig {
            gravity: Vec2::new(0.0, -10.0),
            allow_sleeping: true,
            warm_starting: true,
            continuous_physics: true,
            sub_stepping: false,
            max_toi_events: 64,
        }
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_allow_sleeping(mut self, flag: bool) -> Self {
        self.allow_sleeping = flag;
        self
    }

    pub fn with_warm_starting(mut self, flag: bool) -> Self {
        self.warm_starting = flag;
        self
    }

    pub fn with_continuous_physics(mut self, flag: bool) -> Self {
        self.continuous_physics = flag;
        self
    }

    pub fn with_sub_stepping(mut self, flag: bool) -> Self {
        self.sub_stepping = flag;
        self
    }

    /// At least one event is always allowed.
    pub fn with_max_toi_events(mut self, count: usize) -> Self {
        self.max_toi_events = count.max(1);
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new()
    }
}
