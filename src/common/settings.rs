//! Global tuning constants. Units are meters, kilograms and seconds.

use std::f64::consts::PI;

/// Maximum number of contact points between two convex shapes.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices on a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Margin added to a proxy AABB so small moves do not trigger a tree update.
pub const AABB_EXTENSION: f64 = 0.1;

/// Scales the displacement used to predict a proxy's future AABB.
pub const AABB_MULTIPLIER: f64 = 2.0;

/// Collision and constraint tolerance. Chosen to be numerically significant
/// but visually insignificant.
pub const LINEAR_SLOP: f64 = 0.005;

/// Skin radius of polygons; keeps polygon cores apart so GJK can compute
/// contact normals.
pub const POLYGON_RADIUS: f64 = 2.0 * LINEAR_SLOP;

/// Maximum number of TOI sub-steps per contact per step.
pub const MAX_SUB_STEPS: u32 = 8;

/// Maximum number of contacts handled in one TOI sub-step.
pub const MAX_TOI_CONTACTS: usize = 32;

/// Relative normal velocity below which collisions are treated as inelastic.
pub const VELOCITY_THRESHOLD: f64 = 1.0;

/// Largest linear position correction per position iteration.
pub const MAX_LINEAR_CORRECTION: f64 = 0.2;

/// Largest translation of a body in one step.
pub const MAX_TRANSLATION: f64 = 2.0;
pub const MAX_TRANSLATION_SQUARED: f64 = MAX_TRANSLATION * MAX_TRANSLATION;

/// Largest rotation of a body in one step.
pub const MAX_ROTATION: f64 = 0.5 * PI;
pub const MAX_ROTATION_SQUARED: f64 = MAX_ROTATION * MAX_ROTATION;

/// Fraction of overlap resolved per position iteration.
pub const BAUMGARTE: f64 = 0.2;
pub const TOI_BAUMGARTE: f64 = 0.75;

/// Time a body must be still before it goes to sleep.
pub const TIME_TO_SLEEP: f64 = 0.5;

pub const LINEAR_SLEEP_TOLERANCE: f64 = 0.01;
pub const ANGULAR_SLEEP_TOLERANCE: f64 = 2.0 / 180.0 * PI;

/// Upper bound for the condition number of the two-point block solver.
pub const MAX_CONDITION_NUMBER: f64 = 1000.0;

/// Iteration cap for the GJK distance loop.
pub const MAX_GJK_ITERATIONS: usize = 20;

/// Iteration cap for the conservative advancement loop in TOI.
pub const MAX_TOI_ITERATIONS: usize = 20;

/// Iteration cap for the TOI root finder.
pub const MAX_ROOT_ITERATIONS: usize = 50;
