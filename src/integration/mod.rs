pub mod integrator;
pub mod island;
pub mod time_step;

pub use island::Island;
pub use time_step::{Position, SolverBody, SolverData, TimeStep, Velocity};
