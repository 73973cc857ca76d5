use crate::math::Vec2;

/// Parameters of one solver pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    pub dt: f64,
    /// Zero when `dt` is zero.
    pub inv_dt: f64,
    /// `dt * inv_dt0`; scales warm starting impulses when the step size changes.
    pub dt_ratio: f64,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub warm_starting: bool,
}

impl TimeStep {
    pub fn new(dt: f64, velocity_iterations: usize, position_iterations: usize) -> Self {
        Self {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: 1.0,
            velocity_iterations,
            position_iterations,
            warm_starting: true,
        }
    }
}

/// Solver copy of a body's center of mass and angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub c: Vec2,
    pub a: f64,
}

/// Solver copy of a body's velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub v: Vec2,
    pub w: f64,
}

/// Per-body constants needed by a constraint, captured when the island is built.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverBody {
    /// Index into the island's position and velocity arrays.
    pub index: usize,
    pub local_center: Vec2,
    pub inv_mass: f64,
    pub inv_inertia: f64,
}

/// Everything a constraint reads and writes while an island is solved.
#[derive(Debug)]
pub struct SolverData<'a> {
    pub step: TimeStep,
    pub positions: &'a mut [Position],
    pub velocities: &'a mut [Velocity],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_step_inverse() {
        let step = TimeStep::new(0.5, 8, 3);
        assert_eq!(step.inv_dt, 2.0);
        assert_eq!(step.dt_ratio, 1.0);
        assert!(step.warm_starting);

        let zero = TimeStep::new(0.0, 8, 3);
        assert_eq!(zero.inv_dt, 0.0);
    }
}
