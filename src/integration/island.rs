use slotmap::SlotMap;
use tracing::debug;

use crate::collision::BroadPhase;
use crate::common::settings::{ANGULAR_SLEEP_TOLERANCE, LINEAR_SLEEP_TOLERANCE, TIME_TO_SLEEP};
use crate::constraints::contact_solver::ContactConstraintInput;
use crate::constraints::{ContactSolver, JointEntry};
use crate::integration::integrator::{integrate_positions, integrate_velocity};
use crate::integration::time_step::{Position, SolverBody, SolverData, TimeStep, Velocity};
use crate::math::Vec2;
use crate::objects::{
    BodyHandle, BodyType, Contact, ContactHandle, Fixture, FixtureHandle, JointHandle, ProxyKey, RigidBody,
};
use crate::world::{ContactListener, WorldQuery};

/// Borrowed world state an island is solved against.
pub(crate) struct IslandContext<'a> {
    pub bodies: &'a mut SlotMap<BodyHandle, RigidBody>,
    pub fixtures: &'a SlotMap<FixtureHandle, Fixture>,
    pub broad_phase: &'a BroadPhase<ProxyKey>,
    pub contacts: &'a mut SlotMap<ContactHandle, Contact>,
    pub joints: &'a mut SlotMap<JointHandle, JointEntry>,
    pub listener: Option<&'a mut dyn ContactListener>,
}

fn solver_body(body: &RigidBody) -> SolverBody {
    SolverBody {
        index: body.island_index,
        local_center: body.sweep.local_center,
        inv_mass: body.inv_mass,
        inv_inertia: body.inv_inertia,
    }
}

/// A connected group of bodies, contacts and joints solved together.
/// Rebuilt from scratch every step; the buffers are reused.
#[derive(Debug, Default)]
pub struct Island {
    pub(crate) bodies: Vec<BodyHandle>,
    pub(crate) contacts: Vec<ContactHandle>,
    pub(crate) joints: Vec<JointHandle>,
    positions: Vec<Position>,
    velocities: Vec<Velocity>,
}

impl Island {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub(crate) fn add_body(&mut self, handle: BodyHandle, body: &mut RigidBody) {
        body.island_index = self.bodies.len();
        self.bodies.push(handle);
    }

    pub(crate) fn add_contact(&mut self, handle: ContactHandle) {
        self.contacts.push(handle);
    }

    pub(crate) fn add_joint(&mut self, handle: JointHandle) {
        self.joints.push(handle);
    }

    /// Gathers solver inputs for every contact of the island, returned with
    /// the parallel list of contact handles.
    fn contact_inputs(&self, ctx: &IslandContext<'_>) -> (Vec<ContactHandle>, Vec<ContactConstraintInput>) {
        self.contacts
            .iter()
            .filter_map(|&handle| {
                let contact = ctx.contacts.get(handle)?;
                let fixture_a = ctx.fixtures.get(contact.fixture_a)?;
                let fixture_b = ctx.fixtures.get(contact.fixture_b)?;
                let body_a = ctx.bodies.get(contact.body_a)?;
                let body_b = ctx.bodies.get(contact.body_b)?;
                let input = ContactConstraintInput {
                    manifold: contact.manifold.clone(),
                    friction: contact.friction,
                    restitution: contact.restitution,
                    tangent_speed: contact.tangent_speed,
                    radius_a: fixture_a.shape().radius(),
                    radius_b: fixture_b.shape().radius(),
                    body_a: solver_body(body_a),
                    body_b: solver_body(body_b),
                };
                Some((handle, input))
            })
            .unzip()
    }

    /// Copies the solver state back into the bodies.
    fn write_back(&self, ctx: &mut IslandContext<'_>) {
        for (i, handle) in self.bodies.iter().enumerate() {
            let Some(body) = ctx.bodies.get_mut(*handle) else {
                continue;
            };
            body.sweep.c = self.positions[i].c;
            body.sweep.a = self.positions[i].a;
            body.linear_velocity = self.velocities[i].v;
            body.angular_velocity = self.velocities[i].w;
            body.synchronize_transform();
        }
    }

    fn report(&self, solver: &ContactSolver, handles: &[ContactHandle], ctx: &mut IslandContext<'_>) {
        let Some(listener) = ctx.listener.as_deref_mut() else {
            return;
        };
        let world = WorldQuery::new(ctx.broad_phase, &*ctx.bodies, ctx.fixtures, &*ctx.contacts);
        for (i, handle) in handles.iter().enumerate() {
            if let Some(contact) = ctx.contacts.get(*handle) {
                listener.post_solve(contact, &solver.impulse(i), &world);
            }
        }
    }

    /// Integrates velocities, solves contacts and joints, integrates
    /// positions, then decides whether the island goes to sleep.
    /// Returns true if the island was put to sleep.
    pub(crate) fn solve(&mut self, step: &TimeStep, gravity: Vec2, allow_sleep: bool, ctx: &mut IslandContext<'_>) -> bool {
        let h = step.dt;

        // Gravity, forces and damping.
        self.positions.clear();
        self.velocities.clear();
        for handle in &self.bodies {
            let (position, velocity) = match ctx.bodies.get_mut(*handle) {
                Some(body) => {
                    // Start of the sweep for the TOI pass.
                    body.sweep.c0 = body.sweep.c;
                    body.sweep.a0 = body.sweep.a;
                    (
                        Position {
                            c: body.sweep.c,
                            a: body.sweep.a,
                        },
                        integrate_velocity(body, gravity, h),
                    )
                }
                None => Default::default(),
            };
            self.positions.push(position);
            self.velocities.push(velocity);
        }

        let (contact_handles, inputs) = self.contact_inputs(ctx);
        let mut contact_solver = ContactSolver::new(*step, &inputs);
        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);

        if step.warm_starting {
            contact_solver.warm_start(&mut self.velocities);
        }

        let mut data = SolverData {
            step: *step,
            positions: &mut self.positions,
            velocities: &mut self.velocities,
        };

        for handle in &self.joints {
            let Some(entry) = ctx.joints.get_mut(*handle) else {
                continue;
            };
            let (Some(body_a), Some(body_b)) = (ctx.bodies.get(entry.joint.body_a()), ctx.bodies.get(entry.joint.body_b()))
            else {
                continue;
            };
            let (body_a, body_b) = (solver_body(body_a), solver_body(body_b));
            entry.joint.init_velocity_constraints(&body_a, &body_b, &mut data);
        }

        for _ in 0..step.velocity_iterations {
            for handle in &self.joints {
                if let Some(entry) = ctx.joints.get_mut(*handle) {
                    entry.joint.solve_velocity_constraints(&mut data);
                }
            }
            contact_solver.solve_velocity_constraints(data.velocities);
        }

        contact_solver.store_impulses(&contact_handles, ctx.contacts);

        integrate_positions(data.positions, data.velocities, h);

        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_okay = contact_solver.solve_position_constraints(data.positions);

            let mut joints_okay = true;
            for handle in &self.joints {
                if let Some(entry) = ctx.joints.get_mut(*handle) {
                    let joint_okay = entry.joint.solve_position_constraints(&mut data);
                    joints_okay = joints_okay && joint_okay;
                }
            }

            if contacts_okay && joints_okay {
                position_solved = true;
                break;
            }
        }

        self.write_back(ctx);

        self.report(&contact_solver, &contact_handles, ctx);

        if !allow_sleep {
            return false;
        }

        let mut min_sleep_time = f64::MAX;

        let lin_tol_sqr = LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE;
        let ang_tol_sqr = ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE;

        for handle in &self.bodies {
            let Some(body) = ctx.bodies.get_mut(*handle) else {
                continue;
            };
            if body.body_type == BodyType::Static {
                continue;
            }

            if !body.allow_sleep
                || body.angular_velocity * body.angular_velocity > ang_tol_sqr
                || body.linear_velocity.magnitude_squared() > lin_tol_sqr
            {
                body.sleep_time = 0.0;
                min_sleep_time = 0.0;
            } else {
                body.sleep_time += h;
                min_sleep_time = min_sleep_time.min(body.sleep_time);
            }
        }

        if min_sleep_time >= TIME_TO_SLEEP && position_solved {
            for handle in &self.bodies {
                if let Some(body) = ctx.bodies.get_mut(*handle) {
                    body.set_awake(false);
                }
            }
            debug!(bodies = self.bodies.len(), "island fell asleep");
            return true;
        }

        false
    }

    /// Solves a TOI sub-step. Only the bodies at `toi_index_a` and
    /// `toi_index_b` are moved by the position pass.
    pub(crate) fn solve_toi(&mut self, sub_step: &TimeStep, toi_index_a: usize, toi_index_b: usize, ctx: &mut IslandContext<'_>) {
        debug_assert!(toi_index_a < self.bodies.len());
        debug_assert!(toi_index_b < self.bodies.len());

        self.positions.clear();
        self.velocities.clear();
        for handle in &self.bodies {
            let (position, velocity) = match ctx.bodies.get(*handle) {
                Some(body) => (
                    Position {
                        c: body.sweep.c,
                        a: body.sweep.a,
                    },
                    Velocity {
                        v: body.linear_velocity,
                        w: body.angular_velocity,
                    },
                ),
                None => Default::default(),
            };
            self.positions.push(position);
            self.velocities.push(velocity);
        }

        let (contact_handles, inputs) = self.contact_inputs(ctx);
        let mut contact_solver = ContactSolver::new(*sub_step, &inputs);

        for _ in 0..sub_step.position_iterations {
            if contact_solver.solve_toi_position_constraints(&mut self.positions, toi_index_a, toi_index_b) {
                break;
            }
        }

        // The pushed-apart pose becomes the new sweep start.
        for index in [toi_index_a, toi_index_b] {
            if let Some(body) = ctx.bodies.get_mut(self.bodies[index]) {
                body.sweep.c0 = self.positions[index].c;
                body.sweep.a0 = self.positions[index].a;
            }
        }

        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);

        for _ in 0..sub_step.velocity_iterations {
            contact_solver.solve_velocity_constraints(&mut self.velocities);
        }

        // Impulses are not stored back.

        integrate_positions(&mut self.positions, &mut self.velocities, sub_step.dt);

        self.write_back(ctx);

        self.report(&contact_solver, &contact_handles, ctx);
    }
}
