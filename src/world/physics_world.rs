use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use crate::collision::{time_of_impact, BroadPhase, DistanceProxy, ToiInput, ToiState, AABB};
use crate::common::settings::{MAX_SUB_STEPS, MAX_TOI_CONTACTS};
use crate::constraints::{Joint, JointDef, JointEntry};
use crate::error::{WorldError, WorldResult};
use crate::integration::island::IslandContext;
use crate::integration::{Island, TimeStep};
use crate::math::{Sweep, Vec2};
use crate::objects::{
    BodyDef, BodyHandle, BodyType, Contact, ContactHandle, Filter, Fixture, FixtureDef, FixtureHandle, JointHandle,
    ProxyKey, RigidBody,
};
use crate::shapes::MassData;
use crate::world::callbacks::{ContactFilter, ContactListener};
use crate::world::config::WorldConfig;
use crate::world::contact_manager::{listener_mut, ContactManager};
use crate::world::query::WorldQuery;

/// Position iterations used by the TOI sub-step solver.
const TOI_POSITION_ITERATIONS: usize = 20;

/// Counters for the most recent call to [`PhysicsWorld::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepStats {
    /// Islands solved by the discrete solver.
    pub islands: usize,
    /// Bodies solved by the discrete solver, static bodies included.
    pub bodies: usize,
    /// Live contacts at the end of the step.
    pub contacts: usize,
    /// TOI events resolved.
    pub toi_events: usize,
}

/// Moves the broad-phase proxies of a body to cover its motion over the step.
fn synchronize_fixtures(
    body: &RigidBody,
    fixtures: &mut SlotMap<FixtureHandle, Fixture>,
    broad_phase: &mut BroadPhase<ProxyKey>,
) {
    let xf1 = body.transform0();
    for handle in &body.fixtures {
        if let Some(fixture) = fixtures.get_mut(*handle) {
            fixture.synchronize(broad_phase, &xf1, &body.xf);
        }
    }
}

/// Owns every body, fixture, joint and contact and advances them in time.
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: SlotMap<BodyHandle, RigidBody>,
    fixtures: SlotMap<FixtureHandle, Fixture>,
    joints: SlotMap<JointHandle, JointEntry>,
    contact_manager: ContactManager,
    island: Island,

    new_contacts: bool,
    locked: bool,
    // False while a sub-stepped TOI pass is unfinished.
    step_complete: bool,
    // Inverse of the last positive time step, for warm starting.
    inv_dt0: f64,
    step_count: u64,
    stats: StepStats,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::with_config(WorldConfig::default())
    }
}

impl PhysicsWorld {
    /// Creates an empty world with default settings and the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self::with_config(WorldConfig::new().with_gravity(gravity))
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            bodies: SlotMap::with_key(),
            fixtures: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            contact_manager: ContactManager::default(),
            island: Island::new(),
            new_contacts: false,
            locked: false,
            step_complete: true,
            inv_dt0: 0.0,
            step_count: 0,
            stats: StepStats::default(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    /// Turning sleep off wakes every body.
    pub fn set_allow_sleeping(&mut self, flag: bool) {
        if flag == self.config.allow_sleeping {
            return;
        }
        self.config.allow_sleeping = flag;
        if !flag {
            for body in self.bodies.values_mut() {
                body.set_awake(true);
            }
        }
    }

    pub fn set_warm_starting(&mut self, flag: bool) {
        self.config.warm_starting = flag;
    }

    pub fn set_continuous_physics(&mut self, flag: bool) {
        self.config.continuous_physics = flag;
    }

    pub fn set_sub_stepping(&mut self, flag: bool) {
        self.config.sub_stepping = flag;
    }

    /// True while a step is running.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn check_unlocked(&self, operation: &str) -> WorldResult<()> {
        if self.locked {
            warn!(operation, "world is locked");
            return Err(WorldError::Locked);
        }
        Ok(())
    }

    pub fn set_contact_listener(&mut self, listener: impl ContactListener + 'static) {
        self.contact_manager.listener = Some(Box::new(listener));
    }

    pub fn clear_contact_listener(&mut self) {
        self.contact_manager.listener = None;
    }

    pub fn set_contact_filter(&mut self, filter: impl ContactFilter + 'static) {
        self.contact_manager.filter = Box::new(filter);
    }

    pub fn create_body(&mut self, def: &BodyDef) -> WorldResult<BodyHandle> {
        self.check_unlocked("create_body")?;
        Ok(self.bodies.insert(RigidBody::new(def)))
    }

    /// Destroys a body along with its joints, contacts and fixtures.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> WorldResult<()> {
        self.check_unlocked("destroy_body")?;
        let body = self.bodies.get(handle).ok_or(WorldError::InvalidBody)?;
        let joints = body.joints.clone();
        let contacts = body.contacts.clone();
        let fixtures = body.fixtures.clone();

        for joint in joints {
            self.destroy_joint(joint)?;
        }

        for contact in contacts {
            self.contact_manager.destroy(contact, &mut self.bodies, &self.fixtures);
        }

        for fixture in fixtures {
            if let Some(mut fixture) = self.fixtures.remove(fixture) {
                fixture.destroy_proxies(&mut self.contact_manager.broad_phase);
            }
        }

        self.bodies.remove(handle);
        Ok(())
    }

    /// Attaches a fixture to a body. Mass is recomputed when the fixture has
    /// density; contacts for it are created at the start of the next step.
    pub fn create_fixture(&mut self, body_handle: BodyHandle, def: &FixtureDef) -> WorldResult<FixtureHandle> {
        self.check_unlocked("create_fixture")?;
        let body = self.bodies.get_mut(body_handle).ok_or(WorldError::InvalidBody)?;
        let xf = body.xf;
        let broad_phase = &mut self.contact_manager.broad_phase;
        let handle = self.fixtures.insert_with_key(|key| {
            let mut fixture = Fixture::new(body_handle, def);
            fixture.create_proxies(broad_phase, &xf, key);
            fixture
        });
        body.fixtures.push(handle);

        if def.density > 0.0 {
            self.reset_mass_data(body_handle);
        }

        // Pairs for the new proxies are gathered at the start of the next step.
        self.new_contacts = true;
        Ok(handle)
    }

    pub fn destroy_fixture(&mut self, handle: FixtureHandle) -> WorldResult<()> {
        self.check_unlocked("destroy_fixture")?;
        let body_handle = self.fixtures.get(handle).ok_or(WorldError::InvalidFixture)?.body;

        let contacts: Vec<ContactHandle> = self
            .bodies
            .get(body_handle)
            .map(|b| b.contacts.clone())
            .unwrap_or_default();
        for contact in contacts {
            let involved = self
                .contact_manager
                .contacts
                .get(contact)
                .is_some_and(|c| c.fixture_a == handle || c.fixture_b == handle);
            if involved {
                self.contact_manager.destroy(contact, &mut self.bodies, &self.fixtures);
            }
        }

        if let Some(mut fixture) = self.fixtures.remove(handle) {
            fixture.destroy_proxies(&mut self.contact_manager.broad_phase);
        }
        if let Some(body) = self.bodies.get_mut(body_handle) {
            body.fixtures.retain(|f| *f != handle);
        }
        self.reset_mass_data(body_handle);
        Ok(())
    }

    fn reset_mass_data(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };
        let masses: Vec<MassData> = body
            .fixtures
            .iter()
            .filter_map(|f| self.fixtures.get(*f))
            .filter(|f| f.density() > 0.0)
            .map(|f| f.mass_data())
            .collect();
        body.reset_mass_data(masses.into_iter());
    }

    /// Flags every contact between two bodies for re-filtering.
    fn flag_contacts_between(&mut self, handle_a: BodyHandle, handle_b: BodyHandle) {
        let Some(body_b) = self.bodies.get(handle_b) else {
            return;
        };
        for contact in &body_b.contacts {
            if let Some(contact) = self.contact_manager.contacts.get_mut(*contact) {
                if contact.other_body(handle_b) == handle_a {
                    contact.flag_for_filtering();
                }
            }
        }
    }

    /// Creates a joint and wakes the connected bodies. Contacts between them
    /// are dropped on the next step unless the joint collides connected.
    pub fn create_joint(&mut self, def: impl Into<JointDef>) -> WorldResult<JointHandle> {
        self.check_unlocked("create_joint")?;
        let def = def.into();
        let (handle_a, handle_b) = (def.body_a(), def.body_b());
        if handle_a == handle_b {
            return Err(WorldError::SameBody);
        }
        if !self.bodies.contains_key(handle_a) || !self.bodies.contains_key(handle_b) {
            return Err(WorldError::InvalidBody);
        }

        let handle = self.joints.insert(JointEntry {
            joint: def.build(),
            island_flag: false,
        });

        for body in [handle_a, handle_b] {
            if let Some(body) = self.bodies.get_mut(body) {
                body.joints.push(handle);
                body.set_awake(true);
            }
        }

        // Existing contacts between the pair must be re-filtered.
        if !def.collide_connected() {
            self.flag_contacts_between(handle_a, handle_b);
        }

        Ok(handle)
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) -> WorldResult<()> {
        self.check_unlocked("destroy_joint")?;
        let entry = self.joints.remove(handle).ok_or(WorldError::InvalidJoint)?;
        let (handle_a, handle_b) = (entry.joint.body_a(), entry.joint.body_b());

        for body in [handle_a, handle_b] {
            if let Some(body) = self.bodies.get_mut(body) {
                body.joints.retain(|j| *j != handle);
                body.set_awake(true);
            }
        }

        // Existing contacts between the pair must be re-filtered.
        if !entry.joint.collide_connected() {
            self.flag_contacts_between(handle_a, handle_b);
        }

        Ok(())
    }

    /// Teleports a body. Contacts are refreshed on the next step.
    pub fn set_transform(&mut self, handle: BodyHandle, position: Vec2, angle: f64) -> WorldResult<()> {
        self.check_unlocked("set_transform")?;
        let body = self.bodies.get_mut(handle).ok_or(WorldError::InvalidBody)?;
        body.set_transform(position, angle);
        let xf = body.xf;
        for fixture in &body.fixtures {
            if let Some(fixture) = self.fixtures.get_mut(*fixture) {
                fixture.synchronize(&mut self.contact_manager.broad_phase, &xf, &xf);
            }
        }
        self.contact_manager
            .find_new_contacts(&mut self.bodies, &self.fixtures, &self.joints);
        Ok(())
    }

    /// Locks or unlocks rotation and recomputes mass.
    pub fn set_fixed_rotation(&mut self, handle: BodyHandle, flag: bool) -> WorldResult<()> {
        let body = self.bodies.get_mut(handle).ok_or(WorldError::InvalidBody)?;
        if body.fixed_rotation == flag {
            return Ok(());
        }
        body.set_fixed_rotation(flag);
        self.reset_mass_data(handle);
        Ok(())
    }

    /// Replaces a fixture's filter. Existing contacts are re-filtered on the
    /// next step and new pairs are searched.
    pub fn set_filter_data(&mut self, handle: FixtureHandle, filter: Filter) -> WorldResult<()> {
        let fixture = self.fixtures.get_mut(handle).ok_or(WorldError::InvalidFixture)?;
        fixture.filter = filter;
        fixture.touch_proxies(&mut self.contact_manager.broad_phase);
        let body_handle = fixture.body;

        let Some(body) = self.bodies.get(body_handle) else {
            return Ok(());
        };
        for contact in &body.contacts {
            if let Some(contact) = self.contact_manager.contacts.get_mut(*contact) {
                if contact.fixture_a == handle || contact.fixture_b == handle {
                    contact.flag_for_filtering();
                }
            }
        }
        Ok(())
    }

    /// Advances the world by `dt` seconds.
    ///
    /// Contacts are updated first, then every awake island is solved and
    /// finally fast bodies are swept for missed collisions. Forces are
    /// cleared at the end.
    pub fn step(&mut self, dt: f64, velocity_iterations: usize, position_iterations: usize) {
        if self.new_contacts {
            self.contact_manager
                .find_new_contacts(&mut self.bodies, &self.fixtures, &self.joints);
            self.new_contacts = false;
        }

        self.locked = true;
        self.stats = StepStats::default();

        let mut step = TimeStep::new(dt, velocity_iterations, position_iterations);
        step.dt_ratio = self.inv_dt0 * dt;
        step.warm_starting = self.config.warm_starting;

        // Narrow phase; may destroy contacts.
        self.contact_manager
            .collide(&mut self.bodies, &self.fixtures, &self.joints);

        if self.step_complete && step.dt > 0.0 {
            self.solve(&step);
        }

        if self.config.continuous_physics && step.dt > 0.0 {
            self.solve_toi(&step);
        }

        if step.dt > 0.0 {
            self.inv_dt0 = step.inv_dt;
        }

        self.clear_forces();

        self.locked = false;
        self.step_count += 1;
        self.stats.contacts = self.contact_manager.contacts.len();

        trace!(
            step = self.step_count,
            islands = self.stats.islands,
            bodies = self.stats.bodies,
            contacts = self.stats.contacts,
            toi_events = self.stats.toi_events,
            "step complete"
        );
    }

    fn solve(&mut self, step: &TimeStep) {
        for body in self.bodies.values_mut() {
            body.island_flag = false;
        }
        for contact in self.contact_manager.contacts.values_mut() {
            contact.island_flag = false;
        }
        for entry in self.joints.values_mut() {
            entry.island_flag = false;
        }

        let seeds: Vec<BodyHandle> = self.bodies.keys().collect();
        let mut stack: Vec<BodyHandle> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let Some(body) = self.bodies.get_mut(seed) else {
                continue;
            };
            if body.island_flag || !body.awake || body.body_type == BodyType::Static {
                continue;
            }

            self.island.clear();
            stack.clear();
            stack.push(seed);
            body.island_flag = true;

            // Depth first walk over the constraint graph.
            while let Some(handle) = stack.pop() {
                let Some(body) = self.bodies.get_mut(handle) else {
                    continue;
                };
                self.island.add_body(handle, body);

                // Static bodies join the island but do not link it further.
                if body.body_type == BodyType::Static {
                    continue;
                }

                // Wake without touching the sleep timer.
                body.awake = true;

                let contacts = body.contacts.clone();
                let joints = body.joints.clone();

                for contact_handle in contacts {
                    let Some(contact) = self.contact_manager.contacts.get_mut(contact_handle) else {
                        continue;
                    };

                    if contact.island_flag {
                        continue;
                    }

                    if !contact.enabled || !contact.touching {
                        continue;
                    }

                    let sensor = [contact.fixture_a, contact.fixture_b]
                        .iter()
                        .any(|f| self.fixtures.get(*f).is_some_and(Fixture::is_sensor));
                    if sensor {
                        continue;
                    }

                    self.island.add_contact(contact_handle);
                    contact.island_flag = true;

                    let other = contact.other_body(handle);
                    let Some(other_body) = self.bodies.get_mut(other) else {
                        continue;
                    };

                    if other_body.island_flag {
                        continue;
                    }

                    stack.push(other);
                    other_body.island_flag = true;
                }

                for joint_handle in joints {
                    let Some(entry) = self.joints.get_mut(joint_handle) else {
                        continue;
                    };
                    if entry.island_flag {
                        continue;
                    }

                    let other = if entry.joint.body_a() == handle {
                        entry.joint.body_b()
                    } else {
                        entry.joint.body_a()
                    };

                    self.island.add_joint(joint_handle);
                    entry.island_flag = true;

                    let Some(other_body) = self.bodies.get_mut(other) else {
                        continue;
                    };
                    if other_body.island_flag {
                        continue;
                    }

                    stack.push(other);
                    other_body.island_flag = true;
                }
            }

            let mut ctx = IslandContext {
                bodies: &mut self.bodies,
                fixtures: &self.fixtures,
                broad_phase: &self.contact_manager.broad_phase,
                contacts: &mut self.contact_manager.contacts,
                joints: &mut self.joints,
                listener: listener_mut(&mut self.contact_manager.listener),
            };
            self.island
                .solve(step, self.config.gravity, self.config.allow_sleeping, &mut ctx);
            self.stats.islands += 1;
            self.stats.bodies += self.island.body_count();

            for handle in &self.island.bodies {
                // Static bodies may appear in several islands.
                if let Some(body) = self.bodies.get_mut(*handle) {
                    if body.body_type == BodyType::Static {
                        body.island_flag = false;
                    }
                }
            }
        }

        for body in self.bodies.values() {
            // Bodies outside every island did not move.
            if !body.island_flag || body.body_type == BodyType::Static {
                continue;
            }

            synchronize_fixtures(body, &mut self.fixtures, &mut self.contact_manager.broad_phase);
        }

        self.contact_manager
            .find_new_contacts(&mut self.bodies, &self.fixtures, &self.joints);
    }

    /// Computes the TOI of a contact as a fraction of the full step, or
    /// `None` if the contact takes no part in continuous collision.
    fn contact_toi(&mut self, handle: ContactHandle) -> Option<f64> {
        let contact = self.contact_manager.contacts.get(handle)?;
        let fixture_a = self.fixtures.get(contact.fixture_a)?;
        let fixture_b = self.fixtures.get(contact.fixture_b)?;

        if fixture_a.is_sensor() || fixture_b.is_sensor() {
            return None;
        }

        let (handle_a, handle_b) = (contact.body_a, contact.body_b);
        let body_a = self.bodies.get(handle_a)?;
        let body_b = self.bodies.get(handle_b)?;
        let (type_a, type_b) = (body_a.body_type, body_b.body_type);
        debug_assert!(type_a == BodyType::Dynamic || type_b == BodyType::Dynamic);

        let active_a = body_a.awake && type_a != BodyType::Static;
        let active_b = body_b.awake && type_b != BodyType::Static;

        // One side must be awake and non-static.
        if !active_a && !active_b {
            return None;
        }

        let collide_a = body_a.bullet || type_a != BodyType::Dynamic;
        let collide_b = body_b.bullet || type_b != BodyType::Dynamic;

        // Dynamic pairs only get TOI when one of them is a bullet.
        if !collide_a && !collide_b {
            return None;
        }

        // Align both sweeps to the later start time.
        let alpha0 = body_a.sweep.alpha0.max(body_b.sweep.alpha0);
        debug_assert!(alpha0 < 1.0);

        let proxy_a = DistanceProxy::new(fixture_a.shape(), contact.child_index_a);
        let proxy_b = DistanceProxy::new(fixture_b.shape(), contact.child_index_b);

        for body_handle in [handle_a, handle_b] {
            if let Some(body) = self.bodies.get_mut(body_handle) {
                if body.sweep.alpha0 < alpha0 {
                    body.sweep.advance(alpha0);
                }
            }
        }

        let (Some(sweep_a), Some(sweep_b)) = (
            self.bodies.get(handle_a).map(|b| b.sweep),
            self.bodies.get(handle_b).map(|b| b.sweep),
        ) else {
            return None;
        };

        let output = time_of_impact(&ToiInput {
            proxy_a: &proxy_a,
            proxy_b: &proxy_b,
            sweep_a,
            sweep_b,
            t_max: 1.0,
        });

        // `beta` is relative to the remainder of the step.
        let beta = output.t;
        if output.state == ToiState::Touching {
            Some((alpha0 + (1.0 - alpha0) * beta).min(1.0))
        } else {
            Some(1.0)
        }
    }

    /// Finds the contact with the earliest TOI among those not yet exhausted.
    fn find_min_toi(&mut self) -> Option<(ContactHandle, f64)> {
        let mut min_contact = None;
        let mut min_alpha = 1.0;

        let handles: Vec<ContactHandle> = self.contact_manager.contacts.keys().collect();
        for handle in handles {
            let Some(contact) = self.contact_manager.contacts.get(handle) else {
                continue;
            };

            if !contact.enabled {
                continue;
            }

            if contact.toi_count > MAX_SUB_STEPS {
                continue;
            }

            let alpha = if contact.toi_flag {
                // Cached from an earlier event this step.
                contact.toi
            } else {
                let Some(alpha) = self.contact_toi(handle) else {
                    continue;
                };
                if let Some(contact) = self.contact_manager.contacts.get_mut(handle) {
                    contact.toi = alpha;
                    contact.toi_flag = true;
                }
                alpha
            };

            if alpha < min_alpha {
                min_contact = Some(handle);
                min_alpha = alpha;
            }
        }

        min_contact.map(|handle| (handle, min_alpha))
    }

    /// Restores a body's sweep and transform from a backup.
    fn restore_sweep(&mut self, handle: BodyHandle, sweep: Sweep) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.sweep = sweep;
            body.synchronize_transform();
        }
    }

    /// Adds the static, kinematic and bullet neighbours of a TOI body to the
    /// island, advancing them to the TOI.
    fn add_toi_neighbours(&mut self, handle: BodyHandle, min_alpha: f64) {
        let Some(body) = self.bodies.get(handle) else {
            return;
        };
        if body.body_type != BodyType::Dynamic {
            return;
        }
        let bullet = body.bullet;
        let contacts = body.contacts.clone();

        for contact_handle in contacts {
            if self.island.body_count() == 2 * MAX_TOI_CONTACTS {
                break;
            }
            if self.island.contact_count() == MAX_TOI_CONTACTS {
                break;
            }

            let Some(contact) = self.contact_manager.contacts.get(contact_handle) else {
                continue;
            };

            if contact.island_flag {
                continue;
            }

            // Dynamic neighbours join only as bullets.
            let other = contact.other_body(handle);
            let Some(other_body) = self.bodies.get(other) else {
                continue;
            };
            if other_body.body_type == BodyType::Dynamic && !bullet && !other_body.bullet {
                continue;
            }

            let sensor = [contact.fixture_a, contact.fixture_b]
                .iter()
                .any(|f| self.fixtures.get(*f).is_some_and(Fixture::is_sensor));
            if sensor {
                continue;
            }

            // Advance tentatively; rolled back below if the contact is not solid.
            let backup = other_body.sweep;
            if !other_body.island_flag {
                if let Some(other_body) = self.bodies.get_mut(other) {
                    other_body.advance(min_alpha);
                }
            }

            self.contact_manager
                .update_contact(contact_handle, &mut self.bodies, &self.fixtures);

            let Some(contact) = self.contact_manager.contacts.get_mut(contact_handle) else {
                continue;
            };

            if !contact.enabled || !contact.touching {
                self.restore_sweep(other, backup);
                continue;
            }

            contact.island_flag = true;
            self.island.add_contact(contact_handle);

            let Some(other_body) = self.bodies.get_mut(other) else {
                continue;
            };
            if other_body.island_flag {
                continue;
            }

            other_body.island_flag = true;
            if other_body.body_type != BodyType::Static {
                other_body.set_awake(true);
            }
            self.island.add_body(other, other_body);
        }
    }

    /// Finds TOI contacts and solves them in time order.
    fn solve_toi(&mut self, step: &TimeStep) {
        if self.step_complete {
            for body in self.bodies.values_mut() {
                body.island_flag = false;
                body.sweep.alpha0 = 0.0;
            }

            for contact in self.contact_manager.contacts.values_mut() {
                contact.toi_flag = false;
                contact.island_flag = false;
                contact.toi_count = 0;
                contact.toi = 1.0;
            }
        }

        loop {
            let Some((min_contact, min_alpha)) = self.find_min_toi() else {
                self.step_complete = true;
                break;
            };
            if 1.0 - 10.0 * f64::EPSILON < min_alpha {
                self.step_complete = true;
                break;
            }

            if self.stats.toi_events >= self.config.max_toi_events {
                debug!(events = self.stats.toi_events, "TOI event limit reached");
                self.step_complete = true;
                break;
            }

            let Some(contact) = self.contact_manager.contacts.get(min_contact) else {
                break;
            };
            let (handle_a, handle_b) = (contact.body_a, contact.body_b);
            let (Some(backup_a), Some(backup_b)) = (
                self.bodies.get(handle_a).map(|b| b.sweep),
                self.bodies.get(handle_b).map(|b| b.sweep),
            ) else {
                break;
            };

            for handle in [handle_a, handle_b] {
                if let Some(body) = self.bodies.get_mut(handle) {
                    body.advance(min_alpha);
                }
            }

            self.contact_manager
                .update_contact(min_contact, &mut self.bodies, &self.fixtures);

            let Some(contact) = self.contact_manager.contacts.get_mut(min_contact) else {
                break;
            };
            contact.toi_flag = false;
            contact.toi_count += 1;

            if !contact.enabled || !contact.touching {
                contact.enabled = false;
                self.restore_sweep(handle_a, backup_a);
                self.restore_sweep(handle_b, backup_b);
                continue;
            }
            contact.island_flag = true;

            self.island.clear();
            for handle in [handle_a, handle_b] {
                if let Some(body) = self.bodies.get_mut(handle) {
                    body.set_awake(true);
                    body.island_flag = true;
                    self.island.add_body(handle, body);
                }
            }
            self.island.add_contact(min_contact);

            self.add_toi_neighbours(handle_a, min_alpha);
            self.add_toi_neighbours(handle_b, min_alpha);

            let (Some(index_a), Some(index_b)) = (
                self.bodies.get(handle_a).map(|b| b.island_index),
                self.bodies.get(handle_b).map(|b| b.island_index),
            ) else {
                break;
            };

            let dt = (1.0 - min_alpha) * step.dt;
            let sub_step = TimeStep {
                dt,
                inv_dt: 1.0 / dt,
                dt_ratio: 1.0,
                velocity_iterations: step.velocity_iterations,
                position_iterations: TOI_POSITION_ITERATIONS,
                warm_starting: false,
            };

            let mut ctx = IslandContext {
                bodies: &mut self.bodies,
                fixtures: &self.fixtures,
                broad_phase: &self.contact_manager.broad_phase,
                contacts: &mut self.contact_manager.contacts,
                joints: &mut self.joints,
                listener: listener_mut(&mut self.contact_manager.listener),
            };
            self.island.solve_toi(&sub_step, index_a, index_b, &mut ctx);
            self.stats.toi_events += 1;
            debug!(alpha = min_alpha, bodies = self.island.body_count(), "solved TOI event");

            for handle in &self.island.bodies {
                let Some(body) = self.bodies.get_mut(*handle) else {
                    continue;
                };
                body.island_flag = false;

                if body.body_type != BodyType::Dynamic {
                    continue;
                }

                synchronize_fixtures(body, &mut self.fixtures, &mut self.contact_manager.broad_phase);

                // The body moved, so its cached TOIs are stale.
                for contact in &body.contacts {
                    if let Some(contact) = self.contact_manager.contacts.get_mut(*contact) {
                        contact.toi_flag = false;
                        contact.island_flag = false;
                    }
                }
            }

            // New pairs from the moved proxies.
            self.contact_manager
                .find_new_contacts(&mut self.bodies, &self.fixtures, &self.joints);

            if self.config.sub_stepping {
                self.step_complete = false;
                break;
            }
        }
    }

    /// Zeroes the accumulated force and torque of every body. Runs
    /// automatically at the end of each step.
    pub fn clear_forces(&mut self) {
        for body in self.bodies.values_mut() {
            body.clear_accumulators();
        }
    }

    /// The read-only query view handed to contact listeners.
    pub fn query(&self) -> WorldQuery<'_> {
        WorldQuery::new(
            &self.contact_manager.broad_phase,
            &self.bodies,
            &self.fixtures,
            &self.contact_manager.contacts,
        )
    }

    /// Reports every fixture whose broad-phase AABB overlaps `aabb`. Return
    /// false from the callback to stop the query.
    pub fn query_aabb<F: FnMut(FixtureHandle) -> bool>(&self, aabb: &AABB, callback: F) {
        self.query().query_aabb(aabb, callback);
    }

    /// Casts a ray from `p1` to `p2` against every fixture; see
    /// [`WorldQuery::ray_cast`].
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, callback: F)
    where
        F: FnMut(FixtureHandle, Vec2, Vec2, f64) -> f64,
    {
        self.query().ray_cast(p1, p2, callback);
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    pub fn fixture(&self, handle: FixtureHandle) -> Option<&Fixture> {
        self.fixtures.get(handle)
    }

    /// Friction and restitution changes only affect new contacts.
    pub fn fixture_mut(&mut self, handle: FixtureHandle) -> Option<&mut Fixture> {
        self.fixtures.get_mut(handle)
    }

    pub fn joint(&self, handle: JointHandle) -> Option<&dyn Joint> {
        self.joints.get(handle).map(|entry| entry.joint.as_ref())
    }

    /// The joint downcast to its concrete type.
    pub fn joint_as<J: Joint>(&self, handle: JointHandle) -> Option<&J> {
        self.joints.get(handle)?.joint.as_any().downcast_ref::<J>()
    }

    /// Mutable access to a joint of a known concrete type.
    pub fn joint_mut<J: Joint>(&mut self, handle: JointHandle) -> Option<&mut J> {
        self.joints.get_mut(handle)?.joint.as_any_mut().downcast_mut::<J>()
    }

    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &(dyn Joint + 'static))> {
        self.joints.iter().map(|(handle, entry)| (handle, entry.joint.as_ref()))
    }

    pub fn contact(&self, handle: ContactHandle) -> Option<&Contact> {
        self.contact_manager.contacts.get(handle)
    }

    pub fn contacts(&self) -> impl Iterator<Item = (ContactHandle, &Contact)> {
        self.contact_manager.contacts.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contact_manager.contacts.len()
    }

    pub fn proxy_count(&self) -> usize {
        self.contact_manager.broad_phase.proxy_count()
    }

    pub fn tree_height(&self) -> i32 {
        self.contact_manager.broad_phase.tree_height()
    }

    /// Number of completed calls to [`step`](Self::step).
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }
}
