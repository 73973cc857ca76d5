use crate::math::{Rot, Sweep, Transform, Vec2};
use crate::objects::{ContactHandle, FixtureHandle, JointHandle};
use crate::shapes::MassData;

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// Zero mass, zero velocity, moved only by the user.
    #[default]
    Static,
    /// Zero mass, velocity set by the user, moved by the solver.
    Kinematic,
    /// Positive mass, velocity determined by forces and contacts.
    Dynamic,
}

/// Creation parameters for a body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    /// World position of the body origin.
    pub position: Vec2,
    /// World angle in radians.
    pub angle: f64,
    /// Linear velocity of the body origin.
    pub linear_velocity: Vec2,
    pub angular_velocity: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    /// Set false if this body should never fall asleep.
    pub allow_sleep: bool,
    /// Is this body initially awake or sleeping?
    pub awake: bool,
    pub fixed_rotation: bool,
    /// Fast body that should use continuous collision against other dynamic bodies too.
    pub bullet: bool,
    pub gravity_scale: f64,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            gravity_scale: 1.0,
        }
    }
}

impl BodyDef {
    /// A dynamic body at `position`.
    pub fn dynamic(position: Vec2) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position,
            ..Default::default()
        }
    }

    /// A static body at `position`.
    pub fn fixed(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub(crate) body_type: BodyType,

    // Primary state
    pub(crate) xf: Transform, // Body origin transform
    pub(crate) sweep: Sweep,  // Center of mass motion for the current step
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f64, // Radians per second

    // Accumulators for forces/torques applied during a time step
    pub(crate) force: Vec2,
    pub(crate) torque: f64,

    // Physical properties
    pub(crate) mass: f64,
    pub(crate) inv_mass: f64,
    pub(crate) inertia: f64, // About the center of mass
    pub(crate) inv_inertia: f64,

    pub(crate) linear_damping: f64,
    pub(crate) angular_damping: f64,
    pub(crate) gravity_scale: f64,

    pub(crate) sleep_time: f64,
    pub(crate) awake: bool,
    pub(crate) allow_sleep: bool,
    pub(crate) fixed_rotation: bool,
    pub(crate) bullet: bool,

    // Step bookkeeping
    pub(crate) island_flag: bool,
    pub(crate) island_index: usize,

    // Graph edges
    pub(crate) fixtures: Vec<FixtureHandle>,
    pub(crate) contacts: Vec<ContactHandle>,
    pub(crate) joints: Vec<JointHandle>,
}

impl RigidBody {
    /// Creates a body with no fixtures. Dynamic bodies start with unit mass
    /// until fixtures are attached.
    pub fn new(def: &BodyDef) -> Self {
        let xf = Transform::new(def.position, def.angle);
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: xf.position,
            c: xf.position,
            a0: def.angle,
            a: def.angle,
            alpha0: 0.0,
        };

        let (mass, inv_mass) = if def.body_type == BodyType::Dynamic {
            (1.0, 1.0)
        } else {
            (0.0, 0.0)
        };

        let mut body = Self {
            body_type: def.body_type,
            xf,
            sweep,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            sleep_time: 0.0,
            awake: def.awake,
            allow_sleep: def.allow_sleep,
            fixed_rotation: def.fixed_rotation,
            bullet: def.bullet,
            island_flag: false,
            island_index: 0,
            fixtures: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
        };

        if body.body_type == BodyType::Static {
            body.linear_velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
            body.awake = false;
        }
        body
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Transform of the body origin.
    pub fn transform(&self) -> &Transform {
        &self.xf
    }

    /// World position of the body origin.
    pub fn position(&self) -> Vec2 {
        self.xf.position
    }

    pub fn angle(&self) -> f64 {
        self.sweep.a
    }

    /// World position of the center of mass.
    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    /// Center of mass in body coordinates.
    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Sets the velocity of the center of mass. Ignored for static bodies.
    pub fn set_linear_velocity(&mut self, v: Vec2) {
        if self.body_type == BodyType::Static {
            return;
        }
        if v.dot(v) > 0.0 {
            self.set_awake(true);
        }
        self.linear_velocity = v;
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, w: f64) {
        if self.body_type == BodyType::Static {
            return;
        }
        if w * w > 0.0 {
            self.set_awake(true);
        }
        self.angular_velocity = w;
    }

    /// Applies a force at a world point. Off-center forces also produce torque.
    pub fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        // Don't accumulate a force if the body is sleeping.
        if self.awake {
            self.force += force;
            self.torque += (point - self.sweep.c).cross(force);
        }
    }

    pub fn apply_force_to_center(&mut self, force: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.force += force;
        }
    }

    pub fn apply_torque(&mut self, torque: f64, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.torque += torque;
        }
    }

    /// Applies an impulse at a world point, changing the velocity immediately.
    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += impulse * self.inv_mass;
            self.angular_velocity += self.inv_inertia * (point - self.sweep.c).cross(impulse);
        }
    }

    pub fn apply_linear_impulse_to_center(&mut self, impulse: Vec2, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += impulse * self.inv_mass;
        }
    }

    pub fn apply_angular_impulse(&mut self, impulse: f64, wake: bool) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake && !self.awake {
            self.set_awake(true);
        }
        if self.awake {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    /// Clears the force and torque accumulators.
    pub fn clear_accumulators(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Rotational inertia about the body origin.
    pub fn inertia(&self) -> f64 {
        self.inertia + self.mass * self.sweep.local_center.dot(self.sweep.local_center)
    }

    /// Mass, local center and rotational inertia about the body origin.
    pub fn mass_data(&self) -> MassData {
        MassData {
            mass: self.mass,
            center: self.sweep.local_center,
            inertia: self.inertia(),
        }
    }

    /// Recomputes mass from the mass data of the attached fixtures with
    /// positive density. Dynamic bodies without mass are given unit mass.
    pub(crate) fn reset_mass_data(&mut self, fixture_mass: impl Iterator<Item = MassData>) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.sweep.local_center = Vec2::ZERO;

        // Static and kinematic bodies have zero mass.
        if self.body_type != BodyType::Dynamic {
            self.sweep.c0 = self.xf.position;
            self.sweep.c = self.xf.position;
            self.sweep.a0 = self.sweep.a;
            return;
        }

        // Accumulate mass over all fixtures.
        let mut local_center = Vec2::ZERO;
        for md in fixture_mass {
            self.mass += md.mass;
            local_center += md.center * md.mass;
            self.inertia += md.inertia;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            local_center *= self.inv_mass;
        } else {
            // Force all dynamic bodies to have positive mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if self.inertia > 0.0 && !self.fixed_rotation {
            // Center the inertia about the center of mass.
            self.inertia -= self.mass * local_center.dot(local_center);
            debug_assert!(self.inertia > 0.0);
            self.inv_inertia = 1.0 / self.inertia;
        } else {
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
        }

        // Move center of mass.
        let old_center = self.sweep.c;
        self.sweep.local_center = local_center;
        self.sweep.c = self.xf.apply(local_center);
        self.sweep.c0 = self.sweep.c;

        // Update center of mass velocity.
        self.linear_velocity += Vec2::scalar_cross(self.angular_velocity, self.sweep.c - old_center);
    }

    /// World coordinates of a point given in body coordinates.
    pub fn world_point(&self, local_point: Vec2) -> Vec2 {
        self.xf.apply(local_point)
    }

    pub fn world_vector(&self, local_vector: Vec2) -> Vec2 {
        self.xf.rotation.apply(local_vector)
    }

    /// Body coordinates of a world point.
    pub fn local_point(&self, world_point: Vec2) -> Vec2 {
        self.xf.apply_inverse(world_point)
    }

    pub fn local_vector(&self, world_vector: Vec2) -> Vec2 {
        self.xf.rotation.apply_inverse(world_vector)
    }

    /// Velocity of a world point attached to this body.
    pub fn linear_velocity_from_world_point(&self, world_point: Vec2) -> Vec2 {
        self.linear_velocity + Vec2::scalar_cross(self.angular_velocity, world_point - self.sweep.c)
    }

    pub fn linear_velocity_from_local_point(&self, local_point: Vec2) -> Vec2 {
        self.linear_velocity_from_world_point(self.world_point(local_point))
    }

    pub fn linear_damping(&self) -> f64 {
        self.linear_damping
    }

    pub fn set_linear_damping(&mut self, damping: f64) {
        self.linear_damping = damping;
    }

    pub fn angular_damping(&self) -> f64 {
        self.angular_damping
    }

    pub fn set_angular_damping(&mut self, damping: f64) {
        self.angular_damping = damping;
    }

    pub fn gravity_scale(&self) -> f64 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f64) {
        self.gravity_scale = scale;
    }

    pub fn is_bullet(&self) -> bool {
        self.bullet
    }

    pub fn set_bullet(&mut self, flag: bool) {
        self.bullet = flag;
    }

    pub fn is_sleeping_allowed(&self) -> bool {
        self.allow_sleep
    }

    /// Disallowing sleep wakes the body.
    pub fn set_sleeping_allowed(&mut self, flag: bool) {
        self.allow_sleep = flag;
        if !flag {
            self.set_awake(true);
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Waking resets the sleep timer. Putting a body to sleep zeroes its
    /// velocities and accumulated forces. Static bodies are never awake.
    pub fn set_awake(&mut self, flag: bool) {
        if self.body_type == BodyType::Static {
            return;
        }
        if flag {
            self.awake = true;
            self.sleep_time = 0.0;
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Accumulated time spent below the sleep tolerances.
    pub fn sleep_time(&self) -> f64 {
        self.sleep_time
    }

    pub fn fixtures(&self) -> &[FixtureHandle] {
        &self.fixtures
    }

    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    pub fn contacts(&self) -> &[ContactHandle] {
        &self.contacts
    }

    pub(crate) fn synchronize_transform(&mut self) {
        let q = Rot::new(self.sweep.a);
        self.xf = Transform::from_rot(self.sweep.c - q.apply(self.sweep.local_center), q);
    }

    /// Transform at the start of the current sweep.
    pub(crate) fn transform0(&self) -> Transform {
        let q = Rot::new(self.sweep.a0);
        Transform::from_rot(self.sweep.c0 - q.apply(self.sweep.local_center), q)
    }

    /// Moves the body to the sweep position at `alpha` and ends the sweep there.
    pub(crate) fn advance(&mut self, alpha: f64) {
        self.sweep.advance(alpha);
        self.sweep.c = self.sweep.c0;
        self.sweep.a = self.sweep.a0;
        self.synchronize_transform();
    }

    /// Places the body origin at `position` with `angle`, resetting the sweep.
    pub(crate) fn set_transform(&mut self, position: Vec2, angle: f64) {
        self.xf = Transform::new(position, angle);
        self.sweep.c = self.xf.apply(self.sweep.local_center);
        self.sweep.a = angle;
        self.sweep.c0 = self.sweep.c;
        self.sweep.a0 = angle;
    }

    pub(crate) fn set_fixed_rotation(&mut self, flag: bool) {
        self.fixed_rotation = flag;
        self.angular_velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-9;

    fn dynamic_body() -> RigidBody {
        RigidBody::new(&BodyDef::dynamic(Vec2::new(1.0, 2.0)))
    }

    #[test]
    fn test_new_dynamic_has_unit_mass() {
        let rb = dynamic_body();
        assert_eq!(rb.body_type(), BodyType::Dynamic);
        assert_eq!(rb.mass(), 1.0);
        assert_eq!(rb.inv_mass(), 1.0);
        assert_eq!(rb.position(), Vec2::new(1.0, 2.0));
        assert!(rb.is_awake());
    }

    #[test]
    fn test_new_static_is_massless_and_asleep() {
        let mut def = BodyDef::fixed(Vec2::ZERO);
        def.linear_velocity = Vec2::new(3.0, 0.0);
        let mut rb = RigidBody::new(&def);
        assert_eq!(rb.mass(), 0.0);
        assert_eq!(rb.linear_velocity(), Vec2::ZERO);
        assert!(!rb.is_awake());

        rb.set_linear_velocity(Vec2::new(1.0, 0.0));
        rb.set_awake(true);
        assert_eq!(rb.linear_velocity(), Vec2::ZERO);
        assert!(!rb.is_awake());
    }

    #[test]
    fn test_reset_mass_data_offset_center() {
        let mut rb = dynamic_body();
        rb.set_angular_velocity(1.0);
        rb.reset_mass_data(
            [MassData {
                mass: 2.0,
                center: Vec2::new(1.0, 0.0),
                inertia: 2.0 * (1.0 / 6.0) + 2.0,
            }]
            .into_iter(),
        );
        assert!((rb.mass() - 2.0).abs() < EPSILON);
        assert_eq!(rb.local_center(), Vec2::new(1.0, 0.0));
        assert_eq!(rb.world_center(), Vec2::new(2.0, 2.0));
        // Central inertia is stored; the origin inertia is reported.
        assert!((rb.inertia - 1.0 / 3.0).abs() < EPSILON);
        assert!((rb.inertia() - (1.0 / 3.0 + 2.0)).abs() < EPSILON);
        // The center moved, so the center velocity picks up w x r.
        assert!((rb.linear_velocity().y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_reset_mass_data_defaults_to_unit_mass() {
        let mut rb = dynamic_body();
        rb.reset_mass_data(std::iter::empty());
        assert_eq!(rb.mass(), 1.0);
        assert_eq!(rb.inv_inertia, 0.0);
    }

    #[test]
    fn test_fixed_rotation_has_no_inertia() {
        let mut rb = dynamic_body();
        rb.set_fixed_rotation(true);
        rb.reset_mass_data(
            [MassData {
                mass: 1.0,
                center: Vec2::ZERO,
                inertia: 0.5,
            }]
            .into_iter(),
        );
        assert_eq!(rb.inv_inertia, 0.0);
    }

    #[test]
    fn test_apply_force_off_center() {
        let mut rb = dynamic_body();
        let force = Vec2::new(0.0, 10.0);
        rb.apply_force(force, rb.world_center() + Vec2::new(1.0, 0.0), true);
        assert_eq!(rb.force(), force);
        assert!((rb.torque() - 10.0).abs() < EPSILON);

        rb.clear_accumulators();
        assert_eq!(rb.force(), Vec2::ZERO);
        assert_eq!(rb.torque(), 0.0);
    }

    #[test]
    fn test_forces_wake_sleeping_body() {
        let mut rb = dynamic_body();
        rb.set_awake(false);
        rb.apply_force_to_center(Vec2::new(1.0, 0.0), false);
        assert_eq!(rb.force(), Vec2::ZERO);
        assert!(!rb.is_awake());

        rb.apply_linear_impulse_to_center(Vec2::new(2.0, 0.0), true);
        assert!(rb.is_awake());
        assert_eq!(rb.linear_velocity(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_sleep_clears_motion() {
        let mut rb = dynamic_body();
        rb.set_linear_velocity(Vec2::new(1.0, 1.0));
        rb.apply_torque(3.0, true);
        rb.set_awake(false);
        assert_eq!(rb.linear_velocity(), Vec2::ZERO);
        assert_eq!(rb.torque(), 0.0);

        rb.set_sleeping_allowed(false);
        assert!(rb.is_awake());
    }

    #[test]
    fn test_point_conversions() {
        let mut def = BodyDef::dynamic(Vec2::new(1.0, 0.0));
        def.angle = PI / 2.0;
        let rb = RigidBody::new(&def);
        let world = rb.world_point(Vec2::new(1.0, 0.0));
        assert!((world - Vec2::new(1.0, 1.0)).magnitude() < EPSILON);
        assert!((rb.local_point(world) - Vec2::new(1.0, 0.0)).magnitude() < EPSILON);
        assert!((rb.world_vector(Vec2::X) - Vec2::UP).magnitude() < EPSILON);
        assert!((rb.local_vector(Vec2::UP) - Vec2::X).magnitude() < EPSILON);
    }

    #[test]
    fn test_velocity_at_point() {
        let mut rb = dynamic_body();
        rb.set_angular_velocity(2.0);
        let v = rb.linear_velocity_from_world_point(rb.world_center() + Vec2::new(1.0, 0.0));
        assert!((v - Vec2::new(0.0, 2.0)).magnitude() < EPSILON);
        let v = rb.linear_velocity_from_local_point(Vec2::new(0.0, 1.0));
        assert!((v - Vec2::new(-2.0, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_advance_moves_to_sweep_fraction() {
        let mut rb = dynamic_body();
        rb.sweep.c0 = Vec2::new(0.0, 0.0);
        rb.sweep.c = Vec2::new(10.0, 0.0);
        rb.advance(0.25);
        assert!((rb.world_center().x - 2.5).abs() < EPSILON);
        assert!((rb.position().x - 2.5).abs() < EPSILON);
        assert_eq!(rb.sweep.alpha0, 0.25);
    }

    #[test]
    fn test_set_transform_resets_sweep() {
        let mut rb = dynamic_body();
        rb.set_transform(Vec2::new(5.0, 5.0), 1.0);
        assert_eq!(rb.sweep.c0, rb.sweep.c);
        assert_eq!(rb.angle(), 1.0);
        assert!((rb.transform0().position - Vec2::new(5.0, 5.0)).magnitude() < EPSILON);
    }
}
