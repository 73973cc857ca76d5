use slotmap::SlotMap;

use crate::collision::{BroadPhase, RayCastInput, AABB};
use crate::math::Vec2;
use crate::objects::{BodyHandle, Contact, ContactHandle, Fixture, FixtureHandle, ProxyKey, RigidBody};

/// Read-only access to the world's spatial queries and contact list.
///
/// Contact listeners receive one of these with every callback, so they can
/// look around the world mid-step without being able to change it.
#[derive(Clone, Copy)]
pub struct WorldQuery<'a> {
    broad_phase: &'a BroadPhase<ProxyKey>,
    bodies: &'a SlotMap<BodyHandle, RigidBody>,
    fixtures: &'a SlotMap<FixtureHandle, Fixture>,
    contacts: &'a SlotMap<ContactHandle, Contact>,
}

impl<'a> WorldQuery<'a> {
    pub(crate) fn new(
        broad_phase: &'a BroadPhase<ProxyKey>,
        bodies: &'a SlotMap<BodyHandle, RigidBody>,
        fixtures: &'a SlotMap<FixtureHandle, Fixture>,
        contacts: &'a SlotMap<ContactHandle, Contact>,
    ) -> Self {
        Self {
            broad_phase,
            bodies,
            fixtures,
            contacts,
        }
    }

    /// Reports every fixture whose broad-phase AABB overlaps `aabb`. Return
    /// false from the callback to stop the query.
    pub fn query_aabb<F: FnMut(FixtureHandle) -> bool>(&self, aabb: &AABB, mut callback: F) {
        let broad_phase = self.broad_phase;
        broad_phase.query(aabb, |proxy_id| match broad_phase.user_data(proxy_id) {
            Some(key) => callback(key.fixture),
            None => true,
        });
    }

    /// Casts a ray from `p1` to `p2` against every fixture.
    ///
    /// The callback receives the fixture, the hit point, the surface normal
    /// and the fraction along the ray, and returns how to continue:
    /// `-1` ignores the fixture, `0` stops, `fraction` clips the ray to the
    /// hit and `1` keeps going unclipped. A zero-length ray reports nothing.
    pub fn ray_cast<F>(&self, p1: Vec2, p2: Vec2, mut callback: F)
    where
        F: FnMut(FixtureHandle, Vec2, Vec2, f64) -> f64,
    {
        let broad_phase = self.broad_phase;
        let input = RayCastInput::new(p1, p2);
        broad_phase.ray_cast(&input, |sub_input, proxy_id| {
            let Some(key) = broad_phase.user_data(proxy_id) else {
                return sub_input.max_fraction;
            };
            let Some(fixture) = self.fixtures.get(key.fixture) else {
                return sub_input.max_fraction;
            };
            let Some(body) = self.bodies.get(fixture.body) else {
                return sub_input.max_fraction;
            };

            match fixture.ray_cast(sub_input, &body.xf, key.child_index) {
                Some(output) => {
                    let point = sub_input.point_at(output.fraction);
                    callback(key.fixture, point, output.normal, output.fraction)
                }
                None => sub_input.max_fraction,
            }
        });
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&'a RigidBody> {
        self.bodies.get(handle)
    }

    pub fn fixture(&self, handle: FixtureHandle) -> Option<&'a Fixture> {
        self.fixtures.get(handle)
    }

    /// Contacts as of the callback. The contact handed to `pre_solve` shows
    /// its state from before the callback.
    pub fn contacts(&self) -> impl Iterator<Item = (ContactHandle, &'a Contact)> + 'a {
        self.contacts.iter()
    }

    pub fn contact(&self, handle: ContactHandle) -> Option<&'a Contact> {
        self.contacts.get(handle)
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}
