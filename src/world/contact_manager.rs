use slotmap::SlotMap;
use tracing::trace;

use crate::collision::BroadPhase;
use crate::constraints::JointEntry;
use crate::objects::{BodyHandle, BodyType, Contact, ContactHandle, Fixture, FixtureHandle, JointHandle, ProxyKey, RigidBody};
use crate::world::callbacks::{ContactFilter, ContactListener, DefaultContactFilter};
use crate::world::query::WorldQuery;

/// Joints with `collide_connected` unset stop their bodies from colliding,
/// and at least one of the bodies must be dynamic.
pub(crate) fn bodies_should_collide(
    bodies: &SlotMap<BodyHandle, RigidBody>,
    joints: &SlotMap<JointHandle, JointEntry>,
    handle_a: BodyHandle,
    handle_b: BodyHandle,
) -> bool {
    let (Some(body_a), Some(body_b)) = (bodies.get(handle_a), bodies.get(handle_b)) else {
        return false;
    };
    if body_a.body_type != BodyType::Dynamic && body_b.body_type != BodyType::Dynamic {
        return false;
    }

    !body_b.joints.iter().filter_map(|j| joints.get(*j)).any(|entry| {
        let joint = &entry.joint;
        let other = if joint.body_a() == handle_b { joint.body_b() } else { joint.body_a() };
        other == handle_a && !joint.collide_connected()
    })
}

/// Reborrows the installed listener for the duration of a solve.
pub(crate) fn listener_mut(listener: &mut Option<Box<dyn ContactListener>>) -> Option<&mut dyn ContactListener> {
    match listener {
        Some(listener) => Some(&mut **listener),
        None => None,
    }
}

/// Owns the broad-phase and the live contact set.
pub(crate) struct ContactManager {
    pub broad_phase: BroadPhase<ProxyKey>,
    pub contacts: SlotMap<ContactHandle, Contact>,
    pub filter: Box<dyn ContactFilter>,
    pub listener: Option<Box<dyn ContactListener>>,
}

impl Default for ContactManager {
    fn default() -> Self {
        Self {
            broad_phase: BroadPhase::new(),
            contacts: SlotMap::with_key(),
            filter: Box::new(DefaultContactFilter),
            listener: None,
        }
    }
}

impl ContactManager {
    /// Creates a contact for a new broad-phase pair unless one exists already
    /// or the pair is filtered out.
    pub fn add_pair(
        &mut self,
        key_a: ProxyKey,
        key_b: ProxyKey,
        bodies: &mut SlotMap<BodyHandle, RigidBody>,
        fixtures: &SlotMap<FixtureHandle, Fixture>,
        joints: &SlotMap<JointHandle, JointEntry>,
    ) {
        let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(key_a.fixture), fixtures.get(key_b.fixture)) else {
            return;
        };
        let body_a = fixture_a.body();
        let body_b = fixture_b.body();
        if body_a == body_b {
            return;
        }

        let Some(edges) = bodies.get(body_b).map(|b| &b.contacts) else {
            return;
        };
        let exists = edges.iter().filter_map(|c| self.contacts.get(*c)).any(|c| {
            let forward = c.fixture_a == key_a.fixture
                && c.child_index_a == key_a.child_index
                && c.fixture_b == key_b.fixture
                && c.child_index_b == key_b.child_index;
            let reverse = c.fixture_a == key_b.fixture
                && c.child_index_a == key_b.child_index
                && c.fixture_b == key_a.fixture
                && c.child_index_b == key_a.child_index;
            forward || reverse
        });
        if exists {
            return;
        }

        if !bodies_should_collide(bodies, joints, body_b, body_a) {
            return;
        }

        if !self.filter.should_collide(fixture_a, fixture_b) {
            return;
        }

        let Some(contact) =
            Contact::new(key_a.fixture, fixture_a, key_a.child_index, key_b.fixture, fixture_b, key_b.child_index)
        else {
            return;
        };

        let handle = self.contacts.insert(contact);
        for body in [body_a, body_b] {
            if let Some(body) = bodies.get_mut(body) {
                body.contacts.push(handle);
            }
        }
    }

    /// Turns the pairs buffered by moved proxies into contacts.
    pub fn find_new_contacts(
        &mut self,
        bodies: &mut SlotMap<BodyHandle, RigidBody>,
        fixtures: &SlotMap<FixtureHandle, Fixture>,
        joints: &SlotMap<JointHandle, JointEntry>,
    ) {
        let pairs = self.broad_phase.update_pairs();
        trace!(pairs = pairs.len(), "broad-phase pairs");
        for (key_a, key_b) in pairs {
            self.add_pair(key_a, key_b, bodies, fixtures, joints);
        }
    }

    /// Removes a contact, reporting the end of touch if it was touching.
    pub fn destroy(
        &mut self,
        handle: ContactHandle,
        bodies: &mut SlotMap<BodyHandle, RigidBody>,
        fixtures: &SlotMap<FixtureHandle, Fixture>,
    ) {
        let Some(contact) = self.contacts.remove(handle) else {
            return;
        };

        for body in [contact.body_a, contact.body_b] {
            if let Some(body) = bodies.get_mut(body) {
                body.contacts.retain(|c| *c != handle);
            }
        }

        if contact.touching {
            if let Some(listener) = self.listener.as_deref_mut() {
                let world = WorldQuery::new(&self.broad_phase, bodies, fixtures, &self.contacts);
                listener.end_contact(&contact, &world);
            }
        }
    }

    /// Recomputes the manifold of one contact and reports touch transitions.
    /// Bodies are woken when a solid contact starts or stops touching.
    pub fn update_contact(
        &mut self,
        handle: ContactHandle,
        bodies: &mut SlotMap<BodyHandle, RigidBody>,
        fixtures: &SlotMap<FixtureHandle, Fixture>,
    ) {
        let Some(contact) = self.contacts.get_mut(handle) else {
            return;
        };
        let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(contact.fixture_a), fixtures.get(contact.fixture_b)) else {
            return;
        };
        let (Some(xf_a), Some(xf_b)) = (
            bodies.get(contact.body_a).map(|b| b.xf),
            bodies.get(contact.body_b).map(|b| b.xf),
        ) else {
            return;
        };

        let sensor = fixture_a.is_sensor() || fixture_b.is_sensor();
        let update = contact.update(fixture_a.shape(), &xf_a, fixture_b.shape(), &xf_b, sensor);
        let (body_a, body_b) = (contact.body_a, contact.body_b);

        if !update.sensor && update.touching != update.was_touching {
            for body in [body_a, body_b] {
                if let Some(body) = bodies.get_mut(body) {
                    body.set_awake(true);
                }
            }
        }

        let Some(listener) = self.listener.as_deref_mut() else {
            return;
        };

        let edited = {
            let world = WorldQuery::new(&self.broad_phase, bodies, fixtures, &self.contacts);
            let Some(contact) = self.contacts.get(handle) else {
                return;
            };
            if !update.was_touching && update.touching {
                listener.begin_contact(contact, &world);
            }
            if update.was_touching && !update.touching {
                listener.end_contact(contact, &world);
            }
            if update.sensor || !update.touching {
                return;
            }

            // The listener edits a copy while the contact list stays readable.
            let mut edited = contact.clone();
            listener.pre_solve(&mut edited, &update.old_manifold, &world);
            edited
        };

        if let Some(contact) = self.contacts.get_mut(handle) {
            *contact = edited;
        }
    }

    /// Narrow-phase for every contact with an active body. Contacts whose
    /// fat AABBs stopped overlapping, or that are now filtered out, are destroyed.
    pub fn collide(
        &mut self,
        bodies: &mut SlotMap<BodyHandle, RigidBody>,
        fixtures: &SlotMap<FixtureHandle, Fixture>,
        joints: &SlotMap<JointHandle, JointEntry>,
    ) {
        let handles: Vec<ContactHandle> = self.contacts.keys().collect();
        for handle in handles {
            let Some(contact) = self.contacts.get_mut(handle) else {
                continue;
            };
            let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(contact.fixture_a), fixtures.get(contact.fixture_b))
            else {
                self.destroy(handle, bodies, fixtures);
                continue;
            };

            if contact.filter_flag {
                if !bodies_should_collide(bodies, joints, contact.body_b, contact.body_a)
                    || !self.filter.should_collide(fixture_a, fixture_b)
                {
                    self.destroy(handle, bodies, fixtures);
                    continue;
                }
                contact.filter_flag = false;
            }

            let is_active = |body: BodyHandle| {
                bodies
                    .get(body)
                    .is_some_and(|b| b.awake && b.body_type != BodyType::Static)
            };

            // One side must be awake and non-static.
            if !is_active(contact.body_a) && !is_active(contact.body_b) {
                continue;
            }

            let proxy_a = fixture_a.proxies.get(contact.child_index_a).map(|p| p.proxy_id);
            let proxy_b = fixture_b.proxies.get(contact.child_index_b).map(|p| p.proxy_id);
            let overlap = match (proxy_a, proxy_b) {
                (Some(a), Some(b)) => self.broad_phase.test_overlap(a, b),
                _ => false,
            };

            // Fat AABBs stopped overlapping.
            if !overlap {
                self.destroy(handle, bodies, fixtures);
                continue;
            }

            self.update_contact(handle, bodies, fixtures);
        }
    }
}
