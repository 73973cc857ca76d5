use crate::collision::Manifold;
use crate::constraints::ContactImpulse;
use crate::objects::{Contact, Fixture};
use crate::world::query::WorldQuery;

/// Receives contact events during [`PhysicsWorld::step`](crate::world::PhysicsWorld::step).
///
/// Callbacks run while the world is locked. They may inspect and tweak the
/// contact they are handed, and run ray casts, AABB queries and contact
/// lookups through `world`, but cannot create or destroy world objects.
pub trait ContactListener {
    /// Two fixtures began to touch.
    fn begin_contact(&mut self, _contact: &Contact, _world: &WorldQuery<'_>) {}

    /// Two fixtures stopped touching. Also called when a touching contact
    /// is destroyed, after it has left the contact list.
    fn end_contact(&mut self, _contact: &Contact, _world: &WorldQuery<'_>) {}

    /// Called after the manifold is updated and before the solver runs.
    /// Disable the contact here to skip its response for the current step.
    /// Not called for sensors.
    fn pre_solve(&mut self, _contact: &mut Contact, _old_manifold: &Manifold, _world: &WorldQuery<'_>) {}

    /// Reports the impulses the solver applied to a contact. Body
    /// transforms are already updated; broad-phase proxies are not.
    fn post_solve(&mut self, _contact: &Contact, _impulse: &ContactImpulse, _world: &WorldQuery<'_>) {}
}

/// Decides whether two fixtures may form a contact.
pub trait ContactFilter {
    /// Fixtures in the same nonzero group collide when the group is positive
    /// and never collide when it is negative. Otherwise the category and mask
    /// bits of both fixtures must accept each other.
    fn should_collide(&self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool {
        let filter_a = fixture_a.filter();
        let filter_b = fixture_b.filter();

        if filter_a.group_index == filter_b.group_index && filter_a.group_index != 0 {
            return filter_a.group_index > 0;
        }

        (filter_a.mask_bits & filter_b.category_bits) != 0 && (filter_a.category_bits & filter_b.mask_bits) != 0
    }
}

/// Filter using the group, category and mask rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContactFilter;

impl ContactFilter for DefaultContactFilter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{BodyHandle, Filter, FixtureDef};
    use crate::shapes::Circle;

    fn fixture(filter: Filter) -> Fixture {
        Fixture::new(BodyHandle::default(), &FixtureDef::new(Circle::new(1.0)).with_filter(filter))
    }

    #[test]
    fn test_default_filter_accepts_defaults() {
        let a = fixture(Filter::default());
        let b = fixture(Filter::default());
        assert!(DefaultContactFilter.should_collide(&a, &b));
    }

    #[test]
    fn test_mask_rejects_category() {
        let a = fixture(Filter {
            category_bits: 0x0002,
            ..Default::default()
        });
        let b = fixture(Filter {
            mask_bits: 0x0001,
            ..Default::default()
        });
        assert!(!DefaultContactFilter.should_collide(&a, &b));
        assert!(!DefaultContactFilter.should_collide(&b, &a));
    }

    #[test]
    fn test_group_overrides_bits() {
        let never = Filter {
            group_index: -3,
            ..Default::default()
        };
        assert!(!DefaultContactFilter.should_collide(&fixture(never), &fixture(never)));

        let always = Filter {
            category_bits: 0x0002,
            mask_bits: 0x0000,
            group_index: 4,
        };
        assert!(DefaultContactFilter.should_collide(&fixture(always), &fixture(always)));
    }
}
