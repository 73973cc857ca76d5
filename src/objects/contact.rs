use crate::collision::{collide_shapes, test_overlap, Manifold, WorldManifold};
use crate::common::Material;
use crate::math::Transform;
use crate::objects::{BodyHandle, Fixture, FixtureHandle};
use crate::shapes::{Shape, ShapeType};

/// Order in which shape types take the `A` slot of a contact. Edge-like
/// shapes never collide with each other.
fn shape_rank(shape_type: ShapeType) -> u8 {
    match shape_type {
        ShapeType::Circle => 0,
        ShapeType::Polygon => 1,
        ShapeType::Edge | ShapeType::Chain => 2,
    }
}

/// Whether the narrow phase has a collider for this pair of shape types.
pub fn can_collide(a: ShapeType, b: ShapeType) -> bool {
    shape_rank(a) < 2 || shape_rank(b) < 2
}

/// Manages contact between two fixture children whose proxies overlap.
/// A contact may exist with an empty manifold; it is touching only when
/// the manifold has points (or, for sensors, when the shapes overlap).
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub(crate) fixture_a: FixtureHandle,
    pub(crate) child_index_a: usize,
    pub(crate) fixture_b: FixtureHandle,
    pub(crate) child_index_b: usize,
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,

    pub(crate) manifold: Manifold,

    pub(crate) friction: f64,
    pub(crate) restitution: f64,
    pub(crate) tangent_speed: f64,

    pub(crate) touching: bool,
    pub(crate) enabled: bool,
    /// Set when the filter must be re-run before the next narrow phase.
    pub(crate) filter_flag: bool,
    pub(crate) island_flag: bool,

    // Cached time of impact for the current TOI pass.
    pub(crate) toi_flag: bool,
    pub(crate) toi: f64,
    pub(crate) toi_count: u32,
}

/// Result of refreshing a contact's manifold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContactUpdate {
    pub old_manifold: Manifold,
    pub was_touching: bool,
    pub touching: bool,
    pub sensor: bool,
}

impl Contact {
    /// Creates a contact for two fixture children, ordering them so that the
    /// higher ranked shape is `A`. Returns `None` for pairs without a collider.
    pub(crate) fn new(
        handle_a: FixtureHandle,
        fixture_a: &Fixture,
        child_index_a: usize,
        handle_b: FixtureHandle,
        fixture_b: &Fixture,
        child_index_b: usize,
    ) -> Option<Self> {
        let type_a = fixture_a.shape_type();
        let type_b = fixture_b.shape_type();
        if !can_collide(type_a, type_b) {
            return None;
        }

        if shape_rank(type_a) < shape_rank(type_b) {
            return Self::new(handle_b, fixture_b, child_index_b, handle_a, fixture_a, child_index_a);
        }

        Some(Self {
            fixture_a: handle_a,
            child_index_a,
            fixture_b: handle_b,
            child_index_b,
            body_a: fixture_a.body(),
            body_b: fixture_b.body(),
            manifold: Manifold::default(),
            friction: Material::mix_friction(fixture_a.material(), fixture_b.material()),
            restitution: Material::mix_restitution(fixture_a.material(), fixture_b.material()),
            tangent_speed: 0.0,
            touching: false,
            enabled: true,
            filter_flag: false,
            island_flag: false,
            toi_flag: false,
            toi: 1.0,
            toi_count: 0,
        })
    }

    pub fn fixture_a(&self) -> FixtureHandle {
        self.fixture_a
    }

    pub fn child_index_a(&self) -> usize {
        self.child_index_a
    }

    pub fn fixture_b(&self) -> FixtureHandle {
        self.fixture_b
    }

    pub fn child_index_b(&self) -> usize {
        self.child_index_b
    }

    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// The body on the other side of the contact from `body`.
    pub fn other_body(&self, body: BodyHandle) -> BodyHandle {
        if self.body_a == body {
            self.body_b
        } else {
            self.body_a
        }
    }

    /// Contact points in local coordinates, with the impulses of the last solve.
    pub fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    pub fn world_manifold(&self, xf_a: &Transform, radius_a: f64, xf_b: &Transform, radius_b: f64) -> WorldManifold {
        WorldManifold::new(&self.manifold, xf_a, radius_a, xf_b, radius_b)
    }

    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Disables the contact for the current step only. Call this from a
    /// pre-solve callback; the flag is reset by the next narrow phase.
    pub fn set_enabled(&mut self, flag: bool) {
        self.enabled = flag;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Overrides the mixed friction. Persists until the contact is destroyed.
    pub fn set_friction(&mut self, friction: f64) {
        self.friction = friction;
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn set_restitution(&mut self, restitution: f64) {
        self.restitution = restitution;
    }

    /// Surface speed along the tangent, as for a conveyor belt.
    pub fn tangent_speed(&self) -> f64 {
        self.tangent_speed
    }

    pub fn set_tangent_speed(&mut self, speed: f64) {
        self.tangent_speed = speed;
    }

    /// Flags the contact for re-filtering before the next narrow phase.
    pub(crate) fn flag_for_filtering(&mut self) {
        self.filter_flag = true;
    }

    /// Recomputes the manifold for the current transforms and carries the
    /// impulses of matching points over for warm starting.
    pub(crate) fn update(
        &mut self,
        shape_a: &Shape,
        xf_a: &Transform,
        shape_b: &Shape,
        xf_b: &Transform,
        sensor: bool,
    ) -> ContactUpdate {
        let old_manifold = std::mem::take(&mut self.manifold);

        // Re-enable; a pre-solve callback may disable again.
        self.enabled = true;

        let was_touching = self.touching;
        let touching = if sensor {
            test_overlap(shape_a, self.child_index_a, shape_b, self.child_index_b, xf_a, xf_b)
        } else {
            let mut manifold = collide_shapes(shape_a, self.child_index_a, xf_a, shape_b, xf_b);

            // Match new points to old ones by feature id. Index order may
            // change between steps.
            for point in manifold.points.iter_mut() {
                point.normal_impulse = 0.0;
                point.tangent_impulse = 0.0;
                if let Some(old) = old_manifold.find_point(point.id) {
                    point.normal_impulse = old.normal_impulse;
                    point.tangent_impulse = old.tangent_impulse;
                }
            }

            let touching = !manifold.is_empty();
            self.manifold = manifold;
            touching
        };

        self.touching = touching;
        ContactUpdate {
            old_manifold,
            was_touching,
            touching,
            sensor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::objects::FixtureDef;
    use crate::shapes::{Circle, Edge, Polygon};
    use slotmap::SlotMap;

    struct Pair {
        fixtures: SlotMap<FixtureHandle, Fixture>,
        a: FixtureHandle,
        b: FixtureHandle,
    }

    fn pair(def_a: FixtureDef, def_b: FixtureDef) -> Pair {
        let mut bodies: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        let body_a = bodies.insert(());
        let body_b = bodies.insert(());
        let mut fixtures = SlotMap::with_key();
        let a = fixtures.insert(Fixture::new(body_a, &def_a));
        let b = fixtures.insert(Fixture::new(body_b, &def_b));
        Pair { fixtures, a, b }
    }

    fn contact(p: &Pair) -> Option<Contact> {
        Contact::new(p.a, &p.fixtures[p.a], 0, p.b, &p.fixtures[p.b], 0)
    }

    #[test]
    fn test_new_orders_by_shape_rank() {
        let p = pair(
            FixtureDef::new(Circle::new(0.5)).with_friction(0.4).with_restitution(0.1),
            FixtureDef::new(Polygon::new_box(1.0, 1.0)).with_friction(0.9).with_restitution(0.6),
        );
        let c = contact(&p).unwrap();
        assert_eq!(c.fixture_a(), p.b);
        assert_eq!(c.fixture_b(), p.a);
        assert_eq!(c.body_a(), p.fixtures[p.b].body());
        assert_eq!(c.other_body(c.body_a()), c.body_b());
        assert!((c.friction() - (0.4f64 * 0.9).sqrt()).abs() < 1e-12);
        assert_eq!(c.restitution(), 0.6);
        assert!(!c.is_touching());
    }

    #[test]
    fn test_edges_never_pair() {
        let p = pair(
            FixtureDef::new(Edge::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0))),
            FixtureDef::new(Edge::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0))),
        );
        assert!(contact(&p).is_none());
        assert!(!can_collide(ShapeType::Chain, ShapeType::Edge));
        assert!(can_collide(ShapeType::Chain, ShapeType::Circle));
    }

    #[test]
    fn test_update_carries_impulses_by_id() {
        let p = pair(
            FixtureDef::new(Polygon::new_box(5.0, 0.5)),
            FixtureDef::new(Polygon::new_box(0.5, 0.5)),
        );
        let mut c = contact(&p).unwrap();
        let shape_a = p.fixtures[c.fixture_a()].shape().clone();
        let shape_b = p.fixtures[c.fixture_b()].shape().clone();
        let xf_a = Transform::identity();
        let xf_b = Transform::new(Vec2::new(0.0, 0.99), 0.0);

        let update = c.update(&shape_a, &xf_a, &shape_b, &xf_b, false);
        assert!(update.touching && !update.was_touching);
        assert_eq!(c.manifold().point_count(), 2);

        for (i, point) in c.manifold.points.iter_mut().enumerate() {
            point.normal_impulse = 1.0 + i as f64;
        }
        let ids: Vec<_> = c.manifold().points.iter().map(|p| p.id).collect();

        let xf_b = Transform::new(Vec2::new(0.01, 0.99), 0.0);
        let update = c.update(&shape_a, &xf_a, &shape_b, &xf_b, false);
        assert!(update.touching && update.was_touching);
        for point in &c.manifold().points {
            let index = ids.iter().position(|id| *id == point.id).unwrap();
            assert_eq!(point.normal_impulse, 1.0 + index as f64);
        }

        let far = Transform::new(Vec2::new(0.0, 5.0), 0.0);
        let update = c.update(&shape_a, &xf_a, &shape_b, &far, false);
        assert!(!update.touching && update.was_touching);
        assert_eq!(update.old_manifold.point_count(), 2);
    }

    #[test]
    fn test_sensor_reports_overlap_without_points() {
        let p = pair(
            FixtureDef::new(Circle::new(1.0)).with_sensor(true),
            FixtureDef::new(Circle::new(1.0)),
        );
        let mut c = contact(&p).unwrap();
        let shape = Shape::Circle(Circle::new(1.0));
        c.set_enabled(false);
        let update = c.update(&shape, &Transform::identity(), &shape, &Transform::new(Vec2::new(1.5, 0.0), 0.0), true);
        assert!(update.touching);
        assert!(update.sensor);
        assert!(c.is_enabled());
        assert!(c.manifold().is_empty());
    }
}
