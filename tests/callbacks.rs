use std::cell::RefCell;
use std::rc::Rc;

use impulse2d::constraints::ContactImpulse;
use impulse2d::{
    BodyDef, BodyHandle, Circle, Contact, ContactListener, FixtureDef, FixtureHandle, Manifold, PhysicsWorld, Polygon,
    Vec2, WorldQuery, AABB,
};

const DT: f64 = 1.0 / 60.0;

#[derive(Debug, Default)]
struct Counts {
    begin: usize,
    end: usize,
    pre_solve: usize,
    post_solve: usize,
    max_normal_impulse: f64,
}

struct Recorder {
    counts: Rc<RefCell<Counts>>,
    disable_contacts: bool,
}

impl Recorder {
    fn new(disable_contacts: bool) -> (Self, Rc<RefCell<Counts>>) {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let recorder = Recorder {
            counts: counts.clone(),
            disable_contacts,
        };
        (recorder, counts)
    }
}

impl ContactListener for Recorder {
    fn begin_contact(&mut self, _contact: &Contact, _world: &WorldQuery<'_>) {
        self.counts.borrow_mut().begin += 1;
    }

    fn end_contact(&mut self, _contact: &Contact, _world: &WorldQuery<'_>) {
        self.counts.borrow_mut().end += 1;
    }

    fn pre_solve(&mut self, contact: &mut Contact, _old_manifold: &Manifold, _world: &WorldQuery<'_>) {
        self.counts.borrow_mut().pre_solve += 1;
        if self.disable_contacts {
            contact.set_enabled(false);
        }
    }

    fn post_solve(&mut self, _contact: &Contact, impulse: &ContactImpulse, _world: &WorldQuery<'_>) {
        let mut counts = self.counts.borrow_mut();
        counts.post_solve += 1;
        for normal in &impulse.normal_impulses {
            counts.max_normal_impulse = counts.max_normal_impulse.max(*normal);
        }
    }
}

fn drop_ball(world: &mut PhysicsWorld, sensor_ground: bool) -> BodyHandle {
    let ground = world.create_body(&BodyDef::fixed(Vec2::new(0.0, -10.0))).unwrap();
    world
        .create_fixture(
            ground,
            &FixtureDef::new(Polygon::new_box(50.0, 10.0)).with_sensor(sensor_ground),
        )
        .unwrap();

    let ball = world.create_body(&BodyDef::dynamic(Vec2::new(0.0, 2.0))).unwrap();
    world
        .create_fixture(ball, &FixtureDef::new(Circle::new(0.5)).with_density(1.0))
        .unwrap();
    ball
}

#[test]
fn listener_sees_contact_lifecycle() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (recorder, counts) = Recorder::new(false);
    world.set_contact_listener(recorder);
    let ball = drop_ball(&mut world, false);

    for _ in 0..60 {
        world.step(DT, 8, 3);
    }
    {
        let counts = counts.borrow();
        assert_eq!(counts.begin, 1);
        assert_eq!(counts.end, 0);
        assert!(counts.pre_solve > 0);
        assert!(counts.post_solve > 0);
        assert!(counts.max_normal_impulse > 0.0);
    }

    // Destroying a touching body ends its contacts.
    world.destroy_body(ball).unwrap();
    assert_eq!(counts.borrow().end, 1);
}

#[test]
fn disabled_contacts_let_bodies_pass_through() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (recorder, counts) = Recorder::new(true);
    world.set_contact_listener(recorder);
    let ball = drop_ball(&mut world, false);

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    assert!(counts.borrow().pre_solve > 0);
    assert!(world.body(ball).unwrap().position().y < -1.0);
}

#[test]
fn sensors_report_overlap_without_response() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (recorder, counts) = Recorder::new(false);
    world.set_contact_listener(recorder);
    let ball = drop_ball(&mut world, true);

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let counts = counts.borrow();
    assert_eq!(counts.begin, 1);
    assert_eq!(counts.pre_solve, 0);
    assert_eq!(counts.post_solve, 0);
    assert!(world.body(ball).unwrap().position().y < -1.0);
    assert!(world.contacts().all(|(_, c)| c.manifold().is_empty()));
}

#[derive(Debug, Default)]
struct Sightings {
    contact_fixtures: Vec<FixtureHandle>,
    ray_hits: Vec<FixtureHandle>,
    aabb_hits: Vec<FixtureHandle>,
    listed_contacts: usize,
    pre_solve_listed: usize,
}

/// Looks around the world from inside the callbacks.
struct Lookout(Rc<RefCell<Sightings>>);

impl ContactListener for Lookout {
    fn begin_contact(&mut self, contact: &Contact, world: &WorldQuery<'_>) {
        let mut seen = self.0.borrow_mut();
        seen.contact_fixtures = vec![contact.fixture_a(), contact.fixture_b()];

        let mut ray_hits = Vec::new();
        world.ray_cast(Vec2::new(0.0, 5.0), Vec2::new(0.0, -5.0), |fixture, _point, _normal, _fraction| {
            ray_hits.push(fixture);
            1.0
        });
        seen.ray_hits = ray_hits;

        let mut aabb_hits = Vec::new();
        world.query_aabb(&AABB::new(Vec2::new(19.9, -5.1), Vec2::new(20.1, -4.9)), |fixture| {
            aabb_hits.push(fixture);
            true
        });
        seen.aabb_hits = aabb_hits;

        seen.listed_contacts = world.contacts().filter(|(_, c)| c.is_touching()).count();
    }

    fn pre_solve(&mut self, contact: &mut Contact, _old_manifold: &Manifold, world: &WorldQuery<'_>) {
        let listed = world
            .contacts()
            .filter(|(_, c)| c.fixture_a() == contact.fixture_a() && c.fixture_b() == contact.fixture_b())
            .count();
        self.0.borrow_mut().pre_solve_listed = listed;
    }
}

#[test]
fn callbacks_can_query_the_world() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let seen = Rc::new(RefCell::new(Sightings::default()));
    world.set_contact_listener(Lookout(seen.clone()));
    drop_ball(&mut world, false);

    for _ in 0..60 {
        world.step(DT, 8, 3);
    }

    let seen = seen.borrow();
    assert_eq!(seen.contact_fixtures.len(), 2);
    // The downward ray crosses the ball and enters the ground.
    for fixture in &seen.contact_fixtures {
        assert!(seen.ray_hits.contains(fixture), "ray missed {fixture:?}");
    }
    // Deep inside the ground only its own proxy is found.
    assert!(seen.aabb_hits.len() == 1 && seen.contact_fixtures.contains(&seen.aabb_hits[0]));
    assert_eq!(seen.listed_contacts, 1);
    assert_eq!(seen.pre_solve_listed, 1);
}
