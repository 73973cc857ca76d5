use impulse2d::{BodyDef, BodyHandle, Circle, FixtureDef, PhysicsWorld, Polygon, Vec2};

const DT: f64 = 1.0 / 60.0;

fn build_scene() -> (PhysicsWorld, Vec<BodyHandle>) {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let ground = world.create_body(&BodyDef::fixed(Vec2::new(0.0, -1.0))).unwrap();
    world
        .create_fixture(ground, &FixtureDef::new(Polygon::new_box(20.0, 1.0)))
        .unwrap();

    let mut bodies = Vec::new();
    for i in 0..6 {
        let x = 0.1 * i as f64;
        let body = world
            .create_body(&BodyDef::dynamic(Vec2::new(x, 0.5 + 1.05 * i as f64)))
            .unwrap();
        world
            .create_fixture(
                body,
                &FixtureDef::new(Polygon::new_box(0.5, 0.5))
                    .with_density(1.0)
                    .with_friction(0.6),
            )
            .unwrap();
        bodies.push(body);
    }

    let ball = world.create_body(&BodyDef::dynamic(Vec2::new(-6.0, 2.0))).unwrap();
    world
        .create_fixture(ball, &FixtureDef::new(Circle::new(0.4)).with_density(2.0))
        .unwrap();
    world
        .body_mut(ball)
        .unwrap()
        .set_linear_velocity(Vec2::new(12.0, 0.0));
    bodies.push(ball);

    (world, bodies)
}

#[test]
fn identical_scenes_produce_identical_trajectories() {
    let (mut first, first_bodies) = build_scene();
    let (mut second, second_bodies) = build_scene();

    for step in 0..120 {
        first.step(DT, 8, 3);
        second.step(DT, 8, 3);

        for (a, b) in first_bodies.iter().zip(&second_bodies) {
            let a = first.body(*a).unwrap();
            let b = second.body(*b).unwrap();
            assert_eq!(a.position(), b.position(), "diverged at step {step}");
            assert_eq!(a.angle(), b.angle(), "diverged at step {step}");
            assert_eq!(a.linear_velocity(), b.linear_velocity(), "diverged at step {step}");
        }
    }

    assert_eq!(first.stats(), second.stats());
}
