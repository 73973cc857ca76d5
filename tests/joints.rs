use impulse2d::{
    BodyDef, BodyHandle, DistanceJoint, DistanceJointDef, FixtureDef, Joint, JointType, MotorJoint, MotorJointDef,
    PhysicsWorld, Polygon, RevoluteJoint, RevoluteJointDef, Vec2, WorldError,
};

const DT: f64 = 1.0 / 60.0;

fn anchor_and_bob(world: &mut PhysicsWorld, bob_position: Vec2) -> (BodyHandle, BodyHandle) {
    let anchor = world.create_body(&BodyDef::fixed(Vec2::new(0.0, 10.0))).unwrap();
    let bob = world.create_body(&BodyDef::dynamic(bob_position)).unwrap();
    world
        .create_fixture(bob, &FixtureDef::new(Polygon::new_box(0.25, 0.25)).with_density(1.0))
        .unwrap();
    (anchor, bob)
}

#[test]
fn revolute_pendulum_keeps_its_radius() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (anchor, bob) = anchor_and_bob(&mut world, Vec2::new(2.0, 10.0));
    let def = RevoluteJointDef::initialize(
        anchor,
        world.body(anchor).unwrap(),
        bob,
        world.body(bob).unwrap(),
        Vec2::new(0.0, 10.0),
    );
    let joint = world.create_joint(def).unwrap();
    assert_eq!(world.joint(joint).unwrap().joint_type(), JointType::Revolute);

    for _ in 0..60 {
        world.step(DT, 8, 3);
        let p = world.body(bob).unwrap().position();
        let radius = (p - Vec2::new(0.0, 10.0)).magnitude();
        assert!((radius - 2.0).abs() < 0.05, "radius {radius}");
    }

    // The bob swung down.
    assert!(world.body(bob).unwrap().position().y < 9.0);
    let revolute = world.joint_as::<RevoluteJoint>(joint).unwrap();
    let anchor_b = world.joint(joint).unwrap().anchor_b(world.body(bob).unwrap());
    assert!((anchor_b - Vec2::new(0.0, 10.0)).magnitude() < 0.05);
    assert!(revolute.reaction_force(60.0).magnitude() > 0.0);
}

#[test]
fn distance_joint_holds_length() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (anchor, bob) = anchor_and_bob(&mut world, Vec2::new(3.0, 10.0));
    let def = DistanceJointDef::initialize(
        anchor,
        world.body(anchor).unwrap(),
        bob,
        world.body(bob).unwrap(),
        Vec2::new(0.0, 10.0),
        Vec2::new(3.0, 10.0),
    );
    let joint = world.create_joint(def).unwrap();
    assert!((world.joint_as::<DistanceJoint>(joint).unwrap().length() - 3.0).abs() < 1e-9);

    for _ in 0..90 {
        world.step(DT, 8, 3);
    }

    let p = world.body(bob).unwrap().position();
    assert!(((p - Vec2::new(0.0, 10.0)).magnitude() - 3.0).abs() < 0.05);
    assert!(p.y < 9.0);
}

#[test]
fn motor_joint_drives_body_to_offset() {
    let mut world = PhysicsWorld::new(Vec2::ZERO);
    let (anchor, body) = anchor_and_bob(&mut world, Vec2::new(0.0, 10.0));
    let def = MotorJointDef {
        max_force: 1000.0,
        max_torque: 1000.0,
        ..MotorJointDef::initialize(anchor, world.body(anchor).unwrap(), body, world.body(body).unwrap())
    };
    let joint = world.create_joint(def).unwrap();
    world
        .joint_mut::<MotorJoint>(joint)
        .unwrap()
        .set_linear_offset(Vec2::new(3.0, 0.0));

    for _ in 0..120 {
        world.step(DT, 8, 3);
    }

    let p = world.body(body).unwrap().position();
    assert!((p - Vec2::new(3.0, 10.0)).magnitude() < 0.05, "at {p:?}");
}

#[test]
fn destroying_joint_wakes_bodies() {
    let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
    let (anchor, bob) = anchor_and_bob(&mut world, Vec2::new(0.0, 8.0));
    let def = RevoluteJointDef::initialize(
        anchor,
        world.body(anchor).unwrap(),
        bob,
        world.body(bob).unwrap(),
        Vec2::new(0.0, 10.0),
    );
    let joint = world.create_joint(def).unwrap();

    // Hanging straight down, the pendulum comes to rest and sleeps.
    for _ in 0..240 {
        world.step(DT, 8, 3);
    }
    assert!(!world.body(bob).unwrap().is_awake());

    world.destroy_joint(joint).unwrap();
    assert!(world.body(bob).unwrap().is_awake());
    assert_eq!(world.destroy_joint(joint), Err(WorldError::InvalidJoint));

    let before = world.body(bob).unwrap().position().y;
    for _ in 0..10 {
        world.step(DT, 8, 3);
    }
    assert!(world.body(bob).unwrap().position().y < before);
}
