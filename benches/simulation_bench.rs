use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use impulse2d::{BodyDef, Circle, FixtureDef, PhysicsWorld, Polygon, RevoluteJointDef, Vec2};

const DT: f64 = 1.0 / 60.0;
const STEPS: usize = 30;

fn ground(world: &mut PhysicsWorld) {
    let ground = world.create_body(&BodyDef::fixed(Vec2::new(0.0, -1.0))).unwrap();
    world
        .create_fixture(ground, &FixtureDef::new(Polygon::new_box(100.0, 1.0)))
        .unwrap();
}

// --- Helper for creating pile benchmarks ---
fn run_circle_pile_bench(world: &mut PhysicsWorld, num_circles: usize) {
    let radius = 0.5;
    let columns = 10;

    for i in 0..num_circles {
        let column = (i % columns) as f64;
        let row = (i / columns) as f64;
        // Stagger the rows so the pile settles instead of balancing.
        let x = (column - columns as f64 / 2.0) * 1.1 + (row % 2.0) * 0.3;
        let y = radius + row * (radius * 2.1);
        let body = world.create_body(&BodyDef::dynamic(Vec2::new(x, y))).unwrap();
        world
            .create_fixture(body, &FixtureDef::new(Circle::new(radius)).with_density(1.0))
            .unwrap();
    }

    for _ in 0..STEPS {
        world.step(black_box(DT), 8, 3);
    }
}

// --- Helper for creating chain benchmarks ---
fn run_revolute_chain_bench(world: &mut PhysicsWorld, num_links: usize) {
    let half_length = 0.25;
    let anchor_pos = Vec2::new(0.0, 20.0);
    let mut previous = world.create_body(&BodyDef::fixed(anchor_pos)).unwrap();

    for i in 0..num_links {
        let center = Vec2::new(anchor_pos.x + half_length * (2 * i + 1) as f64, anchor_pos.y);
        let link = world.create_body(&BodyDef::dynamic(center)).unwrap();
        world
            .create_fixture(
                link,
                &FixtureDef::new(Polygon::new_box(half_length, 0.05)).with_density(20.0),
            )
            .unwrap();

        let pivot = Vec2::new(center.x - half_length, center.y);
        let def = RevoluteJointDef::initialize(
            previous,
            world.body(previous).unwrap(),
            link,
            world.body(link).unwrap(),
            pivot,
        );
        world.create_joint(def).unwrap();
        previous = link;
    }

    for _ in 0..STEPS {
        world.step(black_box(DT), 8, 3);
    }
}

// Benchmark for a pile of circles falling on the ground
fn bench_circle_pile(c: &mut Criterion) {
    let mut group = c.benchmark_group("circle_pile");

    for num_circles in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_circles), num_circles, |b, &n| {
            b.iter(|| {
                let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
                ground(&mut world);
                run_circle_pile_bench(&mut world, black_box(n));
            });
        });
    }
    group.finish();
}

// Benchmark for a chain of links hanging from revolute joints
fn bench_revolute_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("revolute_chain");

    for num_links in [10, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(num_links), num_links, |b, &n| {
            b.iter(|| {
                let mut world = PhysicsWorld::new(Vec2::new(0.0, -10.0));
                run_revolute_chain_bench(&mut world, black_box(n));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_circle_pile, bench_revolute_chain);
criterion_main!(benches);
