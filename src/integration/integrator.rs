use crate::common::settings::{MAX_ROTATION, MAX_ROTATION_SQUARED, MAX_TRANSLATION, MAX_TRANSLATION_SQUARED};
use crate::integration::time_step::{Position, Velocity};
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::{BodyType, RigidBody};

/// Integrates a body's velocity over `h` using Semi-Implicit Euler.
/// Only dynamic bodies feel gravity, forces and damping.
pub fn integrate_velocity(body: &RigidBody, gravity: Vec2, h: f64) -> Velocity {
    let mut v = body.linear_velocity;
    let mut w = body.angular_velocity;

    if body.body_type != BodyType::Dynamic {
        return Velocity { v, w };
    }

    // --- Linear Motion --- //
    // a = g + F/m
    let linear_acceleration = gravity * body.gravity_scale + body.force * body.inv_mass;
    v += linear_acceleration * h;

    // --- Angular Motion --- //
    w += h * body.inv_inertia * body.torque;

    // Apply damping.
    // ODE: dv/dt + c * v = 0
    // Pade approximation: v2 = v1 * 1 / (1 + c * dt)
    // Stable for large damping and converges to zero as c grows.
    v *= 1.0 / (1.0 + h * body.linear_damping);
    w *= 1.0 / (1.0 + h * body.angular_damping);

    Velocity { v, w }
}

/// Advances solver positions by `h`. Velocities that would move a body
/// further than the per-step translation or rotation limit are scaled down.
pub fn integrate_positions(positions: &mut [Position], velocities: &mut [Velocity], h: f64) {
    for (position, velocity) in positions.iter_mut().zip(velocities.iter_mut()) {
        let translation = velocity.v * h;
        if translation.magnitude_squared() > MAX_TRANSLATION_SQUARED {
            let ratio = MAX_TRANSLATION / translation.magnitude();
            velocity.v *= ratio;
        }

        let rotation = h * velocity.w;
        if rotation * rotation > MAX_ROTATION_SQUARED {
            let ratio = MAX_ROTATION / rotation.abs();
            velocity.w *= ratio;
        }

        position.c += velocity.v * h;
        position.a += h * velocity.w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::rigid_body::BodyDef;
    const EPSILON: f64 = 1e-9;

    fn dynamic_body() -> RigidBody {
        RigidBody::new(&BodyDef::dynamic(Vec2::ZERO))
    }

    #[test]
    fn test_integrate_velocity_gravity() {
        let rb = dynamic_body();
        let v = integrate_velocity(&rb, Vec2::new(0.0, -10.0), 0.1);
        assert!((v.v.y - -1.0).abs() < EPSILON);
        assert!(v.v.x.abs() < EPSILON);
        assert_eq!(v.w, 0.0);
    }

    #[test]
    fn test_integrate_velocity_constant_force() {
        let mut rb = dynamic_body();
        rb.mass = 2.0;
        rb.inv_mass = 0.5;
        rb.apply_force_to_center(Vec2::new(10.0, 0.0), true);
        // a = F/m = (5, 0)
        let v = integrate_velocity(&rb, Vec2::ZERO, 0.1);
        assert!((v.v.x - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_velocity_gravity_scale_and_damping() {
        let mut rb = dynamic_body();
        rb.set_gravity_scale(0.0);
        rb.set_linear_velocity(Vec2::new(4.0, 0.0));
        rb.set_linear_damping(1.0);
        let v = integrate_velocity(&rb, Vec2::new(0.0, -10.0), 1.0);
        // No gravity; halved by damping.
        assert!((v.v.x - 2.0).abs() < EPSILON);
        assert!(v.v.y.abs() < EPSILON);
    }

    #[test]
    fn test_integrate_velocity_ignores_kinematic_forces() {
        let mut def = BodyDef::dynamic(Vec2::ZERO);
        def.body_type = BodyType::Kinematic;
        def.linear_velocity = Vec2::new(1.0, 0.0);
        let rb = RigidBody::new(&def);
        let v = integrate_velocity(&rb, Vec2::new(0.0, -10.0), 0.1);
        assert_eq!(v.v, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_integrate_positions() {
        let mut positions = [Position::default()];
        let mut velocities = [Velocity {
            v: Vec2::new(10.0, -5.0),
            w: 1.0,
        }];
        integrate_positions(&mut positions, &mut velocities, 0.1);
        assert!((positions[0].c.x - 1.0).abs() < EPSILON);
        assert!((positions[0].c.y - -0.5).abs() < EPSILON);
        assert!((positions[0].a - 0.1).abs() < EPSILON);
        // Velocity unchanged
        assert_eq!(velocities[0].v, Vec2::new(10.0, -5.0));
    }

    #[test]
    fn test_integrate_positions_clamps_translation() {
        let mut positions = [Position::default()];
        let mut velocities = [Velocity {
            v: Vec2::new(1000.0, 0.0),
            w: 0.0,
        }];
        integrate_positions(&mut positions, &mut velocities, 1.0 / 60.0);
        assert!((positions[0].c.x - MAX_TRANSLATION).abs() < EPSILON);
        assert!((velocities[0].v.x - MAX_TRANSLATION * 60.0).abs() < 1e-6);
    }
}
