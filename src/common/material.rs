//! Surface properties of a fixture.

/// Friction and restitution of a fixture's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    /// 0 = perfectly inelastic (no bounce), 1 = perfectly elastic.
    pub restitution: f64,
    /// Coulomb friction coefficient. Range [0, infinity).
    pub friction: f64,
}

impl Material {
    /// Creates a new material with the given restitution and friction.
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }

    /// Friction of a contact between two surfaces: the geometric mean, so a
    /// frictionless surface always slides.
    pub fn mix_friction(a: &Material, b: &Material) -> f64 {
        (a.friction * b.friction).sqrt()
    }

    /// Restitution of a contact between two surfaces: the bouncier one wins.
    pub fn mix_restitution(a: &Material, b: &Material) -> f64 {
        a.restitution.max(b.restitution)
    }
}

impl Default for Material {
    /// Inelastic with light friction.
    fn default() -> Self {
        Material {
            restitution: 0.0,
            friction: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_new_clamps() {
        let m = Material::new(1.5, -2.0);
        assert_eq!(m.restitution, 1.0);
        assert_eq!(m.friction, 0.0);
    }

    #[test]
    fn test_material_mixing() {
        let ice = Material::new(0.1, 0.0);
        let rubber = Material::new(0.8, 0.9);
        assert_eq!(Material::mix_friction(&ice, &rubber), 0.0);
        assert_eq!(Material::mix_restitution(&ice, &rubber), 0.8);

        let a = Material::new(0.0, 0.4);
        let b = Material::new(0.0, 0.9);
        assert!((Material::mix_friction(&a, &b) - 0.6).abs() < 1e-12);
    }
}
