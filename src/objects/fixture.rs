use crate::collision::{BroadPhase, RayCastInput, RayCastOutput, AABB};
use crate::common::Material;
use crate::math::{Transform, Vec2};
use crate::objects::{BodyHandle, FixtureHandle};
use crate::shapes::{MassData, Shape, ShapeType};

/// Collision filtering data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filter {
    /// The collision category bits. Normally only one bit is set.
    pub category_bits: u16,
    /// The categories this fixture accepts collisions with.
    pub mask_bits: u16,
    /// Fixtures sharing a nonzero group always collide (positive) or never
    /// collide (negative). Zero means no group.
    pub group_index: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

/// Creation parameters for a fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDef {
    pub shape: Shape,
    /// Density in kg/m^2.
    pub density: f64,
    pub material: Material,
    /// Sensors report overlap but never produce a collision response.
    pub is_sensor: bool,
    pub filter: Filter,
}

impl FixtureDef {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            density: 0.0,
            material: Material::default(),
            is_sensor: false,
            filter: Filter::default(),
        }
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.material = Material::new(self.material.restitution, friction);
        self
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.material = Material::new(restitution, self.material.friction);
        self
    }

    pub fn with_sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

/// Broad-phase payload: which fixture child a proxy belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyKey {
    pub fixture: FixtureHandle,
    pub child_index: usize,
}

/// One broad-phase proxy per shape child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureProxy {
    /// Tight AABB swept over the last step.
    pub aabb: AABB,
    pub child_index: usize,
    pub proxy_id: usize,
}

/// A shape attached to a body with material and filtering data.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub(crate) body: BodyHandle,
    pub(crate) shape: Shape,
    pub(crate) density: f64,
    pub(crate) material: Material,
    pub(crate) is_sensor: bool,
    pub(crate) filter: Filter,
    pub(crate) proxies: Vec<FixtureProxy>,
}

impl Fixture {
    pub(crate) fn new(body: BodyHandle, def: &FixtureDef) -> Self {
        Self {
            body,
            shape: def.shape.clone(),
            density: def.density,
            material: def.material,
            is_sensor: def.is_sensor,
            filter: def.filter,
            proxies: Vec::new(),
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn friction(&self) -> f64 {
        self.material.friction
    }

    /// Only contacts created after this call use the new value.
    pub fn set_friction(&mut self, friction: f64) {
        self.material = Material::new(self.material.restitution, friction);
    }

    pub fn restitution(&self) -> f64 {
        self.material.restitution
    }

    /// Only contacts created after this call use the new value.
    pub fn set_restitution(&mut self, restitution: f64) {
        self.material = Material::new(restitution, self.material.friction);
    }

    pub fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn mass_data(&self) -> MassData {
        self.shape.compute_mass(self.density)
    }

    /// Point containment given the owning body's transform.
    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        self.shape.test_point(xf, p)
    }

    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform, child_index: usize) -> Option<RayCastOutput> {
        self.shape.ray_cast(input, xf, child_index)
    }

    /// The proxy AABB of a child, swept over the last step.
    pub fn aabb(&self, child_index: usize) -> Option<AABB> {
        self.proxies.get(child_index).map(|p| p.aabb)
    }

    pub fn proxies(&self) -> &[FixtureProxy] {
        &self.proxies
    }

    pub(crate) fn create_proxies(&mut self, broad_phase: &mut BroadPhase<ProxyKey>, xf: &Transform, handle: FixtureHandle) {
        debug_assert!(self.proxies.is_empty());

        for child_index in 0..self.shape.child_count() {
            let aabb = self.shape.compute_aabb(xf, child_index);
            let proxy_id = broad_phase.create_proxy(
                &aabb,
                ProxyKey {
                    fixture: handle,
                    child_index,
                },
            );
            self.proxies.push(FixtureProxy {
                aabb,
                child_index,
                proxy_id,
            });
        }
    }

    pub(crate) fn destroy_proxies(&mut self, broad_phase: &mut BroadPhase<ProxyKey>) {
        for proxy in self.proxies.drain(..) {
            broad_phase.destroy_proxy(proxy.proxy_id);
        }
    }

    /// Moves every proxy to cover the motion from `xf1` to `xf2`.
    pub(crate) fn synchronize(&mut self, broad_phase: &mut BroadPhase<ProxyKey>, xf1: &Transform, xf2: &Transform) {
        for proxy in self.proxies.iter_mut() {
            // Union of both poses; rotation in between is not covered.
            let aabb1 = self.shape.compute_aabb(xf1, proxy.child_index);
            let aabb2 = self.shape.compute_aabb(xf2, proxy.child_index);
            proxy.aabb = AABB::combine(&aabb1, &aabb2);

            let displacement = aabb2.center() - aabb1.center();
            broad_phase.move_proxy(proxy.proxy_id, &proxy.aabb, displacement);
        }
    }

    pub(crate) fn touch_proxies(&self, broad_phase: &mut BroadPhase<ProxyKey>) {
        for proxy in &self.proxies {
            broad_phase.touch_proxy(proxy.proxy_id);
        }
    }
}
