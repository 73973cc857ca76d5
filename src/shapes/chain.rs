use crate::collision::{RayCastInput, RayCastOutput, AABB};
use crate::common::settings::POLYGON_RADIUS;
use crate::math::{Transform, Vec2};
use crate::shapes::{Edge, MassData};

/// A connected sequence of one-sided edges. Each child edge collides on the
/// right side of the chain direction; a counter-clockwise loop therefore
/// collides on its outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub(crate) vertices: Vec<Vec2>,
    pub(crate) prev_vertex: Vec2,
    pub(crate) next_vertex: Vec2,
    pub radius: f64,
}

impl Chain {
    /// Closed loop through `vertices`. The first vertex is repeated at the end.
    pub fn new_loop(vertices: &[Vec2]) -> Self {
        let mut vs = vertices.to_vec();
        if let Some(first) = vertices.first() {
            vs.push(*first);
        }
        let n = vs.len();
        let (prev_vertex, next_vertex) = if n >= 3 {
            (vs[n - 2], vs[1])
        } else {
            (Vec2::ZERO, Vec2::ZERO)
        };
        Self {
            vertices: vs,
            prev_vertex,
            next_vertex,
            radius: POLYGON_RADIUS,
        }
    }

    /// Open chain with ghost vertices before the first and after the last vertex.
    pub fn new_chain(vertices: &[Vec2], prev_vertex: Vec2, next_vertex: Vec2) -> Self {
        Self {
            vertices: vertices.to_vec(),
            prev_vertex,
            next_vertex,
            radius: POLYGON_RADIUS,
        }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// One child per segment.
    pub fn child_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// The one-sided edge for segment `index`, with its neighbours as ghosts.
    pub fn child_edge(&self, index: usize) -> Edge {
        let n = self.vertices.len();
        debug_assert!(index + 1 < n);
        let v0 = if index > 0 {
            self.vertices[index - 1]
        } else {
            self.prev_vertex
        };
        let v3 = if index + 2 < n {
            self.vertices[index + 2]
        } else {
            self.next_vertex
        };
        let mut edge = Edge::new_one_sided(v0, self.vertices[index], self.vertices[index + 1], v3);
        edge.radius = self.radius;
        edge
    }

    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform, child_index: usize) -> Option<RayCastOutput> {
        // Chains are hit from either side when ray cast.
        let mut edge = self.child_edge(child_index);
        edge.one_sided = false;
        edge.ray_cast(input, xf)
    }

    pub fn compute_aabb(&self, xf: &Transform, child_index: usize) -> AABB {
        let v1 = xf.apply(self.vertices[child_index]);
        let v2 = xf.apply(self.vertices[child_index + 1]);
        AABB {
            min: v1.min(v2),
            max: v1.max(v2),
        }
        .expanded(self.radius)
    }

    /// Chains are massless.
    pub fn compute_mass(&self, _density: f64) -> MassData {
        MassData::default()
    }

    pub fn compute_distance(&self, xf: &Transform, p: Vec2, child_index: usize) -> (f64, Vec2) {
        self.child_edge(child_index).compute_distance(xf, p)
    }
}
