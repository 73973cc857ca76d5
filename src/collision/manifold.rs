use arrayvec::ArrayVec;

use crate::common::settings::MAX_MANIFOLD_POINTS;
use crate::math::{Transform, Vec2};

/// Whether a contact feature is a vertex or a face of its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureType {
    #[default]
    Vertex = 0,
    Face = 1,
}

/// The features that intersect to form a contact point. Two points with the
/// same features on consecutive steps are the same physical contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContactFeature {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: FeatureType,
    pub type_b: FeatureType,
}

impl ContactFeature {
    /// Packs the feature into a single key for fast comparison.
    pub fn key(&self) -> u32 {
        u32::from(self.index_a)
            | u32::from(self.index_b) << 8
            | (self.type_a as u32) << 16
            | (self.type_b as u32) << 24
    }

    /// The same contact seen from the other shape.
    pub fn swapped(&self) -> ContactFeature {
        ContactFeature {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// A contact point. `local_point` depends on the manifold type:
/// circles: center of circle B; face A: point on B; face B: point on A.
/// Impulses persist across steps for warm starting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifoldPoint {
    pub local_point: Vec2,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
    pub id: ContactFeature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldType {
    #[default]
    Circles,
    FaceA,
    FaceB,
}

/// Contact points for two touching convex shapes, stored in local
/// coordinates so they remain valid as the bodies move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifold {
    pub points: ArrayVec<ManifoldPoint, MAX_MANIFOLD_POINTS>,
    /// Not used for `Circles`.
    pub local_normal: Vec2,
    /// Circles: center of circle A. Face A/B: a point on the reference face.
    pub local_point: Vec2,
    pub manifold_type: ManifoldType,
}

impl Manifold {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Looks up a point by feature id.
    pub fn find_point(&self, id: ContactFeature) -> Option<&ManifoldPoint> {
        let key = id.key();
        self.points.iter().find(|p| p.id.key() == key)
    }
}

/// A manifold evaluated in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldManifold {
    /// Points from A to B.
    pub normal: Vec2,
    /// Midpoints between the two surfaces.
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Negative when overlapping.
    pub separations: [f64; MAX_MANIFOLD_POINTS],
}

impl WorldManifold {
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f64,
        xf_b: &Transform,
        radius_b: f64,
    ) -> Self {
        let mut wm = WorldManifold::default();
        if manifold.is_empty() {
            return wm;
        }

        match manifold.manifold_type {
            ManifoldType::Circles => {
                let mut normal = Vec2::new(1.0, 0.0);
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                if point_a.distance_squared(point_b) > f64::EPSILON * f64::EPSILON {
                    normal = (point_b - point_a).normalize();
                }
                let c_a = point_a + normal * radius_a;
                let c_b = point_b - normal * radius_b;
                wm.normal = normal;
                wm.points[0] = (c_a + c_b) * 0.5;
                wm.separations[0] = (c_b - c_a).dot(normal);
            }
            ManifoldType::FaceA => {
                let normal = xf_a.rotation.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for (i, mp) in manifold.points.iter().enumerate() {
                    let clip_point = xf_b.apply(mp.local_point);
                    let c_a = clip_point + normal * (radius_a - (clip_point - plane_point).dot(normal));
                    let c_b = clip_point - normal * radius_b;
                    wm.points[i] = (c_a + c_b) * 0.5;
                    wm.separations[i] = (c_b - c_a).dot(normal);
                }
                wm.normal = normal;
            }
            ManifoldType::FaceB => {
                let normal = xf_b.rotation.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for (i, mp) in manifold.points.iter().enumerate() {
                    let clip_point = xf_a.apply(mp.local_point);
                    let c_b = clip_point + normal * (radius_b - (clip_point - plane_point).dot(normal));
                    let c_a = clip_point - normal * radius_a;
                    wm.points[i] = (c_a + c_b) * 0.5;
                    wm.separations[i] = (c_a - c_b).dot(normal);
                }
                // Ensure normal points from A to B.
                wm.normal = -normal;
            }
        }
        wm
    }
}

/// Life cycle of a contact point between two manifolds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointState {
    /// Point does not exist.
    #[default]
    Null,
    /// Point was added in the update.
    Add,
    /// Point persisted across the update.
    Persist,
    /// Point was removed in the update.
    Remove,
}

/// Classifies the points of `manifold1` (old) and `manifold2` (new) by id.
pub fn point_states(
    manifold1: &Manifold,
    manifold2: &Manifold,
) -> ([PointState; MAX_MANIFOLD_POINTS], [PointState; MAX_MANIFOLD_POINTS]) {
    let mut state1 = [PointState::Null; MAX_MANIFOLD_POINTS];
    let mut state2 = [PointState::Null; MAX_MANIFOLD_POINTS];

    for (i, p) in manifold1.points.iter().enumerate() {
        state1[i] = if manifold2.find_point(p.id).is_some() {
            PointState::Persist
        } else {
            PointState::Remove
        };
    }
    for (i, p) in manifold2.points.iter().enumerate() {
        state2[i] = if manifold1.find_point(p.id).is_some() {
            PointState::Persist
        } else {
            PointState::Add
        };
    }
    (state1, state2)
}

/// A vertex produced while clipping, tagged with the features that made it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClipVertex {
    pub v: Vec2,
    pub id: ContactFeature,
}

/// Sutherland-Hodgman clipping of a segment against the half-plane
/// `dot(normal, x) <= offset`. New vertices record `vertex_index_a` as the
/// clipping feature.
pub fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f64,
    vertex_index_a: usize,
) -> ArrayVec<ClipVertex, 2> {
    let mut v_out = ArrayVec::new();

    let distance0 = normal.dot(v_in[0].v) - offset;
    let distance1 = normal.dot(v_in[1].v) - offset;

    // Points behind the plane survive.
    if distance0 <= 0.0 {
        v_out.push(v_in[0]);
    }
    if distance1 <= 0.0 {
        v_out.push(v_in[1]);
    }

    // The points straddle the plane.
    if distance0 * distance1 < 0.0 {
        let interp = distance0 / (distance0 - distance1);
        v_out.push(ClipVertex {
            v: v_in[0].v + (v_in[1].v - v_in[0].v) * interp,
            id: ContactFeature {
                index_a: vertex_index_a as u8,
                index_b: v_in[0].id.index_b,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            },
        });
    }
    v_out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id_a: u8, id_b: u8) -> ManifoldPoint {
        ManifoldPoint {
            id: ContactFeature {
                index_a: id_a,
                index_b: id_b,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_feature_key_is_unique_per_feature() {
        let a = point(1, 2).id;
        let b = point(2, 1).id;
        assert_ne!(a.key(), b.key());
        assert_eq!(a.swapped().swapped(), a);
        assert_eq!(a.key(), 1 | 2 << 8 | 1 << 16);
    }

    #[test]
    fn test_point_states() {
        let mut m1 = Manifold::default();
        m1.points.push(point(0, 1));
        m1.points.push(point(0, 2));
        let mut m2 = Manifold::default();
        m2.points.push(point(0, 2));
        m2.points.push(point(0, 3));

        let (s1, s2) = point_states(&m1, &m2);
        assert_eq!(s1, [PointState::Remove, PointState::Persist]);
        assert_eq!(s2, [PointState::Persist, PointState::Add]);
    }

    #[test]
    fn test_clip_segment_to_line() {
        let v_in = [
            ClipVertex {
                v: Vec2::new(-1.0, 0.0),
                id: ContactFeature::default(),
            },
            ClipVertex {
                v: Vec2::new(1.0, 0.0),
                id: ContactFeature::default(),
            },
        ];
        // Keep x <= 0.5.
        let out = clip_segment_to_line(&v_in, Vec2::new(1.0, 0.0), 0.5, 3);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].v, Vec2::new(-1.0, 0.0));
        assert!((out[1].v - Vec2::new(0.5, 0.0)).magnitude() < 1e-12);
        assert_eq!(out[1].id.index_a, 3);
        assert_eq!(out[1].id.type_b, FeatureType::Face);

        // Both points in front.
        let out = clip_segment_to_line(&v_in, Vec2::new(1.0, 0.0), -2.0, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_world_manifold_circles() {
        let mut m = Manifold::default();
        m.manifold_type = ManifoldType::Circles;
        m.points.push(ManifoldPoint::default());
        let xf_a = Transform::identity();
        let xf_b = Transform::new(Vec2::new(1.5, 0.0), 0.0);
        let wm = WorldManifold::new(&m, &xf_a, 1.0, &xf_b, 1.0);
        assert_eq!(wm.normal, Vec2::new(1.0, 0.0));
        assert!((wm.separations[0] + 0.5).abs() < 1e-12);
        assert!((wm.points[0] - Vec2::new(0.75, 0.0)).magnitude() < 1e-12);
    }
}
