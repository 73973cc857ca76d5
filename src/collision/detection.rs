//! Narrow-phase: exact manifolds for pairs of convex shapes.

use crate::collision::manifold::{
    clip_segment_to_line, ClipVertex, ContactFeature, FeatureType, Manifold, ManifoldPoint,
    ManifoldType,
};
use crate::common::settings::{LINEAR_SLOP, MAX_MANIFOLD_POINTS, MAX_POLYGON_VERTICES};
use crate::math::{Transform, Vec2};
use crate::shapes::{Circle, Edge, Polygon, Shape};
use arrayvec::ArrayVec;

fn single_point(local_point: Vec2, id: ContactFeature) -> ManifoldPoint {
    ManifoldPoint {
        local_point,
        id,
        ..Default::default()
    }
}

/// Circle against circle.
pub fn collide_circles(circle_a: &Circle, xf_a: &Transform, circle_b: &Circle, xf_b: &Transform) -> Manifold {
    let mut manifold = Manifold::default();

    let p_a = xf_a.apply(circle_a.position);
    let p_b = xf_b.apply(circle_b.position);
    let radius = circle_a.radius + circle_b.radius;
    if p_a.distance_squared(p_b) > radius * radius {
        return manifold;
    }

    manifold.manifold_type = ManifoldType::Circles;
    manifold.local_point = circle_a.position;
    manifold.local_normal = Vec2::ZERO;
    manifold.points.push(single_point(circle_b.position, ContactFeature::default()));
    manifold
}

/// Polygon (A) against circle (B).
pub fn collide_polygon_and_circle(
    polygon_a: &Polygon,
    xf_a: &Transform,
    circle_b: &Circle,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle position in the frame of the polygon.
    let c = xf_b.apply(circle_b.position);
    let c_local = xf_a.apply_inverse(c);

    let radius = polygon_a.radius + circle_b.radius;
    let vertices = polygon_a.vertices();
    let normals = polygon_a.normals();
    let mut normal_index = 0;
    let mut separation = f64::MIN;
    for (i, (v, n)) in vertices.iter().zip(normals).enumerate() {
        let s = n.dot(c_local - *v);
        if s > radius {
            return manifold;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = vertices[normal_index];
    let v2 = vertices[(normal_index + 1) % vertices.len()];
    manifold.manifold_type = ManifoldType::FaceA;

    // Center is inside the polygon.
    if separation < f64::EPSILON {
        manifold.local_normal = normals[normal_index];
        manifold.local_point = (v1 + v2) * 0.5;
        manifold.points.push(single_point(circle_b.position, ContactFeature::default()));
        return manifold;
    }

    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if c_local.distance_squared(v1) > radius * radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v1).normalize();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if c_local.distance_squared(v2) > radius * radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v2).normalize();
        manifold.local_point = v2;
    } else {
        let face_center = (v1 + v2) * 0.5;
        if (c_local - face_center).dot(normals[normal_index]) > radius {
            return manifold;
        }
        manifold.local_normal = normals[normal_index];
        manifold.local_point = face_center;
    }
    manifold.points.push(single_point(circle_b.position, ContactFeature::default()));
    manifold
}

/// Largest separation of `poly2` along the face normals of `poly1`, and the
/// face that achieves it.
fn find_max_separation(poly1: &Polygon, xf1: &Transform, poly2: &Polygon, xf2: &Transform) -> (usize, f64) {
    let xf = xf2.mul_inverse(xf1);
    let mut best_index = 0;
    let mut max_separation = f64::MIN;

    for (i, (v, n)) in poly1.vertices().iter().zip(poly1.normals()).enumerate() {
        // Poly1 normal and vertex in the frame of poly2.
        let n = xf.rotation.apply(*n);
        let v1 = xf.apply(*v);

        // Deepest point of poly2 for normal i.
        let si = poly2
            .vertices()
            .iter()
            .map(|v2| n.dot(*v2 - v1))
            .fold(f64::MAX, f64::min);

        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (best_index, max_separation)
}

/// The edge of `poly2` most anti-parallel to reference face `edge1` of `poly1`, in world space.
fn find_incident_edge(
    poly1: &Polygon,
    xf1: &Transform,
    edge1: usize,
    poly2: &Polygon,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    // Reference normal in the frame of poly2.
    let normal1 = xf2.rotation.apply_inverse(xf1.rotation.apply(poly1.normals()[edge1]));

    let normals2 = poly2.normals();
    let mut index = 0;
    let mut min_dot = f64::MAX;
    for (i, n) in normals2.iter().enumerate() {
        let dot = normal1.dot(*n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = if i1 + 1 < normals2.len() { i1 + 1 } else { 0 };
    let vertices2 = poly2.vertices();
    let feature = |ib: usize| ContactFeature {
        index_a: edge1 as u8,
        index_b: ib as u8,
        type_a: FeatureType::Face,
        type_b: FeatureType::Vertex,
    };
    [
        ClipVertex {
            v: xf2.apply(vertices2[i1]),
            id: feature(i1),
        },
        ClipVertex {
            v: xf2.apply(vertices2[i2]),
            id: feature(i2),
        },
    ]
}

/// Polygon against polygon using the separating axis test followed by
/// reference-face clipping of the incident edge.
///
/// The reference face is the face of max separation; polygon B's face is
/// only preferred when it is clearly better, which keeps the choice stable
/// between steps.
pub fn collide_polygons(poly_a: &Polygon, xf_a: &Transform, poly_b: &Polygon, xf_b: &Transform) -> Manifold {
    let mut manifold = Manifold::default();
    let total_radius = poly_a.radius + poly_b.radius;

    let (edge_a, separation_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return manifold;
    }

    let (edge_b, separation_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return manifold;
    }

    const K_TOL: f64 = 0.1 * LINEAR_SLOP;
    let (poly1, poly2, xf1, xf2, edge1, flip) = if separation_b > separation_a + K_TOL {
        manifold.manifold_type = ManifoldType::FaceB;
        (poly_b, poly_a, xf_b, xf_a, edge_b, true)
    } else {
        manifold.manifold_type = ManifoldType::FaceA;
        (poly_a, poly_b, xf_a, xf_b, edge_a, false)
    };

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let vertices1 = poly1.vertices();
    let iv1 = edge1;
    let iv2 = if edge1 + 1 < vertices1.len() { edge1 + 1 } else { 0 };

    let mut v11 = vertices1[iv1];
    let mut v12 = vertices1[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = local_tangent.cross_scalar(1.0);
    let plane_point = (v11 + v12) * 0.5;

    let tangent = xf1.rotation.apply(local_tangent);
    let normal = tangent.cross_scalar(1.0);

    v11 = xf1.apply(v11);
    v12 = xf1.apply(v12);

    // Face offset.
    let front_offset = normal.dot(v11);

    // Side offsets, extended by polygon skin thickness.
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    // Clip the incident edge to the reference face's side planes.
    let clip_points1 = clip_segment_to_line(&incident_edge, -tangent, side_offset1, iv1);
    let Ok(clip_points1) = clip_points1.into_inner() else {
        return manifold;
    };
    let clip_points2 = clip_segment_to_line(&clip_points1, tangent, side_offset2, iv2);
    if clip_points2.len() < MAX_MANIFOLD_POINTS {
        return manifold;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    for cp in clip_points2.iter() {
        let separation = normal.dot(cp.v) - front_offset;
        if separation <= total_radius {
            manifold.points.push(ManifoldPoint {
                local_point: xf2.apply_inverse(cp.v),
                id: if flip { cp.id.swapped() } else { cp.id },
                ..Default::default()
            });
        }
    }
    manifold
}

/// Edge (A) against circle (B). One-sided edges ignore circles behind them
/// and defer vertex contacts to the neighbouring edge when it owns them.
pub fn collide_edge_and_circle(edge_a: &Edge, xf_a: &Transform, circle_b: &Circle, xf_b: &Transform) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle in frame of edge.
    let q = xf_a.apply_inverse(xf_b.apply(circle_b.position));

    let a = edge_a.vertex1;
    let b = edge_a.vertex2;
    let e = b - a;

    // Normal points to the right for a CCW winding.
    let mut n = e.perpendicular_cw();
    let offset = n.dot(q - a);

    if edge_a.one_sided && offset < 0.0 {
        return manifold;
    }

    // Barycentric coordinates.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let radius = edge_a.radius + circle_b.radius;

    let vertex_contact = |index_a: u8| ContactFeature {
        index_a,
        index_b: 0,
        type_a: FeatureType::Vertex,
        type_b: FeatureType::Vertex,
    };

    // Region A
    if v <= 0.0 {
        if q.distance_squared(a) > radius * radius {
            return manifold;
        }

        // A neighbouring edge owns this region.
        if edge_a.one_sided {
            let a1 = edge_a.vertex0;
            let b1 = a;
            let e1 = b1 - a1;
            if e1.dot(b1 - q) > 0.0 {
                return manifold;
            }
        }

        manifold.manifold_type = ManifoldType::Circles;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = a;
        manifold.points.push(single_point(circle_b.position, vertex_contact(0)));
        return manifold;
    }

    // Region B
    if u <= 0.0 {
        if q.distance_squared(b) > radius * radius {
            return manifold;
        }

        if edge_a.one_sided {
            let b2 = edge_a.vertex3;
            let a2 = b;
            let e2 = b2 - a2;
            if e2.dot(q - a2) > 0.0 {
                return manifold;
            }
        }

        manifold.manifold_type = ManifoldType::Circles;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = b;
        manifold.points.push(single_point(circle_b.position, vertex_contact(1)));
        return manifold;
    }

    // Region AB
    let den = e.magnitude_squared();
    let p = (a * u + b * v) * (1.0 / den);
    if q.distance_squared(p) > radius * radius {
        return manifold;
    }

    if offset < 0.0 {
        n = -n;
    }

    manifold.manifold_type = ManifoldType::FaceA;
    manifold.local_normal = n.normalize();
    manifold.local_point = a;
    manifold.points.push(single_point(
        circle_b.position,
        ContactFeature {
            index_a: 0,
            index_b: 0,
            type_a: FeatureType::Face,
            type_b: FeatureType::Vertex,
        },
    ));
    manifold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisType {
    Unknown,
    EdgeA,
    EdgeB,
}

#[derive(Debug, Clone, Copy)]
struct SeparationAxis {
    normal: Vec2,
    axis_type: AxisType,
    index: usize,
    separation: f64,
}

struct TempPolygon {
    vertices: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
    normals: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
}

fn compute_edge_separation(polygon_b: &TempPolygon, v1: Vec2, normal1: Vec2) -> SeparationAxis {
    let mut axis = SeparationAxis {
        normal: Vec2::ZERO,
        axis_type: AxisType::EdgeA,
        index: 0,
        separation: f64::MIN,
    };

    for (j, candidate) in [normal1, -normal1].into_iter().enumerate() {
        let sj = polygon_b
            .vertices
            .iter()
            .map(|v| candidate.dot(*v - v1))
            .fold(f64::MAX, f64::min);
        if sj > axis.separation {
            axis.index = j;
            axis.separation = sj;
            axis.normal = candidate;
        }
    }
    axis
}

fn compute_polygon_separation(polygon_b: &TempPolygon, v1: Vec2, v2: Vec2) -> SeparationAxis {
    let mut axis = SeparationAxis {
        normal: Vec2::ZERO,
        axis_type: AxisType::Unknown,
        index: 0,
        separation: f64::MIN,
    };

    for (i, (v, n)) in polygon_b.vertices.iter().zip(polygon_b.normals.iter()).enumerate() {
        let n = -*n;
        let s = n.dot(*v - v1).min(n.dot(*v - v2));
        if s > axis.separation {
            axis.axis_type = AxisType::EdgeB;
            axis.index = i;
            axis.separation = s;
            axis.normal = n;
        }
    }
    axis
}

/// Edge (A) against polygon (B).
///
/// Works in the edge's frame. For one-sided edges the chosen axis is checked
/// against the neighbouring edges' normals so a polygon sliding along a chain
/// does not catch on interior vertices.
pub fn collide_edge_and_polygon(edge_a: &Edge, xf_a: &Transform, polygon_b: &Polygon, xf_b: &Transform) -> Manifold {
    let mut manifold = Manifold::default();

    let xf = xf_a.mul_inverse(xf_b);
    let centroid_b = xf.apply(polygon_b.centroid());

    let v1 = edge_a.vertex1;
    let v2 = edge_a.vertex2;
    let edge1 = (v2 - v1).normalize();

    // Normal points to the right for a CCW winding.
    let normal1 = edge1.perpendicular_cw();
    let offset1 = normal1.dot(centroid_b - v1);

    let one_sided = edge_a.one_sided;
    if one_sided && offset1 < 0.0 {
        return manifold;
    }

    // Polygon B in frame A.
    let temp_b = TempPolygon {
        vertices: polygon_b.vertices().iter().map(|v| xf.apply(*v)).collect(),
        normals: polygon_b.normals().iter().map(|n| xf.rotation.apply(*n)).collect(),
    };

    let radius = polygon_b.radius + edge_a.radius;

    let edge_axis = compute_edge_separation(&temp_b, v1, normal1);
    if edge_axis.separation > radius {
        return manifold;
    }

    let polygon_axis = compute_polygon_separation(&temp_b, v1, v2);
    if polygon_axis.separation > radius {
        return manifold;
    }

    // Hysteresis for jitter reduction.
    const K_RELATIVE_TOL: f64 = 0.98;
    const K_ABSOLUTE_TOL: f64 = 0.001;

    let mut primary_axis =
        if polygon_axis.separation - radius > K_RELATIVE_TOL * (edge_axis.separation - radius) + K_ABSOLUTE_TOL {
            polygon_axis
        } else {
            edge_axis
        };

    if one_sided {
        let edge0 = (v1 - edge_a.vertex0).normalize();
        let normal0 = edge0.perpendicular_cw();
        let convex1 = edge0.cross(edge1) >= 0.0;

        let edge2 = (edge_a.vertex3 - v2).normalize();
        let normal2 = edge2.perpendicular_cw();
        let convex2 = edge1.cross(edge2) >= 0.0;

        const SIN_TOL: f64 = 0.1;
        let side1 = primary_axis.normal.dot(edge1) <= 0.0;

        if side1 {
            if convex1 {
                if primary_axis.normal.cross(normal0) > SIN_TOL {
                    // Skip region.
                    return manifold;
                }
            } else {
                // Snap region.
                primary_axis = edge_axis;
            }
        } else if convex2 {
            if normal2.cross(primary_axis.normal) > SIN_TOL {
                return manifold;
            }
        } else {
            primary_axis = edge_axis;
        }
    }

    let count_b = temp_b.vertices.len();
    let (clip_points, ref_i1, ref_i2, ref_v1, ref_v2, ref_normal, side_normal1) =
        if primary_axis.axis_type == AxisType::EdgeA {
            manifold.manifold_type = ManifoldType::FaceA;

            // The polygon normal most anti-parallel to the edge normal.
            let mut best_index = 0;
            let mut best_value = primary_axis.normal.dot(temp_b.normals[0]);
            for (i, n) in temp_b.normals.iter().enumerate().skip(1) {
                let value = primary_axis.normal.dot(*n);
                if value < best_value {
                    best_value = value;
                    best_index = i;
                }
            }

            let i1 = best_index;
            let i2 = if i1 + 1 < count_b { i1 + 1 } else { 0 };
            let feature = |ib: usize| ContactFeature {
                index_a: 0,
                index_b: ib as u8,
                type_a: FeatureType::Face,
                type_b: FeatureType::Vertex,
            };
            let clip = [
                ClipVertex {
                    v: temp_b.vertices[i1],
                    id: feature(i1),
                },
                ClipVertex {
                    v: temp_b.vertices[i2],
                    id: feature(i2),
                },
            ];
            (clip, 0, 1, v1, v2, primary_axis.normal, -edge1)
        } else {
            manifold.manifold_type = ManifoldType::FaceB;

            let feature = |ia: u8| ContactFeature {
                index_a: ia,
                index_b: primary_axis.index as u8,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            };
            let clip = [
                ClipVertex { v: v2, id: feature(1) },
                ClipVertex { v: v1, id: feature(0) },
            ];
            let i1 = primary_axis.index;
            let i2 = if i1 + 1 < count_b { i1 + 1 } else { 0 };
            let normal = temp_b.normals[i1];
            // CCW winding.
            (
                clip,
                i1,
                i2,
                temp_b.vertices[i1],
                temp_b.vertices[i2],
                normal,
                normal.perpendicular_cw(),
            )
        };
    let side_normal2 = -side_normal1;
    let side_offset1 = side_normal1.dot(ref_v1);
    let side_offset2 = side_normal2.dot(ref_v2);

    // Clip incident edge against reference face side planes.
    let clip_points1 = clip_segment_to_line(&clip_points, side_normal1, side_offset1, ref_i1);
    let Ok(clip_points1) = clip_points1.into_inner() else {
        return manifold;
    };
    let clip_points2 = clip_segment_to_line(&clip_points1, side_normal2, side_offset2, ref_i2);
    if clip_points2.len() < MAX_MANIFOLD_POINTS {
        return manifold;
    }

    if primary_axis.axis_type == AxisType::EdgeA {
        manifold.local_normal = ref_normal;
        manifold.local_point = ref_v1;
    } else {
        manifold.local_normal = polygon_b.normals()[ref_i1];
        manifold.local_point = polygon_b.vertices()[ref_i1];
    }

    for cp in clip_points2.iter() {
        let separation = ref_normal.dot(cp.v - ref_v1);
        if separation <= radius {
            let point = if primary_axis.axis_type == AxisType::EdgeA {
                ManifoldPoint {
                    local_point: xf.apply_inverse(cp.v),
                    id: cp.id,
                    ..Default::default()
                }
            } else {
                ManifoldPoint {
                    local_point: cp.v,
                    id: cp.id.swapped(),
                    ..Default::default()
                }
            };
            manifold.points.push(point);
        }
    }
    manifold
}

/// Dispatches on the shape pair. `shape_a` must be the shape whose type
/// ranks first (chain, edge, polygon, circle); unsupported pairs such as
/// edge against edge produce no contact.
pub fn collide_shapes(
    shape_a: &Shape,
    index_a: usize,
    xf_a: &Transform,
    shape_b: &Shape,
    xf_b: &Transform,
) -> Manifold {
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_and_circle(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Polygon(b)) => collide_edge_and_polygon(a, xf_a, b, xf_b),
        (Shape::Chain(a), Shape::Circle(b)) => collide_edge_and_circle(&a.child_edge(index_a), xf_a, b, xf_b),
        (Shape::Chain(a), Shape::Polygon(b)) => collide_edge_and_polygon(&a.child_edge(index_a), xf_a, b, xf_b),
        _ => Manifold::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::manifold::WorldManifold;
    use crate::shapes::Chain;
    use approx::assert_relative_eq;

    #[test]
    fn test_circles_touching_and_apart() {
        let a = Circle::new(1.0);
        let b = Circle::new(0.5);
        let xf_a = Transform::identity();
        let m = collide_circles(&a, &xf_a, &b, &Transform::new(Vec2::new(1.4, 0.0), 0.0));
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::Circles);

        let wm = WorldManifold::new(&m, &xf_a, a.radius, &Transform::new(Vec2::new(1.4, 0.0), 0.0), b.radius);
        assert_relative_eq!(wm.separations[0], -0.1, epsilon = 1e-12);

        let m = collide_circles(&a, &xf_a, &b, &Transform::new(Vec2::new(1.6, 0.0), 0.0));
        assert!(m.is_empty());
    }

    #[test]
    fn test_polygon_circle_face_and_vertex_regions() {
        let poly = Polygon::new_box(1.0, 1.0);
        let circle = Circle::new(0.5);
        let xf_a = Transform::identity();

        // Above the top face.
        let m = collide_polygon_and_circle(&poly, &xf_a, &circle, &Transform::new(Vec2::new(0.2, 1.4), 0.0));
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::FaceA);
        assert_relative_eq!(m.local_normal.y, 1.0, epsilon = 1e-12);

        // Near the corner: normal points from the vertex towards the circle.
        let m = collide_polygon_and_circle(&poly, &xf_a, &circle, &Transform::new(Vec2::new(1.3, 1.3), 0.0));
        assert_eq!(m.point_count(), 1);
        assert_relative_eq!(m.local_normal.x, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
        assert_eq!(m.local_point, Vec2::new(1.0, 1.0));

        // Too far from the corner.
        let m = collide_polygon_and_circle(&poly, &xf_a, &circle, &Transform::new(Vec2::new(1.5, 1.5), 0.0));
        assert!(m.is_empty());
    }

    #[test]
    fn test_polygons_box_on_box_two_points() {
        let ground = Polygon::new_box(5.0, 0.5);
        let block = Polygon::new_box(0.5, 0.5);
        let xf_a = Transform::identity();
        let xf_b = Transform::new(Vec2::new(0.0, 0.99), 0.0);
        let m = collide_polygons(&ground, &xf_a, &block, &xf_b);
        assert_eq!(m.point_count(), 2);
        assert_eq!(m.manifold_type, ManifoldType::FaceA);

        let wm = WorldManifold::new(&m, &xf_a, ground.radius, &xf_b, block.radius);
        assert_relative_eq!(wm.normal.y, 1.0, epsilon = 1e-9);
        for s in wm.separations {
            // Cores overlap by 0.01, skins add 0.02.
            assert_relative_eq!(s, -0.01 - 2.0 * ground.radius, epsilon = 1e-9);
        }
        assert_ne!(m.points[0].id.key(), m.points[1].id.key());
    }

    #[test]
    fn test_polygons_ids_stable_under_small_motion() {
        let ground = Polygon::new_box(5.0, 0.5);
        let block = Polygon::new_box(0.5, 0.5);
        let xf_a = Transform::identity();
        let m1 = collide_polygons(&ground, &xf_a, &block, &Transform::new(Vec2::new(0.0, 0.99), 0.01));
        let m2 = collide_polygons(&ground, &xf_a, &block, &Transform::new(Vec2::new(0.001, 0.985), 0.012));
        let keys1: Vec<u32> = m1.points.iter().map(|p| p.id.key()).collect();
        let keys2: Vec<u32> = m2.points.iter().map(|p| p.id.key()).collect();
        assert_eq!(keys1, keys2);
    }

    #[test]
    fn test_polygons_separated() {
        let a = Polygon::new_box(1.0, 1.0);
        let b = Polygon::new_box(1.0, 1.0);
        let m = collide_polygons(&a, &Transform::identity(), &b, &Transform::new(Vec2::new(2.5, 0.0), 0.3));
        assert!(m.is_empty());
    }

    #[test]
    fn test_polygons_reference_face_on_b_flips_ids() {
        // B's face is the clear reference: a tilted box resting its face on A's corner.
        let a = Polygon::new_box(0.5, 0.5);
        let b = Polygon::new_box(2.0, 0.5);
        let xf_a = Transform::new(Vec2::ZERO, std::f64::consts::FRAC_PI_4);
        let xf_b = Transform::new(Vec2::new(0.0, 0.5 * 2.0_f64.sqrt() + 0.49), 0.0);
        let m = collide_polygons(&a, &xf_a, &b, &xf_b);
        assert_eq!(m.manifold_type, ManifoldType::FaceB);
        assert!(!m.is_empty());
        for p in m.points.iter() {
            assert_eq!(p.id.type_b, FeatureType::Face);
        }
    }

    #[test]
    fn test_edge_circle_regions() {
        let edge = Edge::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let circle = Circle::new(0.5);
        let xf = Transform::identity();

        let m = collide_edge_and_circle(&edge, &xf, &circle, &Transform::new(Vec2::new(0.0, 0.4), 0.0));
        assert_eq!(m.manifold_type, ManifoldType::FaceA);
        assert_relative_eq!(m.local_normal.y, 1.0, epsilon = 1e-12);

        // Two-sided: below also collides, with the normal flipped.
        let m = collide_edge_and_circle(&edge, &xf, &circle, &Transform::new(Vec2::new(0.0, -0.4), 0.0));
        assert_relative_eq!(m.local_normal.y, -1.0, epsilon = 1e-12);

        // Beyond vertex B.
        let m = collide_edge_and_circle(&edge, &xf, &circle, &Transform::new(Vec2::new(1.3, 0.0), 0.0));
        assert_eq!(m.manifold_type, ManifoldType::Circles);
        assert_eq!(m.local_point, Vec2::new(1.0, 0.0));
        assert_eq!(m.points[0].id.index_a, 1);
    }

    #[test]
    fn test_one_sided_edge_ignores_back_side() {
        // Right of v1 -> v2 is up when running right to left.
        let edge = Edge::new_one_sided(
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(-2.0, 0.0),
        );
        let circle = Circle::new(0.5);
        let poly = Polygon::new_box(0.5, 0.5);
        let xf = Transform::identity();
        let above = Transform::new(Vec2::new(0.0, 0.4), 0.0);
        let below = Transform::new(Vec2::new(0.0, -0.4), 0.0);

        assert_eq!(collide_edge_and_circle(&edge, &xf, &circle, &above).point_count(), 1);
        assert!(collide_edge_and_circle(&edge, &xf, &circle, &below).is_empty());
        assert_eq!(collide_edge_and_polygon(&edge, &xf, &poly, &above).point_count(), 2);
        assert!(collide_edge_and_polygon(&edge, &xf, &poly, &below).is_empty());
    }

    #[test]
    fn test_edge_polygon_resting_box() {
        let edge = Edge::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0));
        let poly = Polygon::new_box(0.5, 0.5);
        let xf_a = Transform::identity();
        let xf_b = Transform::new(Vec2::new(0.0, 0.5), 0.0);
        let m = collide_edge_and_polygon(&edge, &xf_a, &poly, &xf_b);
        assert_eq!(m.point_count(), 2);

        let wm = WorldManifold::new(&m, &xf_a, edge.radius, &xf_b, poly.radius);
        assert_relative_eq!(wm.normal.y, 1.0, epsilon = 1e-9);
        for s in wm.separations {
            assert_relative_eq!(s, -2.0 * edge.radius, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_chain_dispatch_uses_child_edge() {
        let chain = Chain::new_loop(&[
            Vec2::new(-5.0, -1.0),
            Vec2::new(5.0, -1.0),
            Vec2::new(5.0, 1.0),
            Vec2::new(-5.0, 1.0),
        ]);
        let shape: Shape = chain.into();
        let circle: Shape = Circle::new(0.5).into();
        let xf = Transform::identity();
        // Outside the top edge (child 2 runs right to left along y = 1).
        let m = collide_shapes(&shape, 2, &xf, &circle, &Transform::new(Vec2::new(0.0, 1.4), 0.0));
        assert_eq!(m.point_count(), 1);
        // Inside the loop the one-sided edge does not collide.
        let m = collide_shapes(&shape, 2, &xf, &circle, &Transform::new(Vec2::new(0.0, 0.6), 0.0));
        assert!(m.is_empty());
    }

    #[test]
    fn test_unsupported_pairs_are_empty() {
        let e1: Shape = Edge::new(Vec2::ZERO, Vec2::new(1.0, 0.0)).into();
        let e2: Shape = Edge::new(Vec2::ZERO, Vec2::new(0.0, 1.0)).into();
        assert!(collide_shapes(&e1, 0, &Transform::identity(), &e2, &Transform::identity()).is_empty());
    }
}
