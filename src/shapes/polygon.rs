use arrayvec::ArrayVec;
use tracing::warn;

use crate::collision::{RayCastInput, RayCastOutput, AABB};
use crate::common::settings::{LINEAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS};
use crate::math::{Transform, Vec2};
use crate::shapes::MassData;

pub type VertexBuffer = ArrayVec<Vec2, MAX_POLYGON_VERTICES>;

/// A convex polygon. Vertices are stored counter-clockwise and the interior
/// lies to the left of every edge. Edge `i` runs from `vertices[i]` to
/// `vertices[(i + 1) % n]` and has outward normal `normals[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(crate) vertices: VertexBuffer,
    pub(crate) normals: VertexBuffer,
    pub(crate) centroid: Vec2,
    pub radius: f64,
}

impl Polygon {
    /// Builds the convex hull of `points`.
    ///
    /// Only the first [`MAX_POLYGON_VERTICES`] points are considered. Points
    /// closer than half the linear slop are welded. Degenerate input (fewer than
    /// three distinct points, or all points collinear) yields a 2x2 box.
    /// The hull may reorder the input points.
    pub fn new(points: &[Vec2]) -> Self {
        let mut polygon = Self::new_box(1.0, 1.0);
        polygon.set(points);
        polygon
    }

    /// Axis-aligned box with the given half-widths, centered on the origin.
    pub fn new_box(hx: f64, hy: f64) -> Self {
        let mut polygon = Polygon {
            vertices: ArrayVec::new(),
            normals: ArrayVec::new(),
            centroid: Vec2::ZERO,
            radius: POLYGON_RADIUS,
        };
        polygon.set_as_box(hx, hy);
        polygon
    }

    /// Box with the given half-widths, centered at `center` and rotated by `angle`.
    pub fn new_oriented_box(hx: f64, hy: f64, center: Vec2, angle: f64) -> Self {
        let mut polygon = Self::new_box(hx, hy);
        polygon.set_as_oriented_box(hx, hy, center, angle);
        polygon
    }

    pub fn set_as_box(&mut self, hx: f64, hy: f64) {
        self.vertices.clear();
        self.vertices.extend([
            Vec2::new(-hx, -hy),
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
        ]);
        self.normals.clear();
        self.normals.extend([
            Vec2::new(0.0, -1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 0.0),
        ]);
        self.centroid = Vec2::ZERO;
    }

    pub fn set_as_oriented_box(&mut self, hx: f64, hy: f64, center: Vec2, angle: f64) {
        self.set_as_box(hx, hy);
        let xf = Transform::new(center, angle);
        for v in self.vertices.iter_mut() {
            *v = xf.apply(*v);
        }
        for n in self.normals.iter_mut() {
            *n = xf.rotation.apply(*n);
        }
        self.centroid = center;
    }

    /// Replaces the geometry with the convex hull of `points`. See [`Polygon::new`].
    pub fn set(&mut self, points: &[Vec2]) {
        if points.len() < 3 {
            warn!(count = points.len(), "polygon needs at least 3 points, using unit box");
            self.set_as_box(1.0, 1.0);
            return;
        }
        if points.len() > MAX_POLYGON_VERTICES {
            warn!(
                count = points.len(),
                max = MAX_POLYGON_VERTICES,
                "polygon input truncated"
            );
        }

        // Weld close points.
        let weld_sq = (0.5 * LINEAR_SLOP) * (0.5 * LINEAR_SLOP);
        let mut ps = VertexBuffer::new();
        for &v in points.iter().take(MAX_POLYGON_VERTICES) {
            if ps.iter().all(|p| v.distance_squared(*p) >= weld_sq) {
                ps.push(v);
            }
        }

        let n = ps.len();
        if n < 3 {
            warn!("polygon is degenerate after welding, using unit box");
            self.set_as_box(1.0, 1.0);
            return;
        }

        // Gift wrapping: start at the right most point, lowest y on ties.
        let mut i0 = 0;
        let mut x0 = ps[0].x;
        for (i, p) in ps.iter().enumerate().skip(1) {
            if p.x > x0 || (p.x == x0 && p.y < ps[i0].y) {
                i0 = i;
                x0 = p.x;
            }
        }

        let mut hull: ArrayVec<usize, MAX_POLYGON_VERTICES> = ArrayVec::new();
        let mut ih = i0;
        loop {
            if hull.try_push(ih).is_err() {
                warn!("convex hull did not close, using unit box");
                self.set_as_box(1.0, 1.0);
                return;
            }

            let mut ie = 0;
            for j in 1..n {
                if ie == ih {
                    ie = j;
                    continue;
                }
                let r = ps[ie] - ps[ih];
                let v = ps[j] - ps[ih];
                let c = r.cross(v);
                if c < 0.0 {
                    ie = j;
                }
                // Collinear: keep the farther point.
                if c == 0.0 && v.magnitude_squared() > r.magnitude_squared() {
                    ie = j;
                }
            }

            ih = ie;
            if ie == i0 {
                break;
            }
        }

        if hull.len() < 3 {
            warn!("polygon points are collinear, using unit box");
            self.set_as_box(1.0, 1.0);
            return;
        }

        self.vertices = hull.iter().map(|&i| ps[i]).collect();
        let m = self.vertices.len();
        self.normals = (0..m)
            .map(|i| {
                let edge = self.vertices[(i + 1) % m] - self.vertices[i];
                edge.perpendicular_cw().normalize()
            })
            .collect();
        self.centroid = compute_centroid(&self.vertices);
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Area centroid in local coordinates.
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    /// Polygon area from the shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice_area: f64 = (0..n)
            .map(|i| self.vertices[i].cross(self.vertices[(i + 1) % n]))
            .sum();
        0.5 * twice_area
    }

    /// Checks that the vertices form a strictly convex counter-clockwise loop.
    pub fn validate(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        for i1 in 0..n {
            let i2 = (i1 + 1) % n;
            let p = self.vertices[i1];
            let e = self.vertices[i2] - p;
            if e.magnitude_squared() < f64::EPSILON * f64::EPSILON {
                return false;
            }
            for (j, v) in self.vertices.iter().enumerate() {
                if j == i1 || j == i2 {
                    continue;
                }
                if e.cross(*v - p) < 0.0 {
                    return false;
                }
            }
        }
        true
    }

    pub fn test_point(&self, xf: &Transform, p: Vec2) -> bool {
        let p_local = xf.apply_inverse(p);
        self.vertices
            .iter()
            .zip(self.normals.iter())
            .all(|(v, n)| n.dot(p_local - *v) <= 0.0)
    }

    /// Clips the ray against each edge half-plane, narrowing `[lower, upper]`.
    /// The edge that last raised `lower` supplies the normal.
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        // Put the ray into the polygon's frame of reference.
        let p1 = xf.rotation.apply_inverse(input.p1 - xf.position);
        let p2 = xf.rotation.apply_inverse(input.p2 - xf.position);
        let d = p2 - p1;

        let mut lower = 0.0;
        let mut upper = input.max_fraction;
        let mut index = None;

        for (i, (v, n)) in self.vertices.iter().zip(self.normals.iter()).enumerate() {
            // p = p1 + a * d
            // dot(normal, p - v) = 0
            // dot(normal, p1 - v) + a * dot(normal, d) = 0
            let numerator = n.dot(*v - p1);
            let denominator = n.dot(d);

            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else if denominator < 0.0 && numerator < lower * denominator {
                // The segment enters this half-space.
                lower = numerator / denominator;
                index = Some(i);
            } else if denominator > 0.0 && numerator < upper * denominator {
                // The segment exits this half-space.
                upper = numerator / denominator;
            }

            if upper < lower {
                return None;
            }
        }

        index.map(|i| RayCastOutput {
            normal: xf.rotation.apply(self.normals[i]),
            fraction: lower,
        })
    }

    pub fn compute_aabb(&self, xf: &Transform) -> AABB {
        let mut min = xf.apply(self.vertices[0]);
        let mut max = min;
        for v in self.vertices.iter().skip(1) {
            let w = xf.apply(*v);
            min = min.min(w);
            max = max.max(w);
        }
        AABB { min, max }.expanded(self.radius)
    }

    /// Mass, centroid and inertia about the local origin.
    ///
    /// Triangles are fanned from the vertex average, which keeps rounding
    /// error low; the inertia is then shifted to the origin. Zero-area
    /// polygons have zero mass.
    pub fn compute_mass(&self, density: f64) -> MassData {
        let n = self.vertices.len();
        let s = self.vertices.iter().fold(Vec2::ZERO, |acc, v| acc + *v) / n as f64;

        const INV3: f64 = 1.0 / 3.0;
        let mut center = Vec2::ZERO;
        let mut area = 0.0;
        let mut inertia = 0.0;

        for i in 0..n {
            let e1 = self.vertices[i] - s;
            let e2 = self.vertices[(i + 1) % n] - s;
            let d = e1.cross(e2);

            let triangle_area = 0.5 * d;
            area += triangle_area;
            center += (e1 + e2) * (triangle_area * INV3);

            let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 * INV3 * d) * (intx2 + inty2);
        }

        if area <= f64::EPSILON {
            return MassData {
                mass: 0.0,
                center: s,
                inertia: 0.0,
            };
        }

        let mass = density * area;
        center = center / area;
        let world_center = center + s;
        // Inertia about s, shifted to the centroid then to the origin.
        let inertia = density * inertia
            + mass * (world_center.magnitude_squared() - center.magnitude_squared());

        MassData {
            mass,
            center: world_center,
            inertia,
        }
    }

    /// Signed distance from the polygon core to `p` and the matching world normal.
    ///
    /// Outside, the most violated face is reported unless a vertex lies closer.
    /// Inside, the nearest face gives a non-positive distance.
    pub fn compute_distance(&self, xf: &Transform, p: Vec2) -> (f64, Vec2) {
        let p_local = xf.apply_inverse(p);
        let mut max_distance = f64::MIN;
        let mut normal_for_max = p_local;

        for (v, n) in self.vertices.iter().zip(self.normals.iter()) {
            let dot = n.dot(p_local - *v);
            if dot > max_distance {
                max_distance = dot;
                normal_for_max = *n;
            }
        }

        if max_distance > 0.0 {
            let mut min_distance = normal_for_max;
            let mut min_distance2 = max_distance * max_distance;
            for v in self.vertices.iter() {
                let distance = p_local - *v;
                let distance2 = distance.magnitude_squared();
                if min_distance2 > distance2 {
                    min_distance = distance;
                    min_distance2 = distance2;
                }
            }
            (min_distance2.sqrt(), xf.rotation.apply(min_distance).normalize())
        } else {
            (max_distance, xf.rotation.apply(normal_for_max))
        }
    }

    /// Area and world centroid of the part below the plane `dot(normal, x) = offset`.
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f64, xf: &Transform) -> (f64, Vec2) {
        // Plane in shape coordinates.
        let normal_l = xf.rotation.apply_inverse(normal);
        let offset_l = offset - normal.dot(xf.position);

        let n = self.vertices.len();
        let depths: ArrayVec<f64, MAX_POLYGON_VERTICES> = self
            .vertices
            .iter()
            .map(|v| normal_l.dot(*v) - offset_l)
            .collect();

        let mut dive_count = 0;
        let mut into_index = None;
        let mut outo_index = None;
        let mut last_submerged = false;

        for (i, depth) in depths.iter().enumerate() {
            let is_submerged = *depth < -f64::EPSILON;
            if i > 0 {
                if is_submerged && !last_submerged {
                    into_index = Some(i - 1);
                    dive_count += 1;
                } else if !is_submerged && last_submerged {
                    outo_index = Some(i - 1);
                    dive_count += 1;
                }
            }
            last_submerged = is_submerged;
        }

        if dive_count == 0 {
            if last_submerged {
                let md = self.compute_mass(1.0);
                return (md.mass, xf.apply(md.center));
            }
            return (0.0, xf.apply(self.centroid));
        }

        // A single crossing wraps around the last vertex.
        let into_index = into_index.unwrap_or(n - 1);
        let outo_index = outo_index.unwrap_or(n - 1);

        let into_index2 = (into_index + 1) % n;
        let outo_index2 = (outo_index + 1) % n;
        let into_lambda = -depths[into_index] / (depths[into_index2] - depths[into_index]);
        let outo_lambda = -depths[outo_index] / (depths[outo_index2] - depths[outo_index]);

        let into_vec = self.vertices[into_index].lerp(self.vertices[into_index2], into_lambda);
        let outo_vec = self.vertices[outo_index].lerp(self.vertices[outo_index2], outo_lambda);

        let mut area = 0.0;
        let mut center = Vec2::ZERO;
        let mut p2 = self.vertices[into_index2];

        let mut i = into_index2;
        while i != outo_index2 {
            i = (i + 1) % n;
            let p3 = if i == outo_index2 {
                outo_vec
            } else {
                self.vertices[i]
            };

            let triangle_area = 0.5 * (p2 - into_vec).cross(p3 - into_vec);
            area += triangle_area;
            center += (into_vec + p2 + p3) * (triangle_area / 3.0);
            p2 = p3;
        }

        if area <= f64::EPSILON {
            return (0.0, xf.apply(into_vec));
        }
        (area, xf.apply(center / area))
    }
}

/// Area centroid of a counter-clockwise vertex loop.
fn compute_centroid(vs: &[Vec2]) -> Vec2 {
    let n = vs.len();
    let mut c = Vec2::ZERO;
    let mut area = 0.0;
    // Fan from the first vertex.
    let p_ref = vs[0];
    for i in 0..n {
        let p2 = vs[i];
        let p3 = vs[(i + 1) % n];
        let triangle_area = 0.5 * (p2 - p_ref).cross(p3 - p_ref);
        area += triangle_area;
        c += (p_ref + p2 + p3) * (triangle_area / 3.0);
    }
    if area <= f64::EPSILON {
        return vs.iter().fold(Vec2::ZERO, |acc, v| acc + *v) / n as f64;
    }
    c / area
}
