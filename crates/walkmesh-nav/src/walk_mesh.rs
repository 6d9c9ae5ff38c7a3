//! Walk mesh with barycentric walk points

use std::collections::HashMap;

use glam::{UVec3, Vec3};
use tracing::{debug, warn};
use walkmesh_core::{MeshRecord, Triangle, Vertex};

use crate::NavError;

/// Walk configuration
#[derive(Debug, Clone)]
pub struct WalkMeshConfig {
    /// Maximum triangles crossed by a single `walk` call (default: 16)
    pub max_crossings: usize,
    /// Steps shorter than this are ignored (default: 1e-6)
    pub epsilon: f32,
}

impl Default for WalkMeshConfig {
    fn default() -> Self {
        Self {
            max_crossings: 16,
            epsilon: 1e-6,
        }
    }
}

/// A location on the mesh: a triangle and barycentric weights within it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkPoint {
    pub triangle: UVec3,
    pub weights: Vec3,
}

/// Triangle surface that walk points move across
#[derive(Debug, Clone)]
pub struct WalkMesh {
    /// Configuration
    pub config: WalkMeshConfig,
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<UVec3>,
    /// Directed edge (a, b) -> third vertex of the triangle that owns it
    next_vertex: HashMap<(u32, u32), u32>,
}

impl WalkMesh {
    /// Build from positions, per-vertex normals and triangles
    pub fn new(vertices: Vec<Vec3>, normals: Vec<Vec3>, triangles: Vec<UVec3>) -> Result<Self, NavError> {
        if normals.len() != vertices.len() {
            return Err(NavError::NormalCount {
                normals: normals.len(),
                vertices: vertices.len(),
            });
        }
        let record = MeshRecord::new(
            String::new(),
            vertices
                .iter()
                .zip(&normals)
                .map(|(&p, &n)| Vertex::new(p, n))
                .collect(),
            triangles.iter().map(|t| Triangle(t.to_array())).collect(),
        );
        Self::from_record(&record)
    }

    /// Build from a decoded record (local triangle indices)
    pub fn from_record(record: &MeshRecord) -> Result<Self, NavError> {
        Self::from_record_with_config(record, WalkMeshConfig::default())
    }

    pub fn from_record_with_config(record: &MeshRecord, config: WalkMeshConfig) -> Result<Self, NavError> {
        record.validate()?;
        if record.triangles.is_empty() {
            return Err(NavError::Empty(record.name.clone()));
        }

        let triangles: Vec<UVec3> = record.triangles.iter().map(Triangle::as_uvec3).collect();
        let mut next_vertex = HashMap::with_capacity(triangles.len() * 3);
        for t in &triangles {
            for (a, b, c) in [(t.x, t.y, t.z), (t.y, t.z, t.x), (t.z, t.x, t.y)] {
                if next_vertex.insert((a, b), c).is_some() {
                    warn!("edge ({}, {}) of walk mesh '{}' is shared by two same-facing triangles", a, b, record.name);
                }
            }
        }
        debug!(
            "Built walk mesh '{}': {} triangles, {} directed edges",
            record.name,
            triangles.len(),
            next_vertex.len()
        );

        Ok(Self {
            config,
            vertices: record.positions().collect(),
            normals: record.vertices.iter().map(|v| v.normal).collect(),
            triangles,
            next_vertex,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[UVec3] {
        &self.triangles
    }

    /// Third vertex of the triangle containing the directed edge `a -> b`
    pub fn next_vertex(&self, a: u32, b: u32) -> Option<u32> {
        self.next_vertex.get(&(a, b)).copied()
    }

    fn corners(&self, triangle: UVec3) -> [Vec3; 3] {
        [
            self.vertices[triangle.x as usize],
            self.vertices[triangle.y as usize],
            self.vertices[triangle.z as usize],
        ]
    }

    /// Closest point on the surface to `world_point`
    pub fn start(&self, world_point: Vec3) -> WalkPoint {
        let mut closest = WalkPoint {
            triangle: self.triangles[0],
            weights: Vec3::new(1.0, 0.0, 0.0),
        };
        let mut closest_distance = f32::MAX;

        for &triangle in &self.triangles {
            let [a, b, c] = self.corners(triangle);
            let weights = closest_weights(world_point, a, b, c);
            let point = a * weights.x + b * weights.y + c * weights.z;
            let distance = point.distance_squared(world_point);
            if distance < closest_distance {
                closest_distance = distance;
                closest = WalkPoint { triangle, weights };
            }
        }
        closest
    }

    /// World-space position of a walk point
    pub fn world_point(&self, wp: &WalkPoint) -> Vec3 {
        let [a, b, c] = self.corners(wp.triangle);
        a * wp.weights.x + b * wp.weights.y + c * wp.weights.z
    }

    /// Interpolated vertex normal at a walk point
    pub fn world_normal(&self, wp: &WalkPoint) -> Vec3 {
        let t = wp.triangle;
        let n = self.normals[t.x as usize] * wp.weights.x
            + self.normals[t.y as usize] * wp.weights.y
            + self.normals[t.z as usize] * wp.weights.z;
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            let [a, b, c] = self.corners(t);
            (b - a).cross(c - a).normalize_or_zero()
        }
    }

    /// Barycentric weights of `world_point` projected onto the triangle's plane
    pub fn to_barycentric(&self, world_point: Vec3, triangle: UVec3) -> Vec3 {
        let [a, b, c] = self.corners(triangle);
        let u = b - a;
        let v = c - a;
        let w = world_point - a;
        let n = u.cross(v);
        let nn = n.dot(n);
        if nn <= 0.0 {
            return Vec3::new(1.0, 0.0, 0.0);
        }

        let gamma = n.dot(u.cross(w)) / nn;
        let beta = n.dot(w.cross(v)) / nn;
        Vec3::new(1.0 - gamma - beta, beta, gamma)
    }

    /// Move `wp` by `step`, crossing into neighbouring triangles. At an edge
    /// with no neighbour the remaining step slides along the edge.
    pub fn walk(&self, wp: &mut WalkPoint, step: Vec3) {
        let mut remaining = step;

        for _ in 0..self.config.max_crossings {
            if remaining.length() <= self.config.epsilon {
                return;
            }

            let target = self.to_barycentric(self.world_point(wp) + remaining, wp.triangle);
            let delta = target - wp.weights;

            // Earliest weight to reach zero along the step
            let mut t = 1.0;
            let mut exit = None;
            for k in 0..3 {
                if delta[k] < 0.0 {
                    let tk = (-wp.weights[k] / delta[k]).max(0.0);
                    if tk < t {
                        t = tk;
                        exit = Some(k);
                    }
                }
            }

            let Some(k) = exit else {
                wp.weights = target;
                return;
            };

            let mut weights = wp.weights + delta * t;
            weights[k] = 0.0;
            weights = renormalize(weights).unwrap_or(wp.weights);
            remaining *= 1.0 - t;

            // Edge opposite corner k, in winding order
            let (i0, i1) = ((k + 1) % 3, (k + 2) % 3);
            let (e0, e1) = (wp.triangle[i0], wp.triangle[i1]);

            match self.next_vertex(e1, e0) {
                Some(x) => {
                    wp.triangle = UVec3::new(e1, e0, x);
                    wp.weights = Vec3::new(weights[i1], weights[i0], 0.0);
                }
                None => {
                    wp.weights = weights;
                    self.slide(wp, k, remaining);
                    return;
                }
            }
        }
    }

    /// Slide along the boundary edge opposite corner `k`
    fn slide(&self, wp: &mut WalkPoint, k: usize, remaining: Vec3) {
        let [p0, p1] = [
            self.vertices[wp.triangle[(k + 1) % 3] as usize],
            self.vertices[wp.triangle[(k + 2) % 3] as usize],
        ];
        let dir = (p1 - p0).normalize_or_zero();
        let slide = dir * remaining.dot(dir);
        if slide.length() <= self.config.epsilon {
            return;
        }

        let mut weights = self.to_barycentric(self.world_point(wp) + slide, wp.triangle);
        weights[k] = 0.0;
        if let Some(w) = renormalize(weights.max(Vec3::ZERO)) {
            wp.weights = w;
        }
    }
}

fn renormalize(weights: Vec3) -> Option<Vec3> {
    let sum = weights.x + weights.y + weights.z;
    (sum > 0.0).then(|| weights / sum)
}

/// Barycentric weights of the point of triangle `abc` closest to `p`
fn closest_weights(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Vec3::new(1.0, 0.0, 0.0);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Vec3::new(0.0, 1.0, 0.0);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Vec3::new(1.0 - v, v, 0.0);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Vec3::new(0.0, 0.0, 1.0);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Vec3::new(1.0 - w, 0.0, w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Vec3::new(0.0, 1.0 - w, w);
    }

    let sum = va + vb + vc;
    if sum <= 0.0 {
        // Degenerate triangle
        return Vec3::new(1.0, 0.0, 0.0);
    }
    let v = vb / sum;
    let w = vc / sum;
    Vec3::new(1.0 - v - w, v, w)
}
