//! Core types used throughout the walkmesh crates

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Errors for records that break the encoder's input preconditions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("polygon {face} has {corners} corners, expected a triangle")]
    NotATriangle { face: usize, corners: usize },

    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{what} count {count} does not fit in a 32-bit index")]
    TooLarge { what: &'static str, count: usize },
}

/// A walk-mesh vertex: position followed by normal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    /// Encoded size in bytes (6 × f32)
    pub const SIZE: usize = 24;

    pub const fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    /// Create a vertex from `[px, py, pz, nx, ny, nz]`
    pub fn from_array(v: [f32; 6]) -> Self {
        Self {
            position: Vec3::new(v[0], v[1], v[2]),
            normal: Vec3::new(v[3], v[4], v[5]),
        }
    }

    /// Convert to `[px, py, pz, nx, ny, nz]`
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
        ]
    }
}

/// Three vertex indices forming one triangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangle(pub [u32; 3]);

impl Triangle {
    /// Encoded size in bytes (3 × u32)
    pub const SIZE: usize = 12;

    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self([a, b, c])
    }

    pub fn indices(&self) -> [u32; 3] {
        self.0
    }

    /// Shift every index up by `offset`, or `None` on overflow
    pub fn offset(&self, offset: u32) -> Option<Self> {
        let [a, b, c] = self.0;
        Some(Self([
            a.checked_add(offset)?,
            b.checked_add(offset)?,
            c.checked_add(offset)?,
        ]))
    }

    /// Shift every index down by `base`, or `None` if any index is below it
    pub fn rebase(&self, base: u32) -> Option<Self> {
        let [a, b, c] = self.0;
        Some(Self([
            a.checked_sub(base)?,
            b.checked_sub(base)?,
            c.checked_sub(base)?,
        ]))
    }

    pub fn as_uvec3(&self) -> UVec3 {
        UVec3::from_array(self.0)
    }
}

impl From<[u32; 3]> for Triangle {
    fn from(indices: [u32; 3]) -> Self {
        Self(indices)
    }
}

/// One named mesh. Triangle indices are local to `vertices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl MeshRecord {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Self {
        Self {
            name: name.into(),
            vertices,
            triangles,
        }
    }

    /// Build a record from arbitrary polygons, requiring every face to be a
    /// triangle with in-range local indices.
    pub fn from_polygons<P>(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        polygons: impl IntoIterator<Item = P>,
    ) -> Result<Self, RecordError>
    where
        P: AsRef<[u32]>,
    {
        let mut triangles = Vec::new();
        for (face, polygon) in polygons.into_iter().enumerate() {
            let polygon = polygon.as_ref();
            match polygon {
                &[a, b, c] => triangles.push(Triangle::new(a, b, c)),
                _ => {
                    return Err(RecordError::NotATriangle {
                        face,
                        corners: polygon.len(),
                    })
                }
            }
        }

        let record = Self::new(name, vertices, triangles);
        record.validate()?;
        Ok(record)
    }

    /// Check that all counts fit in u32 and every index is local
    pub fn validate(&self) -> Result<(), RecordError> {
        let vertex_count = self.vertices.len();
        if u32::try_from(vertex_count).is_err() {
            return Err(RecordError::TooLarge {
                what: "vertex",
                count: vertex_count,
            });
        }
        if u32::try_from(self.triangles.len()).is_err() {
            return Err(RecordError::TooLarge {
                what: "triangle",
                count: self.triangles.len(),
            });
        }

        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.0.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(RecordError::VertexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Vertex positions in order
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| v.position)
    }
}
