//! Walkmesh Nav - Surface-constrained movement over walk meshes
//!
//! Keeps a character's position glued to a walk mesh: find the closest point
//! on the surface, then move it triangle by triangle across shared edges.

mod walk_mesh;

pub use walk_mesh::{WalkMesh, WalkMeshConfig, WalkPoint};

use walkmesh_core::RecordError;

/// Errors building a walk mesh
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    #[error("walk mesh '{0}' has no triangles")]
    Empty(String),

    #[error("walk mesh has {normals} normals for {vertices} vertices")]
    NormalCount { normals: usize, vertices: usize },

    #[error(transparent)]
    Record(#[from] RecordError),
}
