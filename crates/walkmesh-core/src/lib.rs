//! Walkmesh Core - Core types for the walk-mesh container
//!
//! This crate provides the record types passed between the extraction step,
//! the container encoder/decoder and the navigation runtime:
//! - Vertex (position + normal) and Triangle (three 32-bit indices)
//! - MeshRecord, one named mesh with mesh-local triangle indices
//! - RecordError for records that break the triangle/index preconditions

pub mod types;

pub use glam::{UVec3, Vec3};
pub use types::{MeshRecord, RecordError, Triangle, Vertex};
