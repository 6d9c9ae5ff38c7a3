//! Walkmesh Format - the chunked walk-mesh container
//!
//! Packs any number of named triangle meshes into one file made of four
//! chunks, always in this order:
//!
//! ```text
//! tag "vert"  u32 length  {f32 px,py,pz, f32 nx,ny,nz} * vertex_count
//! tag "tris"  u32 length  {u32 i0,i1,i2} * triangle_count   (global indices)
//! tag "str0"  u32 length  concatenated UTF-8 mesh names
//! tag "idx0"  u32 length  {u32 name_begin,name_end,
//!                          vertex_begin,tri_begin,
//!                          vertex_end,tri_end} * mesh_count
//! ```
//!
//! All integers and floats are little-endian. There is no version field.

mod buffer;
mod chunk;
mod decoder;
mod encoder;
mod error;
mod index;

pub use buffer::{WalkMeshBuffer, WALKMESH_EXT};
pub use chunk::{ChunkHeader, ChunkTag};
pub use decoder::{decode, decode_from_reader, lookup, Container, TriangleIndexing};
pub use encoder::{encode, encode_to_writer, Encoder};
pub use error::FormatError;
pub use index::IndexEntry;

pub use walkmesh_core::{MeshRecord, RecordError, Triangle, Vertex};
