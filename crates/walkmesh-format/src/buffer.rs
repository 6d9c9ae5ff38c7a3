use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};
use walkmesh_core::MeshRecord;

use crate::decoder::Container;
use crate::error::FormatError;

/// File extension of walk-mesh containers
pub const WALKMESH_EXT: &str = "pnt";

/// All walk meshes of one container, keyed by name.
///
/// When two meshes share a name the first one in the file is kept.
#[derive(Debug, Clone, Default)]
pub struct WalkMeshBuffer {
    meshes: HashMap<String, MeshRecord>,
    order: Vec<String>,
}

impl WalkMeshBuffer {
    /// Decode a container held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::from_bytes_labeled(bytes, "<memory>")
    }

    /// Load a `.pnt` file.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let is_pnt = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == WALKMESH_EXT);
        if !is_pnt {
            return Err(FormatError::UnsupportedExtension(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|e| FormatError::File(path.to_path_buf(), e))?;
        let buffer = Self::from_bytes_labeled(&bytes, &path.display().to_string())?;
        info!(
            "Loaded {} walk meshes from {}",
            buffer.len(),
            path.display()
        );
        Ok(buffer)
    }

    fn from_bytes_labeled(bytes: &[u8], source: &str) -> Result<Self, FormatError> {
        let container = Container::parse(bytes)?;
        let mut buffer = Self::default();

        for record in container.records()? {
            if buffer.meshes.contains_key(&record.name) {
                warn!(
                    "mesh name '{}' in '{}' collides with an existing mesh",
                    record.name, source
                );
                continue;
            }
            buffer.order.push(record.name.clone());
            buffer.meshes.insert(record.name.clone(), record);
        }

        if container.trailing_len() > 0 {
            warn!(
                "{} bytes of trailing data in mesh file '{}'",
                container.trailing_len(),
                source
            );
        }
        Ok(buffer)
    }

    /// Get a mesh by name, failing with `NotFound`.
    pub fn lookup(&self, name: &str) -> Result<&MeshRecord, FormatError> {
        self.meshes
            .get(name)
            .ok_or_else(|| FormatError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&MeshRecord> {
        self.meshes.get(name)
    }

    /// Distinct mesh names in file order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Meshes in file order
    pub fn iter(&self) -> impl Iterator<Item = &MeshRecord> {
        self.order.iter().filter_map(|name| self.meshes.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
