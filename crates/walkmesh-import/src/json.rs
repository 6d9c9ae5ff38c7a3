use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkmesh_core::{MeshRecord, Vertex};

use crate::error::ImportError;

/// One mesh as written by an external extraction script.
///
/// ```json
/// { "name": "WalkMesh",
///   "vertices": [{ "position": [0, 0, 0], "normal": [0, 1, 0] }, ...],
///   "polygons": [[0, 1, 2], ...] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Faces as local vertex indices; every face must be a triangle
    pub polygons: Vec<Vec<u32>>,
}

impl TryFrom<RawMesh> for MeshRecord {
    type Error = ImportError;

    fn try_from(raw: RawMesh) -> Result<Self, Self::Error> {
        let name = raw.name;
        MeshRecord::from_polygons(name.clone(), raw.vertices, raw.polygons)
            .map_err(|source| ImportError::Record { name, source })
    }
}

/// Parse a JSON array of meshes
pub fn parse_json(json: &str) -> Result<Vec<MeshRecord>, ImportError> {
    parse_json_labeled(json, "<memory>")
}

fn parse_json_labeled(json: &str, source: &str) -> Result<Vec<MeshRecord>, ImportError> {
    let raw: Vec<RawMesh> =
        serde_json::from_str(json).map_err(|e| ImportError::Json(source.to_string(), e))?;
    raw.into_iter().map(MeshRecord::try_from).collect()
}

/// Load a JSON record list from disk
pub fn load_json(path: &Path) -> Result<Vec<MeshRecord>, ImportError> {
    let content = fs::read_to_string(path).map_err(|e| ImportError::Io(path.to_path_buf(), e))?;
    let records = parse_json_labeled(&content, &path.display().to_string())?;
    debug!("JSON '{}': {} meshes", path.display(), records.len());
    Ok(records)
}
