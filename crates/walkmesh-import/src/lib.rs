//! Walkmesh Import - Extraction of walk-mesh records
//!
//! Turns glTF 2.0 scenes and JSON record lists into [`MeshRecord`]s ready
//! for the container encoder.

mod error;
mod gltf_loader;
mod json;

use std::path::Path;

pub use error::ImportError;
pub use gltf_loader::{load_gltf, ImportOptions};
pub use json::{load_json, parse_json, RawMesh};

use walkmesh_core::MeshRecord;

/// Load records from a `.gltf`, `.glb` or `.json` file, keeping only the
/// meshes whose name matches `options.name_filter`.
pub fn load_records(path: &Path, options: &ImportOptions) -> Result<Vec<MeshRecord>, ImportError> {
    if !path.exists() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "gltf" | "glb" => load_gltf(path, options),
        "json" => Ok(load_json(path)?
            .into_iter()
            .filter(|record| options.matches(&record.name))
            .collect()),
        _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    }
}
