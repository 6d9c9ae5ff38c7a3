use std::path::PathBuf;

use walkmesh_core::RecordError;

/// Errors that can occur while extracting walk meshes.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load glTF file '{0}': {1}")]
    GltfLoadFailed(PathBuf, String),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON records in '{0}': {1}")]
    Json(String, #[source] serde_json::Error),

    #[error("unsupported input format '{0}' (use .gltf, .glb or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("mesh '{mesh}' has a {mode} primitive, only triangle lists are supported")]
    UnsupportedPrimitive { mesh: String, mode: String },

    #[error("mesh '{mesh}' is missing the {attribute} attribute")]
    MissingAttribute {
        mesh: String,
        attribute: &'static str,
    },

    #[error("mesh '{name}' is malformed: {source}")]
    Record {
        name: String,
        #[source]
        source: RecordError,
    },
}
