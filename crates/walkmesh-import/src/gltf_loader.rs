use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use walkmesh_core::{MeshRecord, RecordError, Vec3, Vertex};

use crate::error::ImportError;

/// Which meshes are extracted and how missing data is treated.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Only meshes whose node or mesh name contains this are kept; empty keeps all
    pub name_filter: String,
    /// Reject meshes without normals instead of zero-filling them
    pub require_normals: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            name_filter: "WalkMesh".to_string(),
            require_normals: true,
        }
    }
}

impl ImportOptions {
    pub fn matches(&self, name: &str) -> bool {
        self.name_filter.is_empty() || name.contains(&self.name_filter)
    }
}

/// Raw attribute data of one glTF triangle primitive
struct PrimitiveData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

/// Load a glTF 2.0 file (.gltf or .glb) and extract every walk mesh
/// referenced by a matching node. Each mesh is extracted once, in node order.
pub fn load_gltf(path: &Path, options: &ImportOptions) -> Result<Vec<MeshRecord>, ImportError> {
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| ImportError::GltfLoadFailed(path.to_path_buf(), e.to_string()))?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let name = mesh.name().unwrap_or("unnamed").to_string();
        let node_name = node.name().unwrap_or_default();
        if !(options.matches(node_name) || options.matches(&name)) {
            debug!("Skipping mesh '{}' (node '{}')", name, node_name);
            continue;
        }
        if !seen.insert(mesh.index()) {
            continue;
        }

        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(ImportError::UnsupportedPrimitive {
                    mesh: name,
                    mode: format!("{:?}", primitive.mode()),
                });
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .ok_or_else(|| ImportError::MissingAttribute {
                    mesh: name.clone(),
                    attribute: "POSITION",
                })?;

            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(iter) => iter.collect(),
                None if options.require_normals => {
                    return Err(ImportError::MissingAttribute {
                        mesh: name,
                        attribute: "NORMAL",
                    })
                }
                None => vec![[0.0; 3]; positions.len()],
            };

            let indices: Vec<u32> = match reader.read_indices() {
                Some(idx) => idx.into_u32().collect(),
                None => sequential_indices(&name, positions.len())?,
            };

            primitives.push(PrimitiveData {
                positions,
                normals,
                indices,
            });
        }

        let record = merge_primitives(&name, primitives)?;
        debug!(
            "Extracted walk mesh '{}': {} vertices, {} triangles",
            record.name,
            record.vertex_count(),
            record.triangle_count()
        );
        records.push(record);
    }

    debug!("glTF '{}': {} walk meshes", path.display(), records.len());
    Ok(records)
}

fn vertex_index(mesh: &str, count: usize) -> Result<u32, ImportError> {
    u32::try_from(count).map_err(|_| ImportError::Record {
        name: mesh.to_string(),
        source: RecordError::TooLarge {
            what: "vertex",
            count,
        },
    })
}

/// Indices `0..count` for a primitive without an index accessor
fn sequential_indices(mesh: &str, count: usize) -> Result<Vec<u32>, ImportError> {
    Ok((0..vertex_index(mesh, count)?).collect())
}

/// Concatenate primitives into one record, offsetting each primitive's
/// indices by the vertices that precede it.
fn merge_primitives(name: &str, primitives: Vec<PrimitiveData>) -> Result<MeshRecord, ImportError> {
    let mut vertices = Vec::new();
    let mut polygons: Vec<Vec<u32>> = Vec::new();

    for primitive in primitives {
        if primitive.normals.len() != primitive.positions.len() {
            return Err(ImportError::MissingAttribute {
                mesh: name.to_string(),
                attribute: "NORMAL",
            });
        }

        let base = vertex_index(name, vertices.len())?;
        vertices.extend(
            primitive
                .positions
                .iter()
                .zip(&primitive.normals)
                .map(|(&p, &n)| Vertex::new(Vec3::from_array(p), Vec3::from_array(n))),
        );
        polygons.extend(
            primitive
                .indices
                .chunks(3)
                .map(|face| face.iter().map(|i| i + base).collect()),
        );
    }

    MeshRecord::from_polygons(name, vertices, polygons).map_err(|source| ImportError::Record {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use walkmesh_core::Triangle;

    /// Non-indexed "Floor" shared by two walk-mesh nodes, a line mesh on
    /// "Deco" and a normal-less "Bare" mesh on "WalkMesh.Bare".
    const SCENE: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1, 2, 3] }],
        "nodes": [
            { "name": "WalkMesh", "mesh": 0 },
            { "name": "WalkMesh.001", "mesh": 0 },
            { "name": "Deco", "mesh": 1 },
            { "name": "WalkMesh.Bare", "mesh": 2 }
        ],
        "meshes": [
            { "name": "Floor", "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }] },
            { "name": "Lines", "primitives": [{ "attributes": { "POSITION": 0 }, "mode": 1 }] },
            { "name": "Bare", "primitives": [{ "attributes": { "POSITION": 0 } }] }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 0.0, 1.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36 }
        ],
        "buffers": [{
            "byteLength": 72,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAAAAAIA/AAAAAAAAgD8AAAAAAAAAAAAAgD8AAAAAAAAAAAAAgD8AAAAA"
        }]
    }"#;

    fn write_scene(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("level.gltf");
        fs::write(&path, SCENE).unwrap();
        path
    }

    fn triangle_primitive(y: f32) -> PrimitiveData {
        PrimitiveData {
            positions: vec![[0.0, y, 0.0], [1.0, y, 0.0], [0.0, y, 1.0]],
            normals: vec![[0.0, 1.0, 0.0]; 3],
            indices: vec![0, 2, 1],
        }
    }

    #[test]
    fn default_filter_matches_walk_meshes() {
        let options = ImportOptions::default();
        assert!(options.matches("WalkMesh"));
        assert!(options.matches("Level1.WalkMesh.001"));
        assert!(!options.matches("walkmesh"));
        assert!(ImportOptions {
            name_filter: String::new(),
            ..options
        }
        .matches("anything"));
    }

    #[test]
    fn primitives_are_merged_with_offsets() {
        let record =
            merge_primitives("WalkMesh", vec![triangle_primitive(0.0), triangle_primitive(1.0)]).unwrap();
        assert_eq!(record.vertex_count(), 6);
        assert_eq!(
            record.triangles,
            vec![Triangle::new(0, 2, 1), Triangle::new(3, 5, 4)]
        );
        assert_eq!(record.vertices[3].position.y, 1.0);
    }

    #[test]
    fn dangling_indices_are_rejected() {
        let mut primitive = triangle_primitive(0.0);
        primitive.indices.push(0);
        match merge_primitives("WalkMesh", vec![primitive]) {
            Err(ImportError::Record { name, source }) => {
                assert_eq!(name, "WalkMesh");
                assert_eq!(source, RecordError::NotATriangle { face: 1, corners: 1 });
            }
            other => panic!("expected Record error, got: {:?}", other),
        }
    }

    #[test]
    fn normal_count_mismatch_is_rejected() {
        let mut primitive = triangle_primitive(0.0);
        primitive.normals.pop();
        assert!(matches!(
            merge_primitives("WalkMesh", vec![primitive]),
            Err(ImportError::MissingAttribute { attribute: "NORMAL", .. })
        ));
    }

    #[test]
    fn shared_mesh_is_extracted_once() {
        let dir = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            name_filter: "WalkMesh.00".to_string(),
            ..ImportOptions::default()
        };
        let records = load_gltf(&write_scene(&dir), &options).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Floor");
        // No index accessor, so corners are taken in order
        assert_eq!(records[0].triangles, vec![Triangle::new(0, 1, 2)]);
        assert_eq!(records[0].vertices[1].position, Vec3::X);
        assert_eq!(records[0].vertices[2].normal, Vec3::Y);
    }

    #[test]
    fn missing_normals_are_zero_filled_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            require_normals: false,
            ..ImportOptions::default()
        };
        let records = load_gltf(&write_scene(&dir), &options).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Floor", "Bare"]);
        assert!(records[1].vertices.iter().all(|v| v.normal == Vec3::ZERO));
        assert_eq!(records[1].triangles, vec![Triangle::new(0, 1, 2)]);
    }

    #[test]
    fn missing_normals_are_rejected_by_default() {
        let dir = tempfile::tempdir().unwrap();
        match load_gltf(&write_scene(&dir), &ImportOptions::default()) {
            Err(ImportError::MissingAttribute { mesh, attribute }) => {
                assert_eq!(mesh, "Bare");
                assert_eq!(attribute, "NORMAL");
            }
            other => panic!("expected MissingAttribute, got: {:?}", other),
        }
    }

    #[test]
    fn line_primitives_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            name_filter: String::new(),
            ..ImportOptions::default()
        };
        match load_gltf(&write_scene(&dir), &options) {
            Err(ImportError::UnsupportedPrimitive { mesh, mode }) => {
                assert_eq!(mesh, "Lines");
                assert_eq!(mode, "Lines");
            }
            other => panic!("expected UnsupportedPrimitive, got: {:?}", other),
        }
    }

    #[test]
    fn sequential_indices_fit_u32() {
        assert_eq!(sequential_indices("WalkMesh", 3).unwrap(), vec![0, 1, 2]);
        match sequential_indices("WalkMesh", u32::MAX as usize + 1) {
            Err(ImportError::Record { name, source }) => {
                assert_eq!(name, "WalkMesh");
                assert!(matches!(source, RecordError::TooLarge { what: "vertex", .. }));
            }
            other => panic!("expected TooLarge, got: {:?}", other),
        }
    }

    #[test]
    fn missing_file_fails_to_load() {
        let result = load_gltf(Path::new("/nonexistent/level.glb"), &ImportOptions::default());
        assert!(matches!(result, Err(ImportError::GltfLoadFailed(_, _))));
    }
}
