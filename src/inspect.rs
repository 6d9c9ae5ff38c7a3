//! Inspect existing `.pnt` containers

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};
use walkmesh_format::{encode, ChunkTag, Container, TriangleIndexing};
use walkmesh_nav::{NavError, WalkMesh};

/// Arguments for printing a container's layout
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Path to the container (.pnt)
    pub file: PathBuf,
}

/// Arguments for dumping meshes as JSON
#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Path to the container (.pnt)
    pub file: PathBuf,

    /// Only dump the mesh with this name
    #[arg(long)]
    pub name: Option<String>,

    /// Keep triangle indices global to the container
    #[arg(long)]
    pub global: bool,
}

/// Arguments for verifying a container
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the container (.pnt)
    pub file: PathBuf,
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read mesh file: {}", path.display()))
}

/// Execute the info command
pub fn info(args: InfoArgs) -> Result<()> {
    let bytes = read(&args.file)?;
    let container = Container::parse(&bytes)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;
    print!("{}", describe(&container, &args.file, bytes.len()));
    Ok(())
}

fn describe(container: &Container<'_>, path: &Path, file_size: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Walk-mesh container: {}\n", path.display()));
    out.push_str(&format!("  File size: {} bytes\n\n", file_size));

    out.push_str("CHUNKS\n");
    for tag in ChunkTag::ORDER {
        out.push_str(&format!("  {}  {:>10} bytes\n", tag, container.payload_len(tag)));
    }
    if container.trailing_len() > 0 {
        out.push_str(&format!("  trailing {:>7} bytes (ignored)\n", container.trailing_len()));
    }

    out.push_str(&format!(
        "\nMESHES ({}; {} vertices, {} triangles)\n",
        container.len(),
        container.vertex_count(),
        container.triangle_count()
    ));
    for (entry, name) in container.entries().iter().zip(container.names()) {
        out.push_str(&format!(
            "  {:<24} vertices {}..{}  triangles {}..{}\n",
            name, entry.vertex_begin, entry.vertex_end, entry.tri_begin, entry.tri_end
        ));
    }
    out
}

/// Execute the dump command
pub fn dump(args: DumpArgs) -> Result<()> {
    let bytes = read(&args.file)?;
    let container = Container::parse(&bytes)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    let indexing = if args.global {
        TriangleIndexing::Global
    } else {
        TriangleIndexing::Local
    };
    println!("{}", to_json(&container, args.name.as_deref(), indexing)?);
    Ok(())
}

fn to_json(container: &Container<'_>, name: Option<&str>, indexing: TriangleIndexing) -> Result<String> {
    let records = match name {
        Some(name) => vec![container.lookup_with(name, indexing)?],
        None => container.records_with(indexing)?,
    };
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Execute the check command
pub fn check(args: CheckArgs) -> Result<()> {
    let bytes = read(&args.file)?;
    let summary = verify(&bytes).with_context(|| format!("{} failed verification", args.file.display()))?;
    println!("{}: {}", args.file.display(), summary);
    Ok(())
}

/// Decode every mesh, re-encode them and compare byte for byte, then build
/// a walkable surface from each mesh.
fn verify(bytes: &[u8]) -> Result<String> {
    let container = Container::parse(bytes)?;
    let records = container.records()?;

    let framed = &bytes[..bytes.len() - container.trailing_len()];
    let reencoded = encode(&records)?;
    if reencoded != framed {
        let offset = reencoded
            .iter()
            .zip(framed)
            .position(|(a, b)| a != b)
            .unwrap_or(reencoded.len().min(framed.len()));
        anyhow::bail!(
            "container is valid but not in canonical encoder order (re-encoding differs at byte {})",
            offset
        );
    }

    let mut boundary_edges = 0;
    for record in &records {
        match WalkMesh::from_record(record) {
            Ok(mesh) => {
                let open = open_edges(&mesh);
                info!("'{}': {} triangles, {} boundary edges", record.name, record.triangle_count(), open);
                boundary_edges += open;
            }
            Err(NavError::Empty(name)) => warn!("'{}' has no triangles to walk on", name),
            Err(e) => return Err(e).with_context(|| format!("'{}' is not walkable", record.name)),
        }
    }

    Ok(format!(
        "ok ({} meshes, {} bytes round-trip, {} boundary edges)",
        records.len(),
        framed.len(),
        boundary_edges
    ))
}

/// Directed edges with no triangle on the other side
fn open_edges(mesh: &WalkMesh) -> usize {
    mesh.triangles()
        .iter()
        .flat_map(|t| [(t.x, t.y), (t.y, t.z), (t.z, t.x)])
        .filter(|&(a, b)| mesh.next_vertex(b, a).is_none())
        .count()
}
