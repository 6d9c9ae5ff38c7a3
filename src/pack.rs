//! Pack walk meshes from a scene into a `.pnt` container

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use walkmesh_format::{ChunkHeader, ChunkTag, Container, Encoder};

use crate::settings::Settings;

/// Arguments for packing a container
#[derive(Debug, Args)]
pub struct PackArgs {
    /// Scene to extract from (.gltf, .glb or .json)
    pub input: PathBuf,

    /// Output file (default: input with the configured extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only pack meshes whose name contains this (overrides settings)
    #[arg(long)]
    pub filter: Option<String>,
}

/// Execute the pack command
pub fn execute(args: PackArgs, settings: &Settings) -> Result<()> {
    let mut options = settings.import.options();
    if let Some(filter) = args.filter {
        options.name_filter = filter;
    }

    let output = args
        .output
        .unwrap_or_else(|| settings.output.output_for(&args.input));

    info!(
        "Will pack walk meshes matching '{}' from '{}' to '{}'",
        options.name_filter,
        args.input.display(),
        output.display()
    );

    let records = walkmesh_import::load_records(&args.input, &options)
        .with_context(|| format!("Failed to extract meshes from {}", args.input.display()))?;
    if records.is_empty() {
        anyhow::bail!(
            "No meshes matching '{}' in {}",
            options.name_filter,
            args.input.display()
        );
    }

    let mut encoder = Encoder::new();
    for record in &records {
        info!("Writing '{}'...", record.name);
        encoder
            .push(record)
            .with_context(|| format!("Failed to encode mesh '{}'", record.name))?;
    }
    let bytes = encoder.finish()?;

    write_output(&output, &bytes)?;
    println!("{}", report(&bytes, &output)?);
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Summary of the bytes written per chunk, headers included
fn report(bytes: &[u8], output: &Path) -> Result<String> {
    let container = Container::parse(bytes)?;
    let framed = |tag| container.payload_len(tag) + ChunkHeader::SIZE;
    Ok(format!(
        "Wrote {} bytes [== {} bytes of vert data + {} bytes of tri data + {} bytes of strings + {} bytes of index] to '{}'",
        bytes.len(),
        framed(ChunkTag::Vertices),
        framed(ChunkTag::Triangles),
        framed(ChunkTag::Strings),
        framed(ChunkTag::Index),
        output.display()
    ))
}
