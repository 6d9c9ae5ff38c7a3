//! Walkmesh - Pack and inspect walk-mesh containers
//!
//! # Commands
//!
//! - `walkmesh pack <scene>` - Extract walk meshes from a glTF/JSON scene into a .pnt file
//! - `walkmesh info <file>` - Print chunk sizes and index entries
//! - `walkmesh dump <file>` - Print meshes as JSON
//! - `walkmesh check <file>` - Decode, re-encode and compare a container
//! - `walkmesh config` - Print (or save) the effective settings

mod inspect;
mod pack;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use settings::Settings;

#[derive(Parser)]
#[command(name = "walkmesh")]
#[command(about = "Walk-mesh container tool")]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.config/walkmesh/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack walk meshes from a scene into a container
    Pack(pack::PackArgs),
    /// Show the layout of a container
    Info(inspect::InfoArgs),
    /// Print the meshes of a container as JSON
    Dump(inspect::DumpArgs),
    /// Verify that a container decodes and re-encodes identically
    Check(inspect::CheckArgs),
    /// Print the effective settings
    Config {
        /// Write them to the settings file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (settings, notes) = Settings::load(cli.config.as_deref());

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|e| {
            eprintln!("Invalid log level '{}': {}", settings.log_level, e);
            EnvFilter::new("info")
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    for (level, note) in notes {
        if level == Level::WARN {
            warn!("{}", note);
        } else {
            info!("{}", note);
        }
    }

    match cli.command {
        Commands::Pack(args) => pack::execute(args, &settings),
        Commands::Info(args) => inspect::info(args),
        Commands::Dump(args) => inspect::dump(args),
        Commands::Check(args) => inspect::check(args),
        Commands::Config { save } => {
            print!("{}", toml::to_string_pretty(&settings)?);
            if save {
                match &cli.config {
                    Some(path) => settings.save(path),
                    None => settings.save_default(),
                }
                .context("Failed to save settings")?;
            }
            Ok(())
        }
    }
}
