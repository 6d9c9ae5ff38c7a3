//! Tool settings with persistence
//!
//! Settings are read from `--config <path>` or `~/.config/walkmesh/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use walkmesh_import::ImportOptions;

/// All tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    pub import: ImportSettings,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            import: ImportSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("walkmesh"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location), falling back to
    /// defaults if the file is missing or invalid.
    ///
    /// Runs before logging is installed, so what happened is returned as
    /// notes for the caller to log once the subscriber exists.
    pub fn load(path: Option<&Path>) -> (Self, Vec<(Level, String)>) {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::settings_path() {
                Some(path) => path,
                None => {
                    return (
                        Self::default(),
                        vec![(Level::WARN, "Could not determine config directory".to_string())],
                    )
                }
            },
        };

        if !path.exists() {
            return (
                Self::default(),
                vec![(Level::INFO, format!("No settings file at {:?}, using defaults", path))],
            );
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => (settings, vec![(Level::INFO, format!("Loaded settings from {:?}", path))]),
                Err(e) => (
                    Self::default(),
                    vec![(Level::WARN, format!("Failed to parse settings: {}, using defaults", e))],
                ),
            },
            Err(e) => (
                Self::default(),
                vec![(Level::WARN, format!("Failed to read settings file: {}, using defaults", e))],
            ),
        }
    }

    /// Save settings to `path`, creating its directory
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Save to the default location
    pub fn save_default(&self) -> anyhow::Result<()> {
        let Some(path) = Self::settings_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save(&path)
    }
}

/// Mesh extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Only meshes whose name contains this are packed; empty packs everything
    pub name_filter: String,
    /// Reject meshes without normals instead of zero-filling them
    pub require_normals: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        let options = ImportOptions::default();
        Self {
            name_filter: options.name_filter,
            require_normals: options.require_normals,
        }
    }
}

impl ImportSettings {
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            name_filter: self.name_filter.clone(),
            require_normals: self.require_normals,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Extension given to packed files when no output path is passed
    pub extension: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            extension: walkmesh_format::WALKMESH_EXT.to_string(),
        }
    }
}

impl OutputSettings {
    /// Output path for `input` when none was given
    pub fn output_for(&self, input: &Path) -> PathBuf {
        if self.extension != walkmesh_format::WALKMESH_EXT {
            warn!(
                "Output extension '{}' cannot be loaded back as a walk-mesh buffer",
                self.extension
            );
        }
        input.with_extension(&self.extension)
    }
}
