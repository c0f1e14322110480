// src/config.rs

//! Configuration
//!
//! TOML-backed settings for the resolution engine: where the local recipe
//! tree lives, which repository name it feeds, an optional makepkg
//! configuration, and the remote registry endpoint. Every field has a
//! default so running without a config file works.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::aur::AUR_BASE_URL;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root directory of the local recipe tree
    #[serde(default = "default_pkgbuild_root")]
    pub pkgbuild_root: PathBuf,

    /// Name of the repository the recipe tree feeds
    #[serde(default = "default_repo_name")]
    pub repo_name: String,

    /// makepkg configuration passed to recipe regeneration, if any
    #[serde(default)]
    pub makepkg_conf: Option<PathBuf>,

    /// Base URL of the remote registry RPC endpoint
    #[serde(default = "default_aur_url")]
    pub aur_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pkgbuild_root: default_pkgbuild_root(),
            repo_name: default_repo_name(),
            makepkg_conf: None,
            aur_url: default_aur_url(),
        }
    }
}

fn default_pkgbuild_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pkgbuild")
}

fn default_repo_name() -> String {
    "custom".to_string()
}

fn default_aur_url() -> String {
    AUR_BASE_URL.to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("invalid config {}: {e}", path.display())))
    }
}
