// src/recipe/discover.rs

//! Recipe tree discovery
//!
//! Walks a directory tree and yields one [`Pkgbuild`] per recipe directory.
//! A directory that contains a `PKGBUILD` is a recipe and is not descended
//! into; a directory with a `trunk/PKGBUILD` checkout (asp-style layout) is
//! treated the same way.

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use super::pkgbuild::Pkgbuild;
use crate::error::{Error, Result};

/// Find all recipes under `root`.
pub fn find_pkgbuilds(root: &Path) -> Result<Vec<Pkgbuild>> {
    let mut found = Vec::new();

    let mut walker = WalkDir::new(root).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry
            .map_err(|e| Error::IoError(format!("failed to walk {}: {e}", root.display())))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        let recipe_file = dir.join("PKGBUILD");
        let trunk_recipe_file = dir.join("trunk").join("PKGBUILD");

        if recipe_file.is_file() {
            debug!("found recipe {}", recipe_file.display());
            found.push(Pkgbuild::from_path(dir, recipe_file));
            walker.skip_current_dir();
        } else if trunk_recipe_file.is_file() {
            debug!("found trunk recipe {}", trunk_recipe_file.display());
            found.push(Pkgbuild::from_path(dir, trunk_recipe_file));
            walker.skip_current_dir();
        }
    }

    info!("discovered {} recipes under {}", found.len(), root.display());
    Ok(found)
}
