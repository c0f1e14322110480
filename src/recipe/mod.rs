// src/recipe/mod.rs

//! Build recipes and their metadata
//!
//! A recipe is a PKGBUILD-style build script; the engine never interprets
//! the script itself, only the `.SRCINFO` metadata generated from it:
//!
//! - [`Pkgbuild`]: a recipe on disk, with makepkg invocation and the
//!   reuse-or-regenerate rule for the `.SRCINFO` sidecar
//! - [`Srcinfo`]: the parsed section tree (base section, name sections,
//!   inheritance by base-section fallback)
//! - [`find_pkgbuilds`]: recipe discovery under a directory tree

mod discover;
mod pkgbuild;
mod srcinfo;

pub use discover::find_pkgbuilds;
pub use pkgbuild::Pkgbuild;
pub use srcinfo::{Section, SectionHeader, SectionKind, Srcinfo, SrcinfoError, Value};
