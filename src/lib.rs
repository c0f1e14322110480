// src/lib.rs

//! Pkgforge build-recipe metadata engine
//!
//! Parses PKGBUILD-style recipe metadata (`.SRCINFO`) into canonical
//! package records and resolves package names against one or more sources
//! using an exact-match-then-virtual-provides strategy.
//!
//! # Architecture
//!
//! - Recipe parsing: section tree with base-section inheritance
//! - Package model: identity-keyed base/name records with explicit
//!   partial/full hydration
//! - One index per source: display-name and provides lookup tables,
//!   idempotent materialization
//! - Sources: local recipe trees and the AUR RPC, chained by feeding each
//!   source the names the previous ones missed

pub mod config;
mod error;
pub mod index;
pub mod package;
pub mod provider;
pub mod recipe;

pub use config::Config;
pub use error::{Error, Result};
pub use index::PackageIndex;
pub use package::{Hydration, PackageBase, PackageFields, PackageId, PackageName, PackageRecord};
pub use provider::aur::{AurClient, AurError, AurProvider, AurRpc, SearchField};
pub use provider::{LocalProvider, PackageProvider, resolve_chain};
pub use recipe::{Pkgbuild, Srcinfo, SrcinfoError, find_pkgbuilds};
