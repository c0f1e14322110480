// src/error.rs

//! Crate-wide error type
//!
//! The two domain taxonomies ([`SrcinfoError`] for recipe parsing,
//! [`AurError`] for the remote registry) are defined next to the code that
//! raises them; this module folds them into one `Error` for callers that
//! drive both sources.

use thiserror::Error;

use crate::provider::aur::AurError;
use crate::recipe::SrcinfoError;

/// Result type for pkgforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the resolution engine
#[derive(Error, Debug)]
pub enum Error {
    /// Recipe metadata could not be parsed or violated a recipe invariant
    #[error("{0}")]
    Srcinfo(#[from] SrcinfoError),

    /// A remote registry query failed
    #[error("{0}")]
    Aur(#[from] AurError),

    /// Filesystem operation failed
    #[error("IO error: {0}")]
    IoError(String),

    /// An external tool invocation failed
    #[error("command failed: {0}")]
    CommandError(String),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    ConfigError(String),
}
