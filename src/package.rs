// src/package.rs

//! Package record model
//!
//! Entity types shared by every package source: a `PackageBase` is a build
//! unit, a `PackageName` is one installable artifact it produces. Records are
//! addressed by stable identities and cross-reference each other through the
//! owning [`PackageIndex`](crate::index::PackageIndex) rather than by direct
//! links, so the graph has no ownership cycles.

use std::fmt;

/// Stable identity of a base or name record within one source.
///
/// Remote registries key records by their numeric id because display names
/// are not guaranteed unique across bases. A local recipe collection has
/// exactly one record per declared string, so the string itself is the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageId {
    /// Stable numeric id assigned by a remote registry.
    Registry(i64),
    /// Declared base/name string from a local recipe.
    Recipe(String),
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(id) => write!(f, "#{id}"),
            Self::Recipe(name) => write!(f, "{name}"),
        }
    }
}

/// Hydration level of a [`PackageName`].
///
/// Search-style registry queries return abbreviated records with no
/// dependency or provides lists; bulk info queries return complete ones.
/// The level is tracked explicitly and never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Created from an abbreviated record; list fields are empty.
    Partial,
    /// All fields populated from a complete record.
    Full,
}

/// A build unit producing one or more installable names.
#[derive(Debug, Clone)]
pub struct PackageBase {
    /// Display name of the base.
    pub name: String,
    /// Full version string (`epoch:pkgver-pkgrel` or `pkgver-pkgrel`).
    pub version: String,
    /// Identities of the names this base produces, in discovery order.
    pub names: Vec<PackageId>,
    /// Base-level runtime dependencies.
    pub depends: Vec<String>,
    /// Base-level build dependencies.
    pub makedepends: Vec<String>,
    /// Base-level optional dependencies.
    pub optdepends: Vec<String>,
}

/// One installable artifact produced by a [`PackageBase`].
#[derive(Debug, Clone)]
pub struct PackageName {
    /// Identity of the owning base.
    pub base: PackageId,
    /// Display name.
    pub name: String,
    pub depends: Vec<String>,
    pub makedepends: Vec<String>,
    pub optdepends: Vec<String>,
    /// Virtual names this package satisfies.
    pub provides: Vec<String>,
    /// Whether the list fields above have been populated.
    pub hydration: Hydration,
}

impl PackageName {
    /// True once a complete record has been folded in.
    pub fn is_full(&self) -> bool {
        self.hydration == Hydration::Full
    }
}

/// List fields carried only by complete records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageFields {
    pub depends: Vec<String>,
    pub makedepends: Vec<String>,
    pub optdepends: Vec<String>,
    pub provides: Vec<String>,
}

/// Normalized raw result record, the input to
/// [`PackageIndex::materialize`](crate::index::PackageIndex::materialize).
///
/// Both package sources reduce their native record shapes to this form:
/// identities, display names, a version, and optionally the full list
/// fields. `fields: None` marks an abbreviated (search-style) record.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub base_id: PackageId,
    pub name_id: PackageId,
    /// Display name of the owning base.
    pub base: String,
    /// Display name of the package.
    pub name: String,
    pub version: String,
    /// Present on complete records only.
    pub fields: Option<PackageFields>,
}
