// src/provider/mod.rs

//! Package sources
//!
//! A provider owns one [`PackageIndex`](crate::index::PackageIndex) and
//! knows how to resolve display names against its backing store: the local
//! recipe tree ([`LocalProvider`]) or the remote registry
//! ([`AurProvider`](aur::AurProvider)). Sources deduplicate internally;
//! callers combine sources by chaining, feeding each provider the names the
//! previous ones missed.

pub mod aur;
pub mod local;

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::index::PackageIndex;

pub use local::LocalProvider;

/// A provider of package records.
pub trait PackageProvider {
    /// Short stable identifier of this source.
    fn id(&self) -> &'static str;

    /// The index this source maintains.
    fn index(&self) -> &PackageIndex;

    /// Resolve the requested display names against this source,
    /// materializing whatever records it can and returning the names it
    /// could not satisfy. Misses are a normal output, not an error.
    fn resolve(&mut self, pkgnames: &BTreeSet<String>) -> Result<BTreeSet<String>>;
}

/// Resolve names across several providers in order.
///
/// Each provider only sees the names every earlier provider missed. The
/// returned set contains the names no provider could satisfy.
pub fn resolve_chain(
    providers: &mut [&mut dyn PackageProvider],
    pkgnames: &BTreeSet<String>,
) -> Result<BTreeSet<String>> {
    let mut missing = pkgnames.clone();
    for provider in providers.iter_mut() {
        if missing.is_empty() {
            break;
        }
        debug!("resolving {} names against {}", missing.len(), provider.id());
        missing = provider.resolve(&missing)?;
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageFields, PackageId, PackageRecord};

    /// Minimal provider over a fixed name set.
    struct StaticProvider {
        id: &'static str,
        index: PackageIndex,
    }

    impl StaticProvider {
        fn with_names(id: &'static str, names: &[&str]) -> Self {
            let mut index = PackageIndex::new(id);
            for name in names {
                index.materialize(&PackageRecord {
                    base_id: PackageId::Recipe(name.to_string()),
                    name_id: PackageId::Recipe(name.to_string()),
                    base: name.to_string(),
                    name: name.to_string(),
                    version: "1-1".to_string(),
                    fields: Some(PackageFields::default()),
                });
            }
            Self { id, index }
        }
    }

    impl PackageProvider for StaticProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn index(&self) -> &PackageIndex {
            &self.index
        }

        fn resolve(&mut self, pkgnames: &BTreeSet<String>) -> Result<BTreeSet<String>> {
            Ok(pkgnames
                .iter()
                .filter(|name| !self.index.has_name(name))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_chain_feeds_misses_forward() {
        let mut first = StaticProvider::with_names("first", &["a"]);
        let mut second = StaticProvider::with_names("second", &["b"]);

        let requested: BTreeSet<String> =
            ["a", "b", "c"].into_iter().map(str::to_string).collect();
        let missing = resolve_chain(
            &mut [
                &mut first as &mut dyn PackageProvider,
                &mut second as &mut dyn PackageProvider,
            ],
            &requested,
        )
        .unwrap();

        assert_eq!(missing.len(), 1);
        assert!(missing.contains("c"));
    }

    #[test]
    fn test_chain_stops_early_when_satisfied() {
        let mut first = StaticProvider::with_names("first", &["a"]);
        let mut second = StaticProvider::with_names("second", &[]);

        let requested: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        let missing = resolve_chain(
            &mut [
                &mut first as &mut dyn PackageProvider,
                &mut second as &mut dyn PackageProvider,
            ],
            &requested,
        )
        .unwrap();
        assert!(missing.is_empty());
    }
}
