// src/provider/local.rs

//! Local recipe provider
//!
//! Builds a [`PackageIndex`] straight from parsed recipe metadata. A local
//! tree has exactly one record per declared base and name, so the declared
//! strings themselves are the identities and every record is created fully
//! hydrated.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::PackageProvider;
use crate::error::Result;
use crate::index::PackageIndex;
use crate::package::{PackageFields, PackageId, PackageRecord};
use crate::recipe::{Pkgbuild, Section, Srcinfo, SrcinfoError, Value};

/// Package source backed by a local recipe collection.
pub struct LocalProvider {
    index: PackageIndex,
}

/// List value of `key` in `section`, with base-section fallback.
fn list_value(srcinfo: &Srcinfo, section: &Section, key: &str) -> Vec<String> {
    srcinfo
        .get(section, key)
        .and_then(Value::as_list)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// List value of `key` in `section` only, no fallback.
fn own_list_value(section: &Section, key: &str) -> Vec<String> {
    section
        .get(key)
        .and_then(Value::as_list)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

fn single_value<'a>(
    section: &'a Section,
    key: &str,
    recipe: &Pkgbuild,
) -> std::result::Result<&'a str, SrcinfoError> {
    section
        .get(key)
        .and_then(Value::as_single)
        .ok_or_else(|| SrcinfoError::MissingKey {
            recipe: recipe.to_string(),
            key: key.to_string(),
        })
}

impl LocalProvider {
    /// Build the index from parsed recipes.
    ///
    /// Fails on the first recipe whose metadata is incomplete or violates
    /// a recipe invariant; the caller decides whether to drop that recipe
    /// and retry or abort the batch.
    pub fn load<'a, I>(recipes: I) -> std::result::Result<Self, SrcinfoError>
    where
        I: IntoIterator<Item = (&'a Pkgbuild, &'a Srcinfo)>,
    {
        let mut index = PackageIndex::new("local");

        for (pkgbuild, srcinfo) in recipes {
            Self::load_recipe(&mut index, pkgbuild, srcinfo)?;
        }

        info!(
            "local index ready: {} bases, {} names",
            index.base_count(),
            index.name_count()
        );
        Ok(Self { index })
    }

    fn load_recipe(
        index: &mut PackageIndex,
        pkgbuild: &Pkgbuild,
        srcinfo: &Srcinfo,
    ) -> std::result::Result<(), SrcinfoError> {
        let missing = |key: &str| SrcinfoError::MissingKey {
            recipe: pkgbuild.to_string(),
            key: key.to_string(),
        };

        let base = srcinfo.pkgbase().ok_or_else(|| missing("pkgbase"))?;
        let base_section = srcinfo.base_section().ok_or_else(|| missing("pkgbase"))?;

        let pkgver = single_value(base_section, "pkgver", pkgbuild)?;
        let pkgrel = single_value(base_section, "pkgrel", pkgbuild)?;
        let version = match base_section.get("epoch").and_then(Value::as_single) {
            Some(epoch) => format!("{epoch}:{pkgver}-{pkgrel}"),
            None => format!("{pkgver}-{pkgrel}"),
        };

        let names = srcinfo.pkgnames();
        debug!("loading {base} {version} ({} names)", names.len());

        let base_id = PackageId::Recipe(base.to_string());
        for name in names {
            let section = srcinfo
                .name_section(name)
                .ok_or_else(|| missing(name.as_str()))?;

            let fields = PackageFields {
                depends: list_value(srcinfo, section, "depends"),
                makedepends: list_value(srcinfo, section, "makedepends"),
                optdepends: list_value(srcinfo, section, "optdepends"),
                provides: Self::provides(srcinfo, section, base_section, names, pkgbuild)?,
            };

            index.materialize(&PackageRecord {
                base_id: base_id.clone(),
                name_id: PackageId::Recipe(name.clone()),
                base: base.to_string(),
                name: name.clone(),
                version: version.clone(),
                fields: Some(fields),
            });
        }

        // base-level dependency lists come from the base section alone
        index.set_base_depends(
            &base_id,
            own_list_value(base_section, "depends"),
            own_list_value(base_section, "makedepends"),
            own_list_value(base_section, "optdepends"),
        );

        Ok(())
    }

    /// Provides list for one name section.
    ///
    /// A name section without its own `provides` key falls back to the
    /// base section, but only a single-name recipe may rely on that: a
    /// base producing several differently-provisioned names must declare
    /// `provides` per name.
    fn provides(
        srcinfo: &Srcinfo,
        section: &Section,
        base_section: &Section,
        names: &[String],
        pkgbuild: &Pkgbuild,
    ) -> std::result::Result<Vec<String>, SrcinfoError> {
        if let Some(own) = section.get("provides") {
            return Ok(own.as_list().map(<[String]>::to_vec).unwrap_or_default());
        }
        match base_section.get("provides") {
            Some(shared) => {
                if names.len() != 1 {
                    return Err(SrcinfoError::SharedProvides {
                        recipe: pkgbuild.to_string(),
                    });
                }
                Ok(shared.as_list().map(<[String]>::to_vec).unwrap_or_default())
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }
}

impl PackageProvider for LocalProvider {
    fn id(&self) -> &'static str {
        "local"
    }

    fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Local resolution never queries anything; a name is resolved when the
    /// index already knows it by display name or by provided virtual name.
    fn resolve(&mut self, pkgnames: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        Ok(pkgnames
            .iter()
            .filter(|name| !self.index.has_name(name) && !self.index.has_provider(name))
            .cloned()
            .collect())
    }
}
