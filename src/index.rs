// src/index.rs

//! Per-source package index
//!
//! One [`PackageIndex`] per package source, holding the base and name
//! arenas plus the two lookup tables resolution runs against: display name
//! and provided virtual name. Bases and names reference each other by
//! identity through the arenas, never by direct link.
//!
//! [`PackageIndex::materialize`] is the single write path: it folds a raw
//! result record into the index, creating partial records on first sight
//! and upgrading them in place when a complete record arrives. It is
//! idempotent and has no failure mode.

use std::collections::HashMap;

use tracing::debug;

use crate::package::{Hydration, PackageBase, PackageId, PackageName, PackageRecord};

/// Lookup tables and record arenas for one package source.
#[derive(Debug)]
pub struct PackageIndex {
    /// Name of the owning source, for logs and diagnostics.
    source: &'static str,
    bases: HashMap<PackageId, PackageBase>,
    names: HashMap<PackageId, PackageName>,
    by_name: HashMap<String, Vec<PackageId>>,
    by_provides: HashMap<String, Vec<PackageId>>,
}

impl PackageIndex {
    /// Create an empty index for the named source.
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            bases: HashMap::new(),
            names: HashMap::new(),
            by_name: HashMap::new(),
            by_provides: HashMap::new(),
        }
    }

    /// Name of the owning source.
    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn base(&self, id: &PackageId) -> Option<&PackageBase> {
        self.bases.get(id)
    }

    pub fn name(&self, id: &PackageId) -> Option<&PackageName> {
        self.names.get(id)
    }

    pub fn base_count(&self) -> usize {
        self.bases.len()
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Identities of packages with this exact display name.
    pub fn named(&self, name: &str) -> &[PackageId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Identities of packages providing this virtual name.
    pub fn providing(&self, virtual_name: &str) -> &[PackageId] {
        self.by_provides
            .get(virtual_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn has_provider(&self, virtual_name: &str) -> bool {
        self.by_provides.contains_key(virtual_name)
    }

    /// Fold one raw result record into the index.
    ///
    /// Creates the base and name on first sight (the name starts partial,
    /// even when the record is complete); if the record carries full fields
    /// and the name is still partial, copies them in, flips the hydration
    /// flag, and indexes every provided virtual name. Identity never
    /// changes, and a full name is never touched again, so materializing
    /// the same record twice is a no-op.
    pub fn materialize(&mut self, record: &PackageRecord) -> PackageId {
        if !self.names.contains_key(&record.name_id) {
            let source = self.source;
            let base = self
                .bases
                .entry(record.base_id.clone())
                .or_insert_with(|| {
                    debug!("{}: new base {} {}", source, record.base, record.version);
                    PackageBase {
                        name: record.base.clone(),
                        version: record.version.clone(),
                        names: Vec::new(),
                        depends: Vec::new(),
                        makedepends: Vec::new(),
                        optdepends: Vec::new(),
                    }
                });
            base.names.push(record.name_id.clone());

            self.names.insert(
                record.name_id.clone(),
                PackageName {
                    base: record.base_id.clone(),
                    name: record.name.clone(),
                    depends: Vec::new(),
                    makedepends: Vec::new(),
                    optdepends: Vec::new(),
                    provides: Vec::new(),
                    hydration: Hydration::Partial,
                },
            );
            self.by_name
                .entry(record.name.clone())
                .or_default()
                .push(record.name_id.clone());
        }

        if let Some(fields) = &record.fields {
            if let Some(name) = self.names.get_mut(&record.name_id) {
                if name.hydration == Hydration::Partial {
                    debug!("{}: hydrating {}", self.source, record.name);
                    name.depends = fields.depends.clone();
                    name.makedepends = fields.makedepends.clone();
                    name.optdepends = fields.optdepends.clone();
                    name.provides = fields.provides.clone();
                    name.hydration = Hydration::Full;
                    for provided in &fields.provides {
                        self.by_provides
                            .entry(provided.clone())
                            .or_default()
                            .push(record.name_id.clone());
                    }
                }
            }
        }

        record.name_id.clone()
    }

    /// Set the base-level dependency lists for an existing base.
    pub(crate) fn set_base_depends(
        &mut self,
        id: &PackageId,
        depends: Vec<String>,
        makedepends: Vec<String>,
        optdepends: Vec<String>,
    ) {
        if let Some(base) = self.bases.get_mut(id) {
            base.depends = depends;
            base.makedepends = makedepends;
            base.optdepends = optdepends;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageFields;

    fn partial_record() -> PackageRecord {
        PackageRecord {
            base_id: PackageId::Registry(100),
            name_id: PackageId::Registry(1),
            base: "nano".to_string(),
            name: "nano".to_string(),
            version: "8.5-2".to_string(),
            fields: None,
        }
    }

    fn full_record() -> PackageRecord {
        PackageRecord {
            fields: Some(PackageFields {
                depends: vec!["ncurses".to_string()],
                makedepends: vec!["gcc".to_string()],
                optdepends: Vec::new(),
                provides: vec!["editor".to_string()],
            }),
            ..partial_record()
        }
    }

    #[test]
    fn test_materialize_creates_base_and_name() {
        let mut index = PackageIndex::new("test");
        let id = index.materialize(&partial_record());

        assert_eq!(index.base_count(), 1);
        assert_eq!(index.name_count(), 1);
        assert_eq!(index.named("nano"), [id.clone()]);

        let name = index.name(&id).unwrap();
        assert!(!name.is_full());
        let base = index.base(&name.base).unwrap();
        assert_eq!(base.version, "8.5-2");
        assert!(base.names.contains(&id));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let mut index = PackageIndex::new("test");
        index.materialize(&full_record());
        index.materialize(&full_record());

        assert_eq!(index.base_count(), 1);
        assert_eq!(index.name_count(), 1);
        assert_eq!(index.named("nano").len(), 1);
        assert_eq!(index.providing("editor").len(), 1);

        let name = index.name(&PackageId::Registry(1)).unwrap();
        assert_eq!(name.depends, ["ncurses"]);
    }

    #[test]
    fn test_partial_then_full_upgrades_without_duplicate() {
        let mut index = PackageIndex::new("test");
        let first = index.materialize(&partial_record());
        assert!(!index.name(&first).unwrap().is_full());
        assert!(!index.has_provider("editor"));

        let second = index.materialize(&full_record());
        assert_eq!(first, second);
        assert_eq!(index.name_count(), 1);

        let name = index.name(&second).unwrap();
        assert!(name.is_full());
        assert_eq!(name.provides, ["editor"]);
        assert_eq!(index.providing("editor"), [second]);
    }

    #[test]
    fn test_full_record_is_never_downgraded() {
        let mut index = PackageIndex::new("test");
        index.materialize(&full_record());
        // a later abbreviated record for the same identity changes nothing
        index.materialize(&partial_record());

        let name = index.name(&PackageId::Registry(1)).unwrap();
        assert!(name.is_full());
        assert_eq!(name.depends, ["ncurses"]);
    }

    #[test]
    fn test_sibling_name_joins_existing_base() {
        let mut index = PackageIndex::new("test");
        index.materialize(&partial_record());

        let sibling = PackageRecord {
            name_id: PackageId::Registry(2),
            name: "nano-syntax".to_string(),
            ..partial_record()
        };
        index.materialize(&sibling);

        assert_eq!(index.base_count(), 1);
        assert_eq!(index.name_count(), 2);
        let base = index.base(&PackageId::Registry(100)).unwrap();
        assert_eq!(base.names.len(), 2);
    }

    #[test]
    fn test_base_name_back_references_are_consistent() {
        let mut index = PackageIndex::new("test");
        index.materialize(&full_record());
        index.materialize(&PackageRecord {
            name_id: PackageId::Registry(2),
            name: "nano-syntax".to_string(),
            ..partial_record()
        });

        let base = index.base(&PackageId::Registry(100)).unwrap();
        for name_id in &base.names {
            let name = index.name(name_id).unwrap();
            assert_eq!(name.base, PackageId::Registry(100));
        }
    }
}
