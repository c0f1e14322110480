// src/recipe/srcinfo.rs

//! .SRCINFO parser
//!
//! Parses the line-oriented `.SRCINFO` metadata format emitted by
//! `makepkg --printsrcinfo` into a section tree: one optional `pkgbase`
//! section carrying build-unit data, and one `pkgname` section per
//! installable name. Name sections inherit from the base section by
//! fallback at lookup time, not by copying.
//!
//! # Format
//!
//! ```text
//! pkgbase = nano
//!     pkgver = 8.5
//!     pkgrel = 2
//!     arch = x86_64
//!     depends = ncurses
//!     depends_x86_64 = glibc
//!
//! pkgname = nano
//! ```
//!
//! Keys are classified (base-only, single-valued, list-valued, or
//! architecture-qualified) and misuse is rejected with an error naming the
//! offending recipe. Parsing never recovers internally; a bad line is fatal
//! to that one recipe and the caller decides whether to skip it.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use thiserror::Error;

use super::pkgbuild::Pkgbuild;

/// Keys meaningful only inside the base section.
const PKGBASE_KEYS: [&str; 3] = ["pkgver", "pkgrel", "epoch"];

/// Single-valued keys; repeating one inside a section is an error.
const SINGLE_KEYS: [&str; 4] = ["pkgdesc", "url", "install", "changelog"];

/// List-valued keys; repeats append in encounter order.
const LIST_KEYS: [&str; 7] = [
    "arch",
    "groups",
    "license",
    "noextract",
    "options",
    "backup",
    "validpgpkeys",
];

/// List-valued keys that may additionally carry an `_<arch>` suffix.
const ARCH_KEYS: [&str; 14] = [
    "source",
    "depends",
    "checkdepends",
    "makedepends",
    "optdepends",
    "provides",
    "conflicts",
    "replaces",
    "md5sums",
    "sha1sums",
    "sha224sums",
    "sha256sums",
    "sha384sums",
    "sha512sums",
];

/// Which of the two reserved keys opened a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Base,
    Name,
}

impl SectionKind {
    /// The reserved key that opens sections of this kind.
    pub fn key(self) -> &'static str {
        match self {
            Self::Base => "pkgbase",
            Self::Name => "pkgname",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "pkgbase" => Some(Self::Base),
            "pkgname" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Identifies one section within a recipe: the opening key plus its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionHeader {
    pub kind: SectionKind,
    pub name: String,
}

impl SectionHeader {
    pub fn new(kind: SectionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for SectionHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.kind.key(), self.name)
    }
}

/// A parsed value: a single string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Single(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Key/value contents of one section.
pub type Section = HashMap<String, Value>;

/// Errors raised while parsing or interpreting one recipe's metadata.
///
/// Every variant names the recipe it came from.
#[derive(Error, Debug)]
pub enum SrcinfoError {
    #[error("{recipe}: duplicate section {header}")]
    DuplicateSection { recipe: String, header: SectionHeader },

    #[error("{recipe}: multiple pkgbase sections: {first} and {second}")]
    MultipleBase {
        recipe: String,
        first: String,
        second: String,
    },

    #[error("{recipe}: key {key} before any section")]
    KeyBeforeSection { recipe: String, key: String },

    #[error("{recipe}: pkgbase-only key {key} in section {header}")]
    BaseOnlyKey {
        recipe: String,
        key: String,
        header: SectionHeader,
    },

    #[error("{recipe}: repeated key {key} in section {header}")]
    RepeatedKey {
        recipe: String,
        key: String,
        header: SectionHeader,
    },

    #[error("{recipe}: unknown key {key}")]
    UnknownKey { recipe: String, key: String },

    #[error("{recipe}: malformed line: {line}")]
    MalformedLine { recipe: String, line: String },

    #[error("{recipe}: missing {key}")]
    MissingKey { recipe: String, key: String },

    #[error("{recipe}: pkgbase-level provides requires exactly one pkgname")]
    SharedProvides { recipe: String },
}

/// Parsed `.SRCINFO` contents for one recipe.
#[derive(Debug, Clone)]
pub struct Srcinfo {
    /// Aggregated section-header keys: `pkgbase` as a single value,
    /// `pkgname` as a list in declaration order.
    pub headers: Section,
    /// Contents of each section, keyed by its header.
    pub sections: HashMap<SectionHeader, Section>,
}

/// Append `value` to the list under `key`, creating it on first use.
///
/// An empty value assigns an empty list when the key is not yet present,
/// which lets a name section override an inherited base-level list with
/// nothing at all.
fn set_list_value(section: &mut Section, key: &str, value: &str) {
    if value.is_empty() && !section.contains_key(key) {
        section.insert(key.to_string(), Value::List(Vec::new()));
        return;
    }
    let slot = section
        .entry(key.to_string())
        .or_insert_with(|| Value::List(Vec::new()));
    if let Value::List(items) = slot {
        items.push(value.to_string());
    }
}

/// Look up `key` in the section at `cur`, falling back to the base section.
fn get_value<'a>(
    sections: &'a [(SectionHeader, Section)],
    cur: usize,
    base: Option<usize>,
    key: &str,
) -> Option<&'a Value> {
    sections[cur]
        .1
        .get(key)
        .or_else(|| base.and_then(|b| sections[b].1.get(key)))
}

impl Srcinfo {
    /// Parse an ordered sequence of `.SRCINFO` lines.
    ///
    /// `recipe` is used only to attribute errors to their source.
    pub fn from_lines<'a, I>(lines: I, recipe: &Pkgbuild) -> Result<Self, SrcinfoError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let line_re =
            Regex::new(r"^([A-Za-z0-9_]+)\s*=\s*(.*?)\s*$").expect("invalid .SRCINFO line pattern");

        let mut headers: Section = Section::new();
        let mut sections: Vec<(SectionHeader, Section)> = Vec::new();
        let mut base_idx: Option<usize> = None;
        let mut cur_idx: Option<usize> = None;

        for raw in lines {
            let line = raw.trim();

            // skip blanks and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(caps) = line_re.captures(line) else {
                return Err(SrcinfoError::MalformedLine {
                    recipe: recipe.to_string(),
                    line: raw.to_string(),
                });
            };
            let (key, value) = (&caps[1], &caps[2]);

            if let Some(kind) = SectionKind::from_key(key) {
                let header = SectionHeader::new(kind, value);
                if sections.iter().any(|(h, _)| *h == header) {
                    return Err(SrcinfoError::DuplicateSection {
                        recipe: recipe.to_string(),
                        header,
                    });
                }
                if kind == SectionKind::Base {
                    if let Some(first) = base_idx {
                        return Err(SrcinfoError::MultipleBase {
                            recipe: recipe.to_string(),
                            first: sections[first].0.name.clone(),
                            second: header.name,
                        });
                    }
                    base_idx = Some(sections.len());
                    headers.insert(key.to_string(), Value::Single(value.to_string()));
                } else {
                    set_list_value(&mut headers, key, value);
                }
                cur_idx = Some(sections.len());
                sections.push((header, Section::new()));
                continue;
            }

            let Some(cur) = cur_idx else {
                return Err(SrcinfoError::KeyBeforeSection {
                    recipe: recipe.to_string(),
                    key: key.to_string(),
                });
            };

            if PKGBASE_KEYS.contains(&key) && sections[cur].0.kind != SectionKind::Base {
                return Err(SrcinfoError::BaseOnlyKey {
                    recipe: recipe.to_string(),
                    key: key.to_string(),
                    header: sections[cur].0.clone(),
                });
            }

            if PKGBASE_KEYS.contains(&key) || SINGLE_KEYS.contains(&key) {
                if sections[cur].1.contains_key(key) {
                    return Err(SrcinfoError::RepeatedKey {
                        recipe: recipe.to_string(),
                        key: key.to_string(),
                        header: sections[cur].0.clone(),
                    });
                }
                sections[cur]
                    .1
                    .insert(key.to_string(), Value::Single(value.to_string()));
            } else if LIST_KEYS.contains(&key) || ARCH_KEYS.contains(&key) {
                set_list_value(&mut sections[cur].1, key, value);
            } else if Self::valid_arch_key(key, &sections, cur, base_idx) {
                set_list_value(&mut sections[cur].1, key, value);
            } else {
                return Err(SrcinfoError::UnknownKey {
                    recipe: recipe.to_string(),
                    key: key.to_string(),
                });
            }
        }

        Ok(Self {
            headers,
            sections: sections.into_iter().collect(),
        })
    }

    /// Parse from one text blob.
    pub fn from_str(text: &str, recipe: &Pkgbuild) -> Result<Self, SrcinfoError> {
        Self::from_lines(text.lines(), recipe)
    }

    /// Check an `_<arch>` suffixed key against the section's effective
    /// `arch` list (current section first, then the base section).
    fn valid_arch_key(
        key: &str,
        sections: &[(SectionHeader, Section)],
        cur: usize,
        base: Option<usize>,
    ) -> bool {
        let Some((prefix, arch)) = key.split_once('_') else {
            return false;
        };
        if !ARCH_KEYS.contains(&prefix) {
            return false;
        }
        get_value(sections, cur, base, "arch")
            .and_then(Value::as_list)
            .is_some_and(|archs| archs.iter().any(|a| a == arch))
    }

    /// Declared base name, if a `pkgbase` section was present.
    pub fn pkgbase(&self) -> Option<&str> {
        self.headers.get("pkgbase").and_then(Value::as_single)
    }

    /// Declared installable names, in declaration order.
    pub fn pkgnames(&self) -> &[String] {
        self.headers
            .get("pkgname")
            .and_then(Value::as_list)
            .unwrap_or(&[])
    }

    /// Contents of the base section.
    pub fn base_section(&self) -> Option<&Section> {
        let base = self.pkgbase()?;
        self.sections
            .get(&SectionHeader::new(SectionKind::Base, base))
    }

    /// Contents of the section declaring `name`.
    pub fn name_section(&self, name: &str) -> Option<&Section> {
        self.sections
            .get(&SectionHeader::new(SectionKind::Name, name))
    }

    /// Look up `key` in `section`, falling back to the base section.
    pub fn get<'a>(&'a self, section: &'a Section, key: &str) -> Option<&'a Value> {
        section
            .get(key)
            .or_else(|| self.base_section().and_then(|base| base.get(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_recipe() -> Pkgbuild {
        Pkgbuild::from_path(Path::new("/tmp/nano"), Path::new("/tmp/nano/PKGBUILD"))
    }

    fn parse(text: &str) -> Result<Srcinfo, SrcinfoError> {
        Srcinfo::from_str(text, &test_recipe())
    }

    const SPLIT_RECIPE: &str = r#"
# Generated by makepkg
pkgbase = gcc
	pkgver = 14.1.0
	pkgrel = 1
	arch = x86_64
	license = GPL
	makedepends = binutils
	depends = glibc
	provides = cc

pkgname = gcc
	depends = gcc-libs
	provides = gcc-multilib

pkgname = gcc-libs
	provides =
"#;

    #[test]
    fn test_headers_round_trip() {
        let srcinfo = parse(SPLIT_RECIPE).unwrap();
        assert_eq!(srcinfo.pkgbase(), Some("gcc"));
        assert_eq!(srcinfo.pkgnames(), ["gcc", "gcc-libs"]);
        assert_eq!(srcinfo.sections.len(), 3);
    }

    #[test]
    fn test_base_fallback() {
        let srcinfo = parse(SPLIT_RECIPE).unwrap();
        let libs = srcinfo.name_section("gcc-libs").unwrap();

        // gcc-libs declares no license; the base value applies
        let license = srcinfo.get(libs, "license").unwrap();
        assert_eq!(license.as_list().unwrap(), ["GPL"]);

        // gcc declares its own depends; no fallback
        let gcc = srcinfo.name_section("gcc").unwrap();
        let depends = srcinfo.get(gcc, "depends").unwrap();
        assert_eq!(depends.as_list().unwrap(), ["gcc-libs"]);
    }

    #[test]
    fn test_empty_list_overrides_inheritance() {
        let srcinfo = parse(SPLIT_RECIPE).unwrap();
        let libs = srcinfo.name_section("gcc-libs").unwrap();

        // `provides =` pins an empty list in the section itself, so the
        // base-level `provides = cc` must not leak through
        let provides = srcinfo.get(libs, "provides").unwrap();
        assert_eq!(provides.as_list().unwrap(), &[] as &[String]);
    }

    #[test]
    fn test_list_values_append_in_order() {
        let srcinfo = parse(
            "pkgbase = x\n\tpkgver = 1\n\tpkgrel = 1\n\tlicense = MIT\n\tlicense = Apache\n",
        )
        .unwrap();
        let base = srcinfo.base_section().unwrap();
        assert_eq!(
            base.get("license").unwrap().as_list().unwrap(),
            ["MIT", "Apache"]
        );
    }

    #[test]
    fn test_arch_qualified_key() {
        let srcinfo = parse(
            "pkgbase = x\n\tarch = x86_64\n\tdepends_x86_64 = glibc\n\npkgname = x\n\tdepends_x86_64 = zlib\n",
        )
        .unwrap();
        let base = srcinfo.base_section().unwrap();
        assert_eq!(
            base.get("depends_x86_64").unwrap().as_list().unwrap(),
            ["glibc"]
        );
        // the name section inherits the effective arch list from the base
        let name = srcinfo.name_section("x").unwrap();
        assert_eq!(
            name.get("depends_x86_64").unwrap().as_list().unwrap(),
            ["zlib"]
        );
    }

    #[test]
    fn test_arch_qualified_key_without_arch_list() {
        let result = parse("pkgbase = x\n\tdepends_x86_64 = glibc\n");
        assert!(matches!(
            result,
            Err(SrcinfoError::UnknownKey { ref key, .. }) if key == "depends_x86_64"
        ));
    }

    #[test]
    fn test_arch_qualified_key_undeclared_arch() {
        let result = parse("pkgbase = x\n\tarch = x86_64\n\tdepends_aarch64 = glibc\n");
        assert!(matches!(result, Err(SrcinfoError::UnknownKey { .. })));
    }

    #[test]
    fn test_key_before_section() {
        let result = parse("foo = bar\n");
        assert!(matches!(
            result,
            Err(SrcinfoError::KeyBeforeSection { ref key, .. }) if key == "foo"
        ));
    }

    #[test]
    fn test_multiple_base_sections() {
        let result = parse("pkgbase = x\n\tpkgver = 1\npkgbase = y\n");
        assert!(matches!(result, Err(SrcinfoError::MultipleBase { .. })));
    }

    #[test]
    fn test_duplicate_section() {
        let result = parse("pkgbase = x\npkgname = y\npkgname = y\n");
        assert!(matches!(result, Err(SrcinfoError::DuplicateSection { .. })));
    }

    #[test]
    fn test_base_only_key_in_name_section() {
        let result = parse("pkgbase = x\npkgname = x\n\tpkgver = 2\n");
        assert!(matches!(
            result,
            Err(SrcinfoError::BaseOnlyKey { ref key, .. }) if key == "pkgver"
        ));
    }

    #[test]
    fn test_repeated_single_valued_key() {
        let result = parse("pkgbase = x\n\tpkgdesc = one\n\tpkgdesc = two\n");
        assert!(matches!(
            result,
            Err(SrcinfoError::RepeatedKey { ref key, .. }) if key == "pkgdesc"
        ));
    }

    #[test]
    fn test_unknown_key() {
        let result = parse("pkgbase = x\n\tfrobnicate = yes\n");
        assert!(matches!(result, Err(SrcinfoError::UnknownKey { .. })));
    }

    #[test]
    fn test_malformed_line() {
        let result = parse("pkgbase = x\n\tnot a key value line\n");
        assert!(matches!(result, Err(SrcinfoError::MalformedLine { .. })));
    }

    #[test]
    fn test_error_names_the_recipe() {
        let err = parse("foo = bar\n").unwrap_err();
        assert!(err.to_string().contains("/tmp/nano/PKGBUILD"));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let srcinfo = parse("\n# comment\n   # indented comment\npkgbase = x\n\n").unwrap();
        assert_eq!(srcinfo.pkgbase(), Some("x"));
    }
}
