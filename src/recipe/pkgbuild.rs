// src/recipe/pkgbuild.rs

//! Recipe handles and .SRCINFO loading
//!
//! A [`Pkgbuild`] identifies one build recipe on disk. Metadata is never
//! read from the recipe script itself; it comes from the `.SRCINFO` sidecar,
//! which is reused when fresh and regenerated with `makepkg --printsrcinfo`
//! when the recipe is newer.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use tracing::{debug, info};

use super::srcinfo::Srcinfo;
use crate::config::Config;
use crate::error::{Error, Result};

/// One build recipe on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkgbuild {
    base_dir: PathBuf,
    recipe_file: PathBuf,
}

impl fmt::Display for Pkgbuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.recipe_file.display())
    }
}

impl Pkgbuild {
    /// Create a handle for the recipe at `recipe_file` under `base_dir`.
    pub fn from_path(base_dir: impl Into<PathBuf>, recipe_file: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            recipe_file: recipe_file.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn recipe_file(&self) -> &Path {
        &self.recipe_file
    }

    /// Directory `makepkg` runs in.
    fn recipe_dir(&self) -> &Path {
        self.recipe_file.parent().unwrap_or(&self.base_dir)
    }

    /// Path of the `.SRCINFO` sidecar next to the recipe.
    pub fn srcinfo_path(&self) -> PathBuf {
        self.recipe_dir().join(".SRCINFO")
    }

    /// Build the makepkg command line for this recipe.
    fn makepkg_args(&self, args: &[&str], config: &Config) -> Vec<OsString> {
        let mut cmdline: Vec<OsString> = Vec::new();
        if let Some(conf) = &config.makepkg_conf {
            cmdline.push("--config".into());
            cmdline.push(conf.into());
        }
        if let Some(file_name) = self.recipe_file.file_name() {
            if file_name != OsStr::new("PKGBUILD") {
                // makepkg is invoked from the recipe directory, so the bare
                // file name is enough
                cmdline.push("-p".into());
                cmdline.push(file_name.into());
            }
        }
        cmdline.extend(args.iter().map(OsString::from));
        cmdline
    }

    /// Run `makepkg` for this recipe and capture its stdout.
    pub fn run_makepkg(&self, args: &[&str], config: &Config) -> Result<String> {
        let cmdline = self.makepkg_args(args, config);
        debug!("running makepkg {:?} for {}", args, self);

        let output = Command::new("makepkg")
            .args(&cmdline)
            .current_dir(self.recipe_dir())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::CommandError(format!("failed to run makepkg for {self}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandError(format!(
                "makepkg {} failed for {self}: {stderr}",
                args.join(" ")
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            Error::CommandError(format!("makepkg produced invalid UTF-8 for {self}: {e}"))
        })
    }

    /// Load this recipe's metadata, regenerating the `.SRCINFO` sidecar if
    /// it is missing or older than the recipe.
    pub fn load_srcinfo(&self, config: &Config) -> Result<Srcinfo> {
        let srcinfo_file = self.srcinfo_path();

        let text = if self.srcinfo_is_fresh(&srcinfo_file) {
            debug!("reusing cached .SRCINFO for {}", self);
            fs::read_to_string(&srcinfo_file).map_err(|e| {
                Error::IoError(format!("failed to read {}: {e}", srcinfo_file.display()))
            })?
        } else {
            info!("regenerating .SRCINFO for {}", self);
            let text = self.run_makepkg(&["--printsrcinfo"], config)?;
            fs::write(&srcinfo_file, &text).map_err(|e| {
                Error::IoError(format!("failed to write {}: {e}", srcinfo_file.display()))
            })?;
            text
        };

        Ok(Srcinfo::from_str(&text, self)?)
    }

    /// A cached `.SRCINFO` is usable when it is at least as new as the
    /// recipe file.
    fn srcinfo_is_fresh(&self, srcinfo_file: &Path) -> bool {
        fn mtime(path: &Path) -> Option<SystemTime> {
            fs::metadata(path).and_then(|m| m.modified()).ok()
        }
        match (mtime(srcinfo_file), mtime(&self.recipe_file)) {
            (Some(cached), Some(recipe)) => cached >= recipe,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRCINFO: &str = "pkgbase = hello\n\tpkgver = 1.0\n\tpkgrel = 1\n\npkgname = hello\n";

    #[test]
    fn test_display_is_recipe_path() {
        let pkgbuild = Pkgbuild::from_path("/srv/abs/hello", "/srv/abs/hello/PKGBUILD");
        assert_eq!(pkgbuild.to_string(), "/srv/abs/hello/PKGBUILD");
    }

    #[test]
    fn test_srcinfo_path_is_sibling() {
        let pkgbuild = Pkgbuild::from_path("/srv/abs/hello", "/srv/abs/hello/PKGBUILD");
        assert_eq!(
            pkgbuild.srcinfo_path(),
            PathBuf::from("/srv/abs/hello/.SRCINFO")
        );
    }

    #[test]
    fn test_makepkg_args_default() {
        let pkgbuild = Pkgbuild::from_path("/srv/abs/hello", "/srv/abs/hello/PKGBUILD");
        let args = pkgbuild.makepkg_args(&["--printsrcinfo"], &Config::default());
        assert_eq!(args, vec![OsString::from("--printsrcinfo")]);
    }

    #[test]
    fn test_makepkg_args_custom_recipe_file() {
        let pkgbuild = Pkgbuild::from_path("/srv/abs/hello", "/srv/abs/hello/PKGBUILD.vcs");
        let config = Config {
            makepkg_conf: Some(PathBuf::from("/etc/custom-makepkg.conf")),
            ..Config::default()
        };

        let args = pkgbuild.makepkg_args(&["--printsrcinfo"], &config);
        assert_eq!(
            args,
            vec![
                OsString::from("--config"),
                OsString::from("/etc/custom-makepkg.conf"),
                OsString::from("-p"),
                OsString::from("PKGBUILD.vcs"),
                OsString::from("--printsrcinfo"),
            ]
        );
    }

    #[test]
    fn test_load_srcinfo_reuses_fresh_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let recipe_file = dir.path().join("PKGBUILD");
        fs::write(&recipe_file, "pkgname=hello\n").unwrap();
        // written after the recipe, so at least as new
        fs::write(dir.path().join(".SRCINFO"), SRCINFO).unwrap();

        let pkgbuild = Pkgbuild::from_path(dir.path(), &recipe_file);
        let srcinfo = pkgbuild.load_srcinfo(&Config::default()).unwrap();
        assert_eq!(srcinfo.pkgbase(), Some("hello"));
        assert_eq!(srcinfo.pkgnames(), ["hello"]);
    }

    #[test]
    fn test_stale_sidecar_is_not_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let srcinfo_file = dir.path().join(".SRCINFO");
        fs::write(&srcinfo_file, SRCINFO).unwrap();
        let recipe_file = dir.path().join("PKGBUILD");
        fs::write(&recipe_file, "pkgname=hello\n").unwrap();

        // push the recipe mtime well past the sidecar's
        let future = SystemTime::now() + std::time::Duration::from_secs(60);
        let file = fs::File::options().append(true).open(&recipe_file).unwrap();
        file.set_modified(future).unwrap();

        let pkgbuild = Pkgbuild::from_path(dir.path(), &recipe_file);
        assert!(!pkgbuild.srcinfo_is_fresh(&srcinfo_file));
    }
}
