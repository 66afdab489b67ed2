//! Module workspace management.
//!
//! Every module lives under a shared modules root:
//!
//! ```text
//! <modules root>/
//! ├── <module>.so          # Compiled module, written by the generator's install step
//! └── <module>/
//!     ├── models/          # One <model>.nestml file per submitted model
//!     └── module/          # Generator output
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the per-module directory holding model sources.
pub const SOURCE_DIR_NAME: &str = "models";

/// Name of the per-module directory holding generator output.
pub const BUILD_DIR_NAME: &str = "module";

/// Directories owned by a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDirs {
    /// `<root>/<module>`
    pub module_dir: PathBuf,

    /// `<root>/<module>/models`
    pub source_dir: PathBuf,

    /// `<root>/<module>/module`
    pub build_dir: PathBuf,
}

impl ModuleDirs {
    /// Compose the directory paths for a module. Performs no IO.
    pub fn new(root: &Path, module_name: &str) -> Self {
        let module_dir = root.join(module_name);
        Self {
            source_dir: module_dir.join(SOURCE_DIR_NAME),
            build_dir: module_dir.join(BUILD_DIR_NAME),
            module_dir,
        }
    }
}

/// Outcome of a best-effort directory clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearReport {
    /// Entries removed.
    pub removed: usize,

    /// Entries that could not be removed.
    pub failures: usize,
}

impl ClearReport {
    fn merge(&mut self, other: ClearReport) {
        self.removed += other.removed;
        self.failures += other.failures;
    }
}

/// The shared directory all modules are stored under.
#[derive(Debug, Clone)]
pub struct ModulesRoot {
    root: PathBuf,
}

impl ModulesRoot {
    /// Wrap a root path. Performs no IO.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// The root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a module's own directory.
    pub fn module_path(&self, module_name: &str) -> PathBuf {
        self.root.join(module_name)
    }

    /// Source and build directories of a module.
    pub fn module_dirs(&self, module_name: &str) -> ModuleDirs {
        ModuleDirs::new(&self.root, module_name)
    }

    /// Path of the compiled module library installed for `module_name`.
    pub fn artifact_path(&self, module_name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", module_name, std::env::consts::DLL_EXTENSION))
    }

    /// Create a module's directories and clear everything inside them.
    ///
    /// Entries that cannot be deleted are logged and counted in the
    /// returned report; they never fail the reset.
    ///
    /// # Errors
    /// Returns an error if the module name is not a valid identifier or the
    /// directories cannot be created or listed.
    pub fn reset_module(&self, module_name: &str) -> Result<(ModuleDirs, ClearReport)> {
        validate_module_name(module_name)?;

        let dirs = self.module_dirs(module_name);
        let mut report = ClearReport::default();

        for dir in [&dirs.source_dir, &dirs.build_dir] {
            fs::create_dir_all(dir)?;
            report.merge(clear_dir(dir)?);
        }

        tracing::debug!(
            "Reset module '{}' ({} entries removed, {} failures)",
            module_name,
            report.removed,
            report.failures
        );

        Ok((dirs, report))
    }
}

/// Remove every entry inside `path`, keeping `path` itself.
///
/// Files and symlinks are unlinked, subdirectories removed recursively.
/// Per-entry failures are logged and skipped.
pub fn clear_dir(path: &Path) -> Result<ClearReport> {
    let mut report = ClearReport::default();

    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry in {}: {}", path.display(), e);
                report.failures += 1;
                continue;
            }
        };

        let entry_path = entry.path();
        // file_type() does not follow symlinks, so a link to a directory is unlinked
        let removed = match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => fs::remove_dir_all(&entry_path),
            Ok(_) => fs::remove_file(&entry_path),
            Err(e) => Err(e),
        };

        match removed {
            Ok(()) => report.removed += 1,
            Err(e) => {
                tracing::warn!("Failed to delete {}. Reason: {}", entry_path.display(), e);
                report.failures += 1;
            }
        }
    }

    Ok(report)
}

/// Whether `name` is a plain identifier: ASCII letters, digits and `_`,
/// not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject module names that are not safe to use as a directory name.
pub fn validate_module_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidModuleName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_module_dirs() {
        let dirs = ModuleDirs::new(Path::new("/tmp/modules"), "mymodule");
        assert_eq!(dirs.module_dir, PathBuf::from("/tmp/modules/mymodule"));
        assert_eq!(dirs.source_dir, PathBuf::from("/tmp/modules/mymodule/models"));
        assert_eq!(dirs.build_dir, PathBuf::from("/tmp/modules/mymodule/module"));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = ModulesRoot::new(temp.path().join("modules"));

        for _ in 0..2 {
            let (dirs, report) = root.reset_module("fresh").expect("Failed to reset");
            assert_eq!(report.failures, 0);
            assert!(dirs.source_dir.is_dir());
            assert!(dirs.build_dir.is_dir());
            assert_eq!(fs::read_dir(&dirs.source_dir).unwrap().count(), 0);
            assert_eq!(fs::read_dir(&dirs.build_dir).unwrap().count(), 0);
        }
    }

    #[test]
    fn test_reset_clears_files_and_subdirectories() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = ModulesRoot::new(temp.path());

        let (dirs, _) = root.reset_module("m").unwrap();
        fs::write(dirs.source_dir.join("a.nestml"), "x").unwrap();
        fs::create_dir_all(dirs.build_dir.join("nested/deeper")).unwrap();
        fs::write(dirs.build_dir.join("nested/deeper/b.cpp"), "y").unwrap();

        let (dirs, report) = root.reset_module("m").unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(fs::read_dir(&dirs.source_dir).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&dirs.build_dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_reset_unlinks_symlink_without_following() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = ModulesRoot::new(temp.path().join("modules"));
        let outside = temp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("keep.txt"), "keep").unwrap();

        let (dirs, _) = root.reset_module("m").unwrap();
        std::os::unix::fs::symlink(&outside, dirs.build_dir.join("link")).unwrap();

        root.reset_module("m").unwrap();
        assert!(outside.join("keep.txt").exists());
        assert_eq!(fs::read_dir(&dirs.build_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_rejects_path_like_names() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = ModulesRoot::new(temp.path());
        assert!(matches!(
            root.reset_module("../escape"),
            Err(Error::InvalidModuleName(_))
        ));
    }

    #[test]
    fn test_artifact_path() {
        let root = ModulesRoot::new("/opt/modules");
        let path = root.artifact_path("nestmlmodule");
        assert_eq!(
            path.extension().and_then(|e| e.to_str()),
            Some(std::env::consts::DLL_EXTENSION)
        );
        assert!(path.starts_with("/opt/modules"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("iaf_psc_alpha"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2cells"));
        assert!(!is_identifier("iaf.alpha"));
        assert!(!is_identifier("a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_reset_survives_undeletable_entry() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = ModulesRoot::new(temp.path());
        let (dirs, _) = root.reset_module("mymodule").unwrap();

        // A read-only directory whose child cannot be unlinked
        let locked = dirs.source_dir.join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("stuck.nestml"), "").unwrap();
        fs::write(dirs.source_dir.join("iaf.nestml"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits are not enforced for root
        if fs::write(locked.join("writable_check"), "").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            eprintln!("Skipping: permissions not enforced for this user");
            return;
        }

        let result = root.reset_module("mymodule");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let (dirs, report) = result.expect("reset must not fail on a stuck entry");
        assert_eq!(report.failures, 1);
        assert_eq!(report.removed, 1);
        assert!(!dirs.source_dir.join("iaf.nestml").exists());
        assert!(locked.join("stuck.nestml").exists());
    }
}
