//! Post-install layout of the package folder.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::util::fs::{copy_relative, ensure_dir, glob_files, remove_dir_all_if_exists};

/// Directories produced by the upstream install that the package must not ship.
pub const PRUNED_DIRS: [&str; 2] = ["cmake", "share"];

/// License files copied from the source root.
pub const LICENSE_PATTERN: &str = "LICENSE*";

/// Subdirectory of the package root that receives the license files.
pub const LICENSES_DIR: &str = "licenses";

/// What [`finalize`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub removed: Vec<PathBuf>,
    pub licenses: Vec<PathBuf>,
}

/// Prune install leftovers and place license files.
///
/// Missing directories and an absence of license files are fine. Any other
/// I/O error aborts.
pub fn finalize(package_root: &Path, source_root: &Path) -> Result<LayoutReport> {
    let mut report = LayoutReport::default();

    for dir in PRUNED_DIRS {
        let path = package_root.join(dir);
        if remove_dir_all_if_exists(&path)? {
            tracing::debug!("removed {}", path.display());
            report.removed.push(path);
        }
    }

    let licenses = glob_files(source_root, &[LICENSE_PATTERN])?;
    if licenses.is_empty() {
        tracing::warn!("no {} files in {}", LICENSE_PATTERN, source_root.display());
    } else {
        let dest = package_root.join(LICENSES_DIR);
        ensure_dir(&dest)?;
        report.licenses = copy_relative(source_root, &licenses, &dest)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_finalize_prunes_and_copies_licenses() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        let package = tmp.path().join("package");

        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("LICENSE-MIT"), "mit").unwrap();
        fs::write(source.join("LICENSE-APACHE"), "apache").unwrap();
        fs::write(source.join("NOTICE"), "notice").unwrap();

        fs::create_dir_all(package.join("cmake/copperr")).unwrap();
        fs::create_dir_all(package.join("share/doc")).unwrap();
        fs::create_dir_all(package.join("include/copperr")).unwrap();

        let report = finalize(&package, &source).unwrap();

        assert!(!package.join("cmake").exists());
        assert!(!package.join("share").exists());
        assert!(package.join("include/copperr").exists());
        assert_eq!(report.removed.len(), 2);

        assert_eq!(
            fs::read_to_string(package.join("licenses/LICENSE-MIT")).unwrap(),
            "mit"
        );
        assert!(package.join("licenses/LICENSE-APACHE").exists());
        assert!(!package.join("licenses/NOTICE").exists());
        assert_eq!(report.licenses.len(), 2);
    }

    #[test]
    fn test_finalize_tolerates_missing_paths() {
        let tmp = TempDir::new().unwrap();
        let package = tmp.path().join("package");
        fs::create_dir_all(&package).unwrap();

        let report = finalize(&package, tmp.path()).unwrap();
        assert_eq!(report, LayoutReport::default());
        assert!(!package.join("licenses").exists());

        // Idempotent
        assert_eq!(finalize(&package, tmp.path()).unwrap(), LayoutReport::default());
    }

    #[test]
    fn test_finalize_copies_licenses_from_bracketed_root() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("metall[v2]");
        let package = tmp.path().join("package");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&package).unwrap();
        fs::write(source.join("LICENSE-MIT"), "mit").unwrap();

        let report = finalize(&package, &source).unwrap();
        assert_eq!(report.licenses, vec![package.join("licenses/LICENSE-MIT")]);
    }

    #[test]
    fn test_finalize_fails_when_licenses_cannot_be_placed() {
        let tmp = TempDir::new().unwrap();
        let package = tmp.path().join("package");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join(LICENSES_DIR), "not a directory").unwrap();
        fs::write(tmp.path().join("LICENSE"), "mit").unwrap();

        let err = finalize(&package, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("failed to create directory"));
    }
}
