//! Implementation of `pkgrecipe export`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::recipe::EXPORT_SOURCES;
use crate::util::fs::{copy_relative, ensure_dir, glob_files, relative_path};

/// Files copied by an export, relative to the recipe root.
#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub dest: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Copy the recipe's source files into `export_dir`.
///
/// Patterns that match nothing are skipped. Files keep their path relative to
/// `recipe_root`.
pub fn export_sources(recipe_root: &Path, export_dir: &Path) -> Result<ExportResult> {
    let files = glob_files(recipe_root, EXPORT_SOURCES)?;
    if files.is_empty() {
        tracing::warn!("no source files to export in {}", recipe_root.display());
    }

    ensure_dir(export_dir)?;
    copy_relative(recipe_root, &files, export_dir)
        .with_context(|| format!("failed to export sources to {}", export_dir.display()))?;
    tracing::debug!("exported {} files to {}", files.len(), export_dir.display());

    Ok(ExportResult {
        dest: export_dir.to_path_buf(),
        files: files.iter().map(|f| relative_path(recipe_root, f)).collect(),
    })
}
