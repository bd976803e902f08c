//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use walkdir::WalkDir;

/// Remove a directory tree. Returns `false` if there was nothing to remove.
///
/// Only a missing path is tolerated; permission and other I/O errors
/// propagate.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove directory: {}", path.display()))
        }
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Find files matching glob patterns relative to a base directory.
///
/// The base is matched literally, so directory names containing `[`, `*`
/// or `?` are safe. A directory that cannot be read while matching is an
/// error.
pub fn glob_files(base: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let escaped_base = PathBuf::from(Pattern::escape(&base.to_string_lossy()));
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = escaped_base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            let path = entry.with_context(|| {
                format!("failed to match `{}` under {}", pattern, base.display())
            })?;
            if path.is_file() {
                results.push(path);
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Copy `files` (all under `base`) into `dest`, keeping their paths relative
/// to `base`. Returns the destination paths.
pub fn copy_relative(base: &Path, files: &[PathBuf], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let target = dest.join(relative_path(base, file));
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(file, &target).with_context(|| {
            format!("failed to copy {} to {}", file.display(), target.display())
        })?;
        copied.push(target);
    }
    Ok(copied)
}

/// All regular files below `root`, sorted.
pub fn files_under(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
