//! Global context for recipe operations.
//!
//! Provides centralized access to the recipe root, configuration and the
//! default output locations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::Diagnostic;
use thiserror::Error;

use crate::core::manifest::declares_project;
use crate::util::config::{global_config_dir, load_config, Config};

/// The upstream build description the recipe reads identity from.
pub const MANIFEST_NAME: &str = "CMakeLists.txt";

/// Project-local directory for configuration.
pub const PROJECT_DIR_NAME: &str = ".pkgrecipe";

/// No recipe root above the working directory.
#[derive(Debug, Error, Diagnostic)]
#[error("could not find `CMakeLists.txt` in `{}` or any parent directory", .dir.display())]
#[diagnostic(
    code(pkgrecipe::context::no_manifest),
    help("run pkgrecipe from the source tree of the library, or pass --source-dir")
)]
pub struct ManifestNotFound {
    pub dir: PathBuf,
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Directory containing the upstream `CMakeLists.txt`
    root: PathBuf,

    /// Merged global + project configuration
    config: Config,
}

impl GlobalContext {
    /// Locate the recipe root from the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::discover(&cwd)
    }

    /// Locate the recipe root starting at `start` and searching upward.
    pub fn discover(start: &Path) -> Result<Self> {
        let root = find_recipe_root(start)?;
        Ok(Self::with_root(root))
    }

    /// Use `root` as the recipe root without searching.
    pub fn with_root(root: PathBuf) -> Self {
        let global_config = global_config_dir().map(|home| home.join("config.toml"));
        let config = load_config(
            global_config.as_deref(),
            &root.join(PROJECT_DIR_NAME).join("config.toml"),
        );

        tracing::debug!("recipe root: {}", root.display());

        GlobalContext { root, config }
    }

    /// Get the recipe root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the upstream manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    /// Build tree: `[build] build_dir` or `<root>/build`.
    pub fn build_dir(&self) -> PathBuf {
        self.resolve_dir(self.config.build.build_dir.as_deref(), "build")
    }

    /// Package folder: `[build] package_dir` or `<root>/package`.
    pub fn package_dir(&self) -> PathBuf {
        self.resolve_dir(self.config.build.package_dir.as_deref(), "package")
    }

    /// Default export folder.
    pub fn export_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME).join("export")
    }

    fn resolve_dir(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        match configured {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.root.join(dir),
            None => self.root.join(default),
        }
    }
}

/// Walk up from `start` to the recipe root.
///
/// The root is the nearest directory whose `CMakeLists.txt` declares a
/// `project(...)`, so subdirectory build files under `libs/` are skipped. If
/// no ancestor declares one, the nearest `CMakeLists.txt` is used and parsing
/// reports the missing declaration.
pub fn find_recipe_root(start: &Path) -> Result<PathBuf, ManifestNotFound> {
    let mut nearest = None;
    for dir in start.ancestors() {
        let manifest = dir.join(MANIFEST_NAME);
        if !manifest.is_file() {
            continue;
        }
        match std::fs::read_to_string(&manifest) {
            Ok(text) if declares_project(&text) => return Ok(dir.to_path_buf()),
            Ok(_) => tracing::debug!("skipping {}: no project() call", manifest.display()),
            Err(e) => tracing::debug!("skipping {}: {}", manifest.display(), e),
        }
        nearest.get_or_insert_with(|| dir.to_path_buf());
    }

    nearest.ok_or_else(|| ManifestNotFound {
        dir: start.to_path_buf(),
    })
}
