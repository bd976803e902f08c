//! Configuration file support for pkgrecipe.
//!
//! Two configuration file locations are read:
//! - Global: `~/.pkgrecipe/config.toml` - User-wide defaults
//! - Project: `.pkgrecipe/config.toml` - Recipe-specific overrides
//!
//! Project config takes precedence over global config. Option values in
//! `[options]` are applied before any `-o key=value` given on the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::cmake::BuildType;
use crate::core::options::{OptionOverrides, OptionValue};

/// pkgrecipe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Option overrides, checked when the option set is resolved
    pub options: toml::Table,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// CMake build type (default: Release)
    pub build_type: Option<BuildType>,

    /// CMake generator, e.g. "Ninja"
    pub generator: Option<String>,

    /// Parallel jobs passed to `cmake --build`
    pub jobs: Option<usize>,

    /// Explicit path to the cmake executable
    pub cmake: Option<PathBuf>,

    /// Build tree location, relative to the recipe root
    pub build_dir: Option<PathBuf>,

    /// Package (install) folder, relative to the recipe root
    pub package_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.build_type.is_some() {
            self.build.build_type = other.build.build_type;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.cmake.is_some() {
            self.build.cmake = other.build.cmake;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }
        if other.build.package_dir.is_some() {
            self.build.package_dir = other.build.package_dir;
        }

        // Per key, so a project can flip one option without restating the rest
        self.options.extend(other.options);
    }

    /// `[options]` as overrides. Values are type-checked at resolution.
    pub fn option_overrides(&self) -> OptionOverrides {
        self.options
            .iter()
            .map(|(key, value)| (key.clone(), OptionValue::from(value)))
            .collect()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.pkgrecipe/config.toml)
/// 2. Global config (~/.pkgrecipe/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global pkgrecipe config directory (~/.pkgrecipe).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".pkgrecipe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.build_type.is_none());
        assert!(config.build.cmake.is_none());
        assert!(config.options.is_empty());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
build_type = "Debug"
generator = "Ninja"
jobs = 8

[options]
build_ffi = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.build_type, Some(BuildType::Debug));
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.build.jobs, Some(8));

        let overrides = config.option_overrides();
        assert_eq!(overrides["build_ffi"], OptionValue::Bool(true));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.build.jobs = Some(4);
        base.build.generator = Some("Unix Makefiles".to_string());
        base.options
            .insert("build_ffi".into(), toml::Value::Boolean(true));
        base.options
            .insert("shared".into(), toml::Value::Boolean(true));

        let mut project = Config::default();
        project.build.generator = Some("Ninja".to_string());
        project
            .options
            .insert("shared".into(), toml::Value::Boolean(false));

        base.merge(project);

        assert_eq!(base.build.jobs, Some(4));
        assert_eq!(base.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(base.options["build_ffi"], toml::Value::Boolean(true));
        assert_eq!(base.options["shared"], toml::Value::Boolean(false));
    }

    #[test]
    fn test_load_config_layers_project_over_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[build]\njobs = 2\nbuild_type = \"Debug\"\n").unwrap();
        std::fs::write(&project, "[build]\nbuild_type = \"Release\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.build.jobs, Some(2));
        assert_eq!(config.build.build_type, Some(BuildType::Release));

        let config = load_config(None, &tmp.path().join("missing.toml"));
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\njobs = ").unwrap();

        let config = Config::load_or_default(&path);
        assert!(config.build.jobs.is_none());
    }
}
