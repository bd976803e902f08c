//! High-level operations.
//!
//! This module contains the implementation of pkgrecipe commands.

pub mod recipe_describe;
pub mod recipe_export;
pub mod recipe_inspect;
pub mod recipe_package;
pub mod resolve;

pub use recipe_describe::{describe, format_tree};
pub use recipe_export::{export_sources, ExportResult};
pub use recipe_inspect::{format_summary, inspect, RecipeSummary};
pub use recipe_package::{
    package, package_with, PackageInfo, PackageOptions, PackageResult, PACKAGE_INFO_FILE,
};
pub use resolve::{collect_overrides, load_identity, resolve_options};
