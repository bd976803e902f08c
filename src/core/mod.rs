//! Core data structures for pkgrecipe.
//!
//! This module contains the recipe's own derivation logic:
//! - Project identity parsed from `CMakeLists.txt`
//! - Option sets and override resolution
//! - The component graph published to the dependency manager
//! - Static recipe metadata and requirements

pub mod component;
pub mod manifest;
pub mod options;
pub mod recipe;

pub use component::{
    Component, ComponentGraphError, ComponentId, PackageDescriptor, Requirement, BOOST_HEADERS,
};
pub use manifest::{LookupState, Manifest, ManifestParseError, ProjectIdentity};
pub use options::{
    parse_override, InvalidOptionError, OptionKey, OptionOverrides, OptionSet, OptionValue,
};
pub use recipe::{requirements, PackageRequirement, RecipeMetadata, EXPORT_SOURCES, METADATA};
