//! pkgrecipe - packaging recipe for a CMake-built C++ library
//!
//! This crate derives the package identity from the upstream
//! `CMakeLists.txt`, resolves the recipe options, drives the CMake build
//! and describes the installed components to consumers.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use core::{component::PackageDescriptor, manifest::ProjectIdentity, options::OptionSet};

pub use util::context::GlobalContext;
