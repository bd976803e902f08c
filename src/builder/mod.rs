//! The build half of the recipe.
//!
//! This module drives the external build tool and shapes the installed tree.

pub mod cmake;
pub mod layout;

pub use cmake::{
    BuildError, BuildHandle, BuildOrchestrator, BuildPhase, BuildSettings, BuildTool, BuildType,
    BuildVariables, CMakeTool,
};
pub use layout::{finalize, LayoutReport};
