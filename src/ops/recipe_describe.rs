//! Implementation of `pkgrecipe describe`.
//!
//! Produces the component graph consumers link against. Only the project
//! name is read from the manifest; version and description are never parsed.

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::core::component::PackageDescriptor;
use crate::ops::resolve::{load_identity, resolve_options};
use crate::util::GlobalContext;

pub fn describe(ctx: &GlobalContext, overrides: &[String]) -> Result<PackageDescriptor> {
    let options = resolve_options(ctx.config(), overrides)?;

    let manifest_path = ctx.manifest_path();
    let mut identity = load_identity(ctx)?;
    let name = identity.name().with_context(|| {
        format!(
            "failed to read project name from {}",
            manifest_path.display()
        )
    })?;

    PackageDescriptor::build(name, &options)
        .with_context(|| format!("failed to build component graph for `{}`", name))
}

/// Render the descriptor as a tree, dependencies first.
pub fn format_tree(descriptor: &PackageDescriptor) -> Result<String> {
    let order = descriptor.topological_order()?;
    let mut out = String::new();
    let _ = writeln!(out, "{}", descriptor.package_name);

    for (i, id) in order.iter().enumerate() {
        let Some(component) = descriptor.get(*id) else {
            continue;
        };
        let last = i + 1 == order.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(
            out,
            "{}{} ({})",
            branch,
            id,
            id.cmake_target(&descriptor.package_name)
        );

        for dir in &component.include_dirs {
            let _ = writeln!(out, "{}include: {}", indent, dir.display());
        }
        for dir in &component.lib_dirs {
            let _ = writeln!(out, "{}libdir:  {}", indent, dir.display());
        }
        if !component.libs.is_empty() {
            let _ = writeln!(out, "{}libs:    {}", indent, component.libs.join(", "));
        }
        if !component.requires.is_empty() {
            let requires: Vec<String> = component.requires.iter().map(|r| r.to_string()).collect();
            let _ = writeln!(out, "{}requires: {}", indent, requires.join(", "));
        }
    }

    Ok(out)
}
