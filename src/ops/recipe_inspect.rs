//! Implementation of `pkgrecipe inspect`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use semver::Version;
use serde::Serialize;

use crate::core::options::OptionSet;
use crate::core::recipe::{
    requirements, PackageRequirement, RecipeMetadata, EXPORT_SOURCES, METADATA,
};
use crate::ops::resolve::{load_identity, resolve_options};
use crate::util::GlobalContext;

/// Everything the recipe publishes about itself before building.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub name: String,
    pub version: Version,
    pub description: String,
    #[serde(flatten)]
    pub metadata: RecipeMetadata,
    pub options: OptionSet,
    pub requirements: Vec<PackageRequirement>,
    pub exports_sources: &'static [&'static str],
}

pub fn inspect(ctx: &GlobalContext, overrides: &[String]) -> Result<RecipeSummary> {
    let options = resolve_options(ctx.config(), overrides)?;
    let manifest_path = ctx.manifest_path();
    let manifest = load_identity(ctx)?.manifest().with_context(|| {
        format!(
            "failed to read project identity from {}",
            manifest_path.display()
        )
    })?;

    Ok(RecipeSummary {
        name: manifest.name,
        version: manifest.version,
        description: manifest.description,
        metadata: METADATA,
        requirements: requirements(&options),
        options,
        exports_sources: EXPORT_SOURCES,
    })
}

/// Human-readable rendering of a summary.
pub fn format_summary(summary: &RecipeSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", summary.name, summary.version);
    let _ = writeln!(out, "{}", summary.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "license:  {}", summary.metadata.license);
    let _ = writeln!(out, "author:   {}", summary.metadata.author);
    let _ = writeln!(out, "homepage: {}", summary.metadata.homepage);
    let _ = writeln!(out, "topics:   {}", summary.metadata.topics.join(", "));
    let _ = writeln!(out, "settings: {}", summary.metadata.settings.join(", "));

    let _ = writeln!(out, "\noptions:");
    for (key, value) in summary.options.iter() {
        let marker = if value == OptionSet::default().get(key) {
            ""
        } else {
            " (overridden)"
        };
        let _ = writeln!(
            out,
            "  {:<20} {:<5}  {}{}",
            key.as_str(),
            value,
            key.help(),
            marker
        );
    }

    let _ = writeln!(out, "\nrequires:");
    for req in &summary.requirements {
        if req.transitive_headers {
            let _ = writeln!(out, "  {} (transitive headers)", req);
        } else {
            let _ = writeln!(out, "  {}", req);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CMAKELISTS: &str = r#"cmake_minimum_required(VERSION 3.22)
project(dice-copperr
        VERSION 0.7.1
        DESCRIPTION "Persistent memory allocator for DICE.")
"#;

    fn recipe(manifest: &str) -> (TempDir, GlobalContext) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("CMakeLists.txt"), manifest).unwrap();
        let ctx = GlobalContext::with_root(tmp.path().to_path_buf());
        (tmp, ctx)
    }

    #[test]
    fn test_inspect_reads_identity_and_defaults() {
        let (_tmp, ctx) = recipe(CMAKELISTS);
        let summary = inspect(&ctx, &[]).unwrap();

        assert_eq!(summary.name, "dice-copperr");
        assert_eq!(summary.version, Version::new(0, 7, 1));
        assert_eq!(summary.description, "Persistent memory allocator for DICE.");
        assert_eq!(summary.options, OptionSet::default());
        assert_eq!(summary.requirements.len(), 1);
    }

    #[test]
    fn test_inspect_with_test_deps_adds_gtest() {
        let (_tmp, ctx) = recipe(CMAKELISTS);
        let summary = inspect(&ctx, &["with_test_deps=True".to_string()]).unwrap();

        let names: Vec<_> = summary.requirements.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, ["boost/1.83.0", "gtest/1.14.0"]);
        assert!(format_summary(&summary).contains("(overridden)"));
    }

    #[test]
    fn test_inspect_json_shape() {
        let (_tmp, ctx) = recipe(CMAKELISTS);
        let json = serde_json::to_value(inspect(&ctx, &[]).unwrap()).unwrap();

        assert_eq!(json["version"], "0.7.1");
        assert_eq!(json["license"], "MIT/Apache");
        assert_eq!(json["options"]["fPIC"], true);
        assert_eq!(json["requirements"][0]["name"], "boost");
    }

    #[test]
    fn test_inspect_missing_description() {
        let (_tmp, ctx) = recipe("project(dice-copperr VERSION 0.7.1)");
        let err = inspect(&ctx, &[]).unwrap_err();
        assert!(err
            .chain()
            .any(|cause| cause.to_string().contains("DESCRIPTION")));
    }
}
