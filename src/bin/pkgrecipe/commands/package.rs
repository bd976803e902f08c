//! `pkgrecipe package` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::PackageArgs;
use pkgrecipe::ops::recipe_package::{package, PackageOptions};
use pkgrecipe::util::Shell;

pub fn execute(args: PackageArgs, source_dir: Option<PathBuf>, shell: &Shell) -> Result<()> {
    let ctx = super::context(source_dir)?;

    // Relative to where the user ran the command, not the recipe root
    let package_dir = args
        .package_dir
        .map(|dir| {
            std::path::absolute(&dir)
                .with_context(|| format!("invalid package directory: {}", dir.display()))
        })
        .transpose()?;

    let opts = PackageOptions {
        overrides: args.options.options,
        build_type: args.build_type,
        jobs: args.jobs,
        package_dir,
    };

    let result = package(&ctx, &opts, shell)?;
    tracing::debug!("wrote {}", result.info_path.display());

    Ok(())
}
