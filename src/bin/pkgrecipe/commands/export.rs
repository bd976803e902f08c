//! `pkgrecipe export` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ExportArgs;
use pkgrecipe::ops::recipe_export::export_sources;
use pkgrecipe::util::{Shell, Status};

pub fn execute(args: ExportArgs, source_dir: Option<PathBuf>, shell: &Shell) -> Result<()> {
    let ctx = super::context(source_dir)?;

    let dest = match args.dest {
        Some(dir) => std::path::absolute(&dir)
            .with_context(|| format!("invalid export directory: {}", dir.display()))?,
        None => ctx.export_dir(),
    };

    let result = export_sources(ctx.root(), &dest)?;
    shell.status(
        Status::Exported,
        format!("{} files to {}", result.files.len(), result.dest.display()),
    );

    Ok(())
}
