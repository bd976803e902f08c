//! `pkgrecipe inspect` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::InspectArgs;
use pkgrecipe::ops::recipe_inspect::{format_summary, inspect};

pub fn execute(args: InspectArgs, source_dir: Option<PathBuf>) -> Result<()> {
    let ctx = super::context(source_dir)?;
    let summary = inspect(&ctx, &args.options.options)?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
        println!("{}", json);
    } else {
        print!("{}", format_summary(&summary));
    }

    Ok(())
}
