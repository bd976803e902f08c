//! `pkgrecipe describe` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{DescribeArgs, DescribeFormat};
use pkgrecipe::ops::recipe_describe::{describe, format_tree};

pub fn execute(args: DescribeArgs, source_dir: Option<PathBuf>) -> Result<()> {
    let ctx = super::context(source_dir)?;
    let descriptor = describe(&ctx, &args.options.options)?;

    match args.format {
        DescribeFormat::Json => {
            let json = serde_json::to_string_pretty(&descriptor)
                .context("failed to serialize package descriptor")?;
            println!("{}", json);
        }
        DescribeFormat::Tree => print!("{}", format_tree(&descriptor)?),
    }

    Ok(())
}
