//! Command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use pkgrecipe::util::GlobalContext;

pub mod completions;
pub mod describe;
pub mod export;
pub mod inspect;
pub mod package;

/// Build the context from `--source-dir` or by searching upward from the
/// current directory.
pub fn context(source_dir: Option<PathBuf>) -> Result<GlobalContext> {
    match source_dir {
        Some(dir) => {
            let dir = std::path::absolute(&dir)
                .with_context(|| format!("invalid source directory: {}", dir.display()))?;
            GlobalContext::discover(&dir)
        }
        None => GlobalContext::new(),
    }
}
