//! pkgrecipe CLI - package a CMake-built library

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pkgrecipe::util::diagnostic::{emit, Diagnostic};
use pkgrecipe::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.no_color);

    if let Err(e) = run(cli, &shell) {
        emit(&Diagnostic::from_error(&e), shell.use_color());
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pkgrecipe=debug")
    } else {
        EnvFilter::new("pkgrecipe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(shell.use_color())
        .with_target(false)
        .without_time()
        .init();

    let source_dir = cli.source_dir;

    // Execute command
    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(args, source_dir),
        Commands::Describe(args) => commands::describe::execute(args, source_dir),
        Commands::Package(args) => commands::package::execute(args, source_dir, shell),
        Commands::Export(args) => commands::export::execute(args, source_dir, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
