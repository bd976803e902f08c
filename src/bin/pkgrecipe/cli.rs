//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pkgrecipe::builder::BuildType;

/// pkgrecipe - package a CMake-built library for a dependency manager
#[derive(Parser)]
#[command(name = "pkgrecipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Recipe root (defaults to the nearest directory with a CMakeLists.txt)
    #[arg(long, global = true, env = "PKGRECIPE_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the project identity, options and requirements
    Inspect(InspectArgs),

    /// Print the component graph consumers link against
    Describe(DescribeArgs),

    /// Configure, build and install the library into a package folder
    Package(PackageArgs),

    /// Copy the recipe's source files into an export folder
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Repeatable `-o key=value` option overrides.
#[derive(Args)]
pub struct OptionArgs {
    /// Override a recipe option, e.g. `-o build_ffi=true`
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub options: OptionArgs,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum DescribeFormat {
    #[default]
    Json,
    Tree,
}

#[derive(Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub options: OptionArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = DescribeFormat::Json)]
    pub format: DescribeFormat,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub options: OptionArgs,

    /// CMake build type (Debug, Release, RelWithDebInfo, MinSizeRel)
    #[arg(long)]
    pub build_type: Option<BuildType>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Package folder (defaults to `<root>/package`)
    #[arg(long)]
    pub package_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination (defaults to `<root>/.pkgrecipe/export`)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
