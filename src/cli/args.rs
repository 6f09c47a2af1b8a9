//! Command-line argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::cache::CacheCommands;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::show::ShowArgs;
use crate::cli::commands::table::TableArgs;

#[derive(Parser, Debug)]
#[command(name = "spcc")]
#[command(author, version, about = "SPC control chart constants computed from first principles")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Do not read or write the durable d2/d3 cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Cache database file
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_path: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every constant for one sample size
    Show(ShowArgs),

    /// Print the d2/d3/c4/A2/A3/B3/B4/D3/D4 table over a range of sample sizes
    Table(TableArgs),

    /// Inspect or clear the d2/d3 cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text for a single set, a table for lists
    Auto,
    /// Human-readable line
    Text,
    /// Aligned table
    Table,
    Json,
    Yaml,
    Tsv,
    Csv,
}
