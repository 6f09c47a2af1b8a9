//! `spcc cache` command - inspect the durable d2/d3 cache

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::{open_cache, resolve_config};
use crate::cli::output::{delimiter, effective_format, print_delimited, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::CacheEntry;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached d2/d3 values
    List,

    /// Delete every cached value
    Clear,

    /// Print the cache file location
    Path,
}

pub fn run(cmd: CacheCommands, global: &GlobalOpts) -> Result<()> {
    let config = resolve_config(global);

    match cmd {
        CacheCommands::Path => {
            println!("{}", config.cache_path().display());
            Ok(())
        }
        CacheCommands::Clear => {
            let cache = open_cache(&config)?;
            let removed = cache.clear().map_err(|e| miette::miette!("{}", e))?;
            println!(
                "{} Removed {} cached value(s) from {}",
                style("✓").green(),
                removed,
                style(config.cache_path().display()).cyan()
            );
            Ok(())
        }
        CacheCommands::List => {
            let cache = open_cache(&config)?;
            let entries = cache.entries().map_err(|e| miette::miette!("{}", e))?;
            print_entries(&entries, effective_format(global.output, true))
        }
    }
}

fn print_entries(entries: &[CacheEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(entries),
        OutputFormat::Yaml => print_yaml(entries),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = delimiter(format).unwrap_or(b'\t');
            let rows = entries.iter().map(|e| {
                [
                    e.statistic.to_string(),
                    e.sample_size.clone(),
                    e.value.to_string(),
                    e.computed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                ]
            });
            print_delimited(sep, &["statistic", "n", "value", "computed_at"], rows)
        }
        OutputFormat::Table | OutputFormat::Text | OutputFormat::Auto => {
            if entries.is_empty() {
                println!("{}", style("No cached values").dim());
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["statistic", "n", "value", "computed"].map(String::from));
            for e in entries {
                builder.push_record([
                    e.statistic.to_string(),
                    e.sample_size.clone(),
                    e.value.to_string(),
                    e.computed_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::sharp());
            println!("{}", table);
            println!(
                "{} {} value(s)",
                style("→").dim(),
                style(entries.len()).cyan()
            );
            Ok(())
        }
    }
}
