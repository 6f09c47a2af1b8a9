//! `spcc show` command - every constant for one sample size

use clap::Args;
use miette::Result;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

use crate::cli::helpers::{build_estimator, constant_set, resolve_config, resolve_sigma};
use crate::cli::output::{delimiter, effective_format, print_delimited, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::ConstantSummary;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Sample size (n >= 2, fractional values allowed)
    #[arg(allow_negative_numbers = true)]
    pub n: f64,

    /// Sigma multiplier for the control limits [default: 3, or config]
    #[arg(long, short = 'z', allow_negative_numbers = true)]
    pub sigma: Option<f64>,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = resolve_config(global);
    let estimator = build_estimator(&config)?;
    let z = resolve_sigma(args.sigma, &config)?;
    let set = constant_set(args.n, z, &estimator)?;
    let summary = set.summary().map_err(|e| miette::miette!("{}", e))?;

    let format = effective_format(global.output, false);
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Yaml => print_yaml(&summary),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = delimiter(format).unwrap_or(b'\t');
            let rows = named_values(&summary)
                .into_iter()
                .map(|(name, value)| [name.to_string(), value.to_string()]);
            print_delimited(sep, &["name", "value"], rows)
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["name".to_string(), "value".to_string()]);
            for (name, value) in named_values(&summary) {
                builder.push_record([name.to_string(), format!("{:.8}", value)]);
            }
            let mut table = builder.build();
            table
                .with(Style::sharp())
                .modify(Columns::new(1..), Alignment::right());
            println!("{}", set.repr());
            println!("{}", table);
            Ok(())
        }
        OutputFormat::Text | OutputFormat::Auto => {
            println!("{}", set.repr());
            println!("{}", summary);
            Ok(())
        }
    }
}

/// Conventional names paired with values, in reporting order
fn named_values(s: &ConstantSummary) -> [(&'static str, f64); 19] {
    [
        ("n", s.n),
        ("z", s.z),
        ("A", s.a),
        ("A2", s.a2),
        ("A3", s.a3),
        ("c4", s.c4),
        ("c5", s.c5),
        ("B3", s.b3),
        ("B4", s.b4),
        ("B5", s.b5),
        ("B6", s.b6),
        ("d2", s.d2),
        ("d3", s.d3),
        ("D1", s.big_d1),
        ("D2", s.big_d2),
        ("D3", s.big_d3),
        ("D4", s.big_d4),
        ("E2", s.e2),
        ("E3", s.e3),
    ]
}
