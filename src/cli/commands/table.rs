//! `spcc table` command - constants over a range of sample sizes

use clap::Args;
use miette::Result;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tracing::info;

use crate::cli::helpers::{build_estimator, constant_set, resolve_config, resolve_sigma};
use crate::cli::output::{
    delimiter, effective_format, fixed6, print_delimited, print_json, print_yaml,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{ConstantSet, ConstantError};

const COLUMNS: [&str; 11] = ["n", "z", "d2", "d3", "c4", "A2", "A3", "B3", "B4", "D3", "D4"];

#[derive(Args, Debug)]
pub struct TableArgs {
    /// First sample size
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(2..))]
    pub from: u32,

    /// Last sample size (inclusive)
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(2..))]
    pub to: u32,

    /// Sigma multiplier for the control limits [default: 3, or config]
    #[arg(long, short = 'z', allow_negative_numbers = true)]
    pub sigma: Option<f64>,
}

/// One row of the chart-factor table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableRow {
    pub n: f64,
    pub z: f64,
    pub d2: f64,
    pub d3: f64,
    pub c4: f64,
    #[serde(rename = "A2")]
    pub a2: f64,
    #[serde(rename = "A3")]
    pub a3: f64,
    #[serde(rename = "B3")]
    pub b3: f64,
    #[serde(rename = "B4")]
    pub b4: f64,
    #[serde(rename = "D3")]
    pub big_d3: f64,
    #[serde(rename = "D4")]
    pub big_d4: f64,
}

impl TableRow {
    pub fn from_set(set: &ConstantSet) -> Result<Self, ConstantError> {
        Ok(Self {
            n: set.n(),
            z: set.z(),
            d2: set.d2()?,
            d3: set.d3()?,
            c4: set.c4(),
            a2: set.A2()?,
            a3: set.A3(),
            b3: set.B3(),
            b4: set.B4(),
            big_d3: set.D3()?,
            big_d4: set.D4()?,
        })
    }

    fn cells(&self) -> [String; 11] {
        [
            self.n.to_string(),
            self.z.to_string(),
            fixed6(&self.d2),
            fixed6(&self.d3),
            fixed6(&self.c4),
            fixed6(&self.a2),
            fixed6(&self.a3),
            fixed6(&self.b3),
            fixed6(&self.b4),
            fixed6(&self.big_d3),
            fixed6(&self.big_d4),
        ]
    }
}

pub fn run(args: TableArgs, global: &GlobalOpts) -> Result<()> {
    if args.to < args.from {
        return Err(miette::miette!(
            "--to ({}) must not be below --from ({})",
            args.to,
            args.from
        ));
    }

    let config = resolve_config(global);
    let estimator = build_estimator(&config)?;
    let z = resolve_sigma(args.sigma, &config)?;

    let mut rows = Vec::with_capacity((args.to - args.from + 1) as usize);
    for n in args.from..=args.to {
        let set = constant_set(f64::from(n), z, &estimator)?;
        let row = TableRow::from_set(&set)
            .map_err(|e| miette::miette!("n={}: {}", n, e))?;
        info!(n, "computed row");
        rows.push(row);
    }

    let format = effective_format(global.output, true);
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Yaml => print_yaml(&rows),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = delimiter(format).unwrap_or(b'\t');
            print_delimited(sep, &COLUMNS, rows.iter().map(TableRow::cells))
        }
        OutputFormat::Table | OutputFormat::Text | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(COLUMNS.map(String::from));
            for row in &rows {
                builder.push_record(row.cells());
            }
            let mut table = builder.build();
            table
                .with(Style::sharp())
                .modify(Columns::new(2..), Alignment::right());
            println!("{}", table);
            Ok(())
        }
    }
}
