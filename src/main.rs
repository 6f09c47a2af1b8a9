use clap::Parser;
use miette::Result;
use spcc::cli::helpers::init_logging;
use spcc::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Show(args) => spcc::cli::commands::show::run(args, &cli.global),
        Commands::Table(args) => spcc::cli::commands::table::run(args, &cli.global),
        Commands::Cache(cmd) => spcc::cli::commands::cache::run(cmd, &cli.global),
        Commands::Completions(args) => spcc::cli::commands::completions::run(args),
    }
}
