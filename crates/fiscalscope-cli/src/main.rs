//! FiscalScope CLI - NF-e auditing and exploratory analysis.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let verbose = cli.verbose > 0;
    let result = commands::build_scope(cli.config.as_deref()).and_then(|scope| match cli.command {
        Commands::Analyze { file, json } => commands::analyze::run(&scope, file, json, verbose),

        Commands::Validate { file, rule, json } => {
            commands::validate::run(&scope, file, rule, json, verbose)
        }

        Commands::Audit { file, output } => commands::audit::run(&scope, file, output),

        Commands::Summary { file, json } => commands::summary::run(&scope, file, json),

        Commands::Tool { file, name, input } => commands::tool::run(&scope, file, name, input),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
