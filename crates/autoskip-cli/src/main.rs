//! autoskip CLI
//!
//! Operator front end for the autoskip settings engine.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config = cli.config.as_deref();
    match cli.command {
        Some(Commands::Show { json }) => commands::run_show(config, json),
        Some(Commands::Resolve {
            item,
            section,
            snapshot,
            chain,
        }) => commands::run_resolve(config, &item, &section, snapshot.as_deref(), chain),
        Some(Commands::Convert { to, snapshot }) => commands::run_convert(config, to, &snapshot),
        None => {
            println!("{} settings tool", "autoskip".green().bold());
            println!();
            println!("Run {} for available commands.", "autoskip --help".cyan());
            Ok(())
        }
    }
}
