use std::error::Error;

use clap::{Parser, Subcommand};
use commands::run::{self, RunArgs};
use tracing_subscriber::EnvFilter;

mod commands;
mod data;

#[derive(Parser, Debug)]
#[command(name = "coal-sim", about = "Bayesian switchpoint inference over yearly counts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the switchpoint posterior of a CSV of yearly counts.
    Run(RunArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
    }
}
