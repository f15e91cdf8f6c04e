//! PlanDiff CLI
//!
//! Command-line interface for comparing estimate and plan snapshots

use clap::{Parser, Subcommand};
use plandiff_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "plandiff")]
#[command(about = "PlanDiff - Versioned estimate comparison", long_about = None)]
struct Cli {
    /// Emit operation logs to stderr (development or production); RUST_LOG overrides the filter
    #[arg(long, global = true)]
    log_profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two snapshot files as consecutive versions of one document
    Compare(commands::compare::CompareArgs),
    /// Validate one snapshot file and print its digest
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Some(profile) = cli.log_profile {
        logging_facility::init(profile);
    }

    let result = match cli.command {
        Commands::Compare(args) => commands::compare::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
