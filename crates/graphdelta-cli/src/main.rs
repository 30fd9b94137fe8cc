//! GraphDelta CLI
//!
//! Command-line interface for importing statements, publishing record
//! versions and computing changesets against a SQLite graph.

use clap::{Parser, Subcommand};
use graphdelta_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "graphdelta")]
#[command(about = "GraphDelta - Versioned statement graphs and change detection", long_about = None)]
struct Cli {
    /// Log profile: development, production or test
    #[arg(long, global = true, default_value = "production")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a dataset at the data model's current version
    Import(commands::import::ImportArgs),
    /// Publish a dataset as a new version of its records
    Update(commands::import::ImportArgs),
    /// Close live statements through a version
    Deprecate(commands::deprecate::DeprecateArgs),
    /// Print the latest version of a data model
    Version(commands::version::VersionArgs),
    /// Compare two versions of one or more records
    Changeset(commands::changeset::ChangesetArgs),
}

fn main() {
    let cli = Cli::parse();
    init(Profile::from_name(&cli.log));

    let result = match cli.command {
        Commands::Import(args) => commands::import::execute_import(args),
        Commands::Update(args) => commands::import::execute_update(args),
        Commands::Deprecate(args) => commands::deprecate::execute(args),
        Commands::Version(args) => commands::version::execute(args),
        Commands::Changeset(args) => commands::changeset::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
