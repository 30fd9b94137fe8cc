//! Dataset import and update commands
//!
//! Usage:
//!   graphdelta import <PATH> [--db <DB>] [--config <FILE>]
//!   graphdelta update <PATH> [--db <DB>] [--config <FILE>]

use clap::Args;
use graphdelta_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use graphdelta_store::dataset::parse_dataset_file;
use std::path::PathBuf;

use crate::commands::StoreArgs;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Dataset file (YAML, or JSON by extension)
    pub path: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Execute `import`
pub fn execute_import(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = parse_dataset_file(&args.path)?;
    let (mut store, config) = args.store.open()?;

    println!("Importing {}...", args.path.display());
    let cmd = EngineCommand::Import {
        data_model: dataset.data_model.clone(),
        statements: dataset.statements,
    };
    match apply_engine_command(cmd, &mut store, &config)? {
        EngineCommandResult::Imported(stats) => {
            println!(
                "✓ Imported {} statements into {} ({} relationships added, {} literals)",
                stats.triples, dataset.data_model, stats.relationships_added, stats.literals
            );
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}

/// Execute `update`
pub fn execute_update(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = parse_dataset_file(&args.path)?;
    let (mut store, config) = args.store.open()?;

    println!("Publishing {}...", args.path.display());
    let cmd = EngineCommand::Update {
        data_model: dataset.data_model.clone(),
        statements: dataset.statements,
    };
    match apply_engine_command(cmd, &mut store, &config)? {
        EngineCommandResult::Updated(outcome) => {
            println!(
                "✓ Published version {} of {} ({} statements, {} deprecated)",
                outcome.version,
                dataset.data_model,
                outcome.stats.triples,
                outcome.deprecation.deprecated
            );
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}
