//! Deprecation command
//!
//! Usage: graphdelta deprecate --data-model <DM> [--record <URI>]... [--through <V>]

use clap::Args;
use graphdelta_engine::commands::deprecate::DeprecationTarget;
use graphdelta_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};

use crate::commands::StoreArgs;

#[derive(Debug, Args)]
pub struct DeprecateArgs {
    /// Data model to deprecate in
    #[arg(long)]
    pub data_model: String,

    /// Record to deprecate; repeatable. Without any, the whole data model
    #[arg(long = "record")]
    pub records: Vec<String>,

    /// Version the statements stop being valid at; defaults to the current one
    #[arg(long)]
    pub through: Option<i64>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Execute `deprecate`
pub fn execute(args: DeprecateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut store, config) = args.store.open()?;

    let target = if args.records.is_empty() {
        DeprecationTarget::DataModel
    } else {
        DeprecationTarget::Records {
            record_uris: args.records,
        }
    };
    let cmd = EngineCommand::Deprecate {
        data_model: args.data_model.clone(),
        target,
        through_version: args.through,
    };
    match apply_engine_command(cmd, &mut store, &config)? {
        EngineCommandResult::Deprecated(stats) => {
            println!(
                "✓ Deprecated {} statements in {} records of {}",
                stats.deprecated, stats.records, args.data_model
            );
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}
