//! Changeset command
//!
//! Usage: graphdelta changeset --data-model <DM> --record <URI>... --schema <FILE> --old <V> --new <V>
//!
//! Prints the changeset as JSON for a single record, or a job report with
//! one entry per record when several are given.

use clap::Args;
use graphdelta_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};
use graphdelta_store::dataset::parse_schema_file;
use std::path::PathBuf;

use crate::commands::StoreArgs;

#[derive(Debug, Args)]
pub struct ChangesetArgs {
    #[arg(long)]
    pub data_model: String,

    /// Record to compare; repeatable
    #[arg(long = "record", required = true)]
    pub records: Vec<String>,

    /// Content-schema file (YAML, or JSON by extension)
    #[arg(long)]
    pub schema: PathBuf,

    /// Older version
    #[arg(long)]
    pub old: i64,

    /// Newer version
    #[arg(long)]
    pub new: i64,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Execute `changeset`
pub fn execute(mut args: ChangesetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let schema = parse_schema_file(&args.schema)?;
    let (mut store, config) = args.store.open()?;

    let cmd = if args.records.len() == 1 {
        EngineCommand::Changeset {
            data_model: args.data_model,
            record_uri: args.records.remove(0),
            schema,
            old_version: args.old,
            new_version: args.new,
        }
    } else {
        EngineCommand::ChangesetJob {
            data_model: args.data_model,
            record_uris: args.records,
            schema,
            old_version: args.old,
            new_version: args.new,
        }
    };

    let json = match apply_engine_command(cmd, &mut store, &config)? {
        EngineCommandResult::Changeset(changeset) => serde_json::to_string_pretty(&changeset)?,
        EngineCommandResult::ChangesetJob(report) => serde_json::to_string_pretty(&report)?,
        other => return Err(format!("unexpected engine result: {:?}", other).into()),
    };
    println!("{}", json);
    Ok(())
}
