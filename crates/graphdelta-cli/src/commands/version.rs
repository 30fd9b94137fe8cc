//! Version command
//!
//! Usage: graphdelta version --data-model <DM>

use clap::Args;
use graphdelta_engine::commands::engine_command::{
    apply_engine_command, EngineCommand, EngineCommandResult,
};

use crate::commands::StoreArgs;

#[derive(Debug, Args)]
pub struct VersionArgs {
    #[arg(long)]
    pub data_model: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Execute `version`; prints the bare version number
pub fn execute(args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut store, config) = args.store.open()?;
    let cmd = EngineCommand::CurrentVersion {
        data_model: args.data_model,
    };
    match apply_engine_command(cmd, &mut store, &config)? {
        EngineCommandResult::CurrentVersion(version) => {
            println!("{}", version);
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}
