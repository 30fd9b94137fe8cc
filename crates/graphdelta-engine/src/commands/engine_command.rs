//! Engine-level commands and their dispatch.

#![allow(clippy::result_large_err)]

use graphdelta_core::encoder::ImportStats;
use graphdelta_core::graph::GraphStore;
use graphdelta_core::model::{Changeset, ContentSchema, Statement};
use graphdelta_core::versioning::{current_version, DeprecationStats};
use graphdelta_store::errors::Result;

use crate::commands::changeset::{changeset_job, compute_changeset, ChangesetJobReport};
use crate::commands::deprecate::{deprecate, DeprecationTarget};
use crate::commands::import::{import_statements, update_records, UpdateOutcome};
use crate::config::EngineConfig;

/// Engine-level commands that touch the store.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Import statements at the data model's current version.
    Import {
        data_model: String,
        statements: Vec<Statement>,
    },
    /// Publish a new version of the records the statements belong to.
    Update {
        data_model: String,
        statements: Vec<Statement>,
    },
    /// Close live statements through a version.
    Deprecate {
        data_model: String,
        target: DeprecationTarget,
        /// None deprecates through the current version.
        through_version: Option<i64>,
    },
    /// Read the data model's latest version.
    CurrentVersion { data_model: String },
    /// Compare two versions of one record.
    Changeset {
        data_model: String,
        record_uri: String,
        schema: ContentSchema,
        old_version: i64,
        new_version: i64,
    },
    /// Compare two versions of many records, isolating failures per record.
    ChangesetJob {
        data_model: String,
        record_uris: Vec<String>,
        schema: ContentSchema,
        old_version: i64,
        new_version: i64,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Imported(ImportStats),
    Updated(UpdateOutcome),
    Deprecated(DeprecationStats),
    CurrentVersion(i64),
    Changeset(Box<Changeset>),
    ChangesetJob(ChangesetJobReport),
}

/// Apply an engine command against `store`.
pub fn apply_engine_command<S>(
    cmd: EngineCommand,
    store: &mut S,
    config: &EngineConfig,
) -> Result<EngineCommandResult>
where
    S: GraphStore + ?Sized,
{
    match cmd {
        EngineCommand::Import {
            data_model,
            statements,
        } => import_statements(store, statements, &data_model, config)
            .map(EngineCommandResult::Imported),
        EngineCommand::Update {
            data_model,
            statements,
        } => update_records(store, statements, &data_model, config)
            .map(EngineCommandResult::Updated),
        EngineCommand::Deprecate {
            data_model,
            target,
            through_version,
        } => {
            let through = match through_version {
                Some(v) => v,
                None => current_version(&*store, &data_model)?,
            };
            deprecate(store, &data_model, &target, through, config)
                .map(EngineCommandResult::Deprecated)
        }
        EngineCommand::CurrentVersion { data_model } => {
            current_version(&*store, &data_model).map(EngineCommandResult::CurrentVersion)
        }
        EngineCommand::Changeset {
            data_model,
            record_uri,
            schema,
            old_version,
            new_version,
        } => compute_changeset(
            store,
            &record_uri,
            &data_model,
            &schema,
            old_version,
            new_version,
            config,
        )
        .map(|c| EngineCommandResult::Changeset(Box::new(c))),
        EngineCommand::ChangesetJob {
            data_model,
            record_uris,
            schema,
            old_version,
            new_version,
        } => changeset_job(
            store,
            &record_uris,
            &data_model,
            &schema,
            old_version,
            new_version,
            config,
        )
        .map(EngineCommandResult::ChangesetJob),
    }
}
