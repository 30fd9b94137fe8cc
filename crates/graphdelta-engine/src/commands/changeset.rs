//! Changeset computation for one record or a batch of records.
//!
//! Records of a batch are computed one after another, each in its own
//! marking transaction; a failure is recorded against its record and the
//! job moves on.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use graphdelta_core::delta;
use graphdelta_core::errors::ExError;
use graphdelta_core::graph::GraphStore;
use graphdelta_core::model::{Changeset, ContentSchema, Range};
use graphdelta_core::{log_op_end, log_op_error, log_op_start};
use graphdelta_core_types::RunContext;
use graphdelta_store::errors::Result;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Why one record of a job has no changeset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub code: String,
    pub message: String,
}

impl From<&ExError> for RecordFailure {
    fn from(err: &ExError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome for one record of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChangeset {
    pub record_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<Changeset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RecordFailure>,
}

/// Result of [`changeset_job`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangesetJobReport {
    pub run_id: String,
    pub old_version: i64,
    pub new_version: i64,
    pub records: Vec<RecordChangeset>,
}

impl ChangesetJobReport {
    /// Records whose changeset could not be computed
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.error.is_some()).count()
    }

    /// Records with at least one change
    pub fn changed(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.changeset.as_ref())
            .filter(|c| c.has_changes())
            .count()
    }
}

/// Compare `old_version` and `new_version` of one record
///
/// ## Errors
///
/// - `InvalidRange`: `old_version > new_version`
/// - `NotFound`: the record does not exist in `data_model`
/// - `SchemaResolution`: the record identifier is missing or changed
/// - `MatchingIncomplete`: marking left statements unaccounted for
/// - `StoreTransaction`: the marking transaction failed again after a retry
pub fn compute_changeset<S>(
    store: &mut S,
    record_uri: &str,
    data_model: &str,
    schema: &ContentSchema,
    old_version: i64,
    new_version: i64,
    config: &EngineConfig,
) -> Result<Changeset>
where
    S: GraphStore + ?Sized,
{
    log_op_start!(
        "compute_changeset",
        data_model = data_model,
        record_uri = record_uri
    );
    let start = Instant::now();

    let changeset = compute_changeset_impl(
        store,
        record_uri,
        data_model,
        schema,
        old_version,
        new_version,
        config,
    )
    .map_err(|e| {
        let e = e.with_op("compute_changeset").with_data_model(data_model);
        log_op_error!(
            "compute_changeset",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            record_uri = record_uri
        );
        e
    })?;

    log_op_end!(
        "compute_changeset",
        duration_ms = start.elapsed().as_millis() as u64,
        record_uri = record_uri,
        additions = changeset.additions.len() as u64,
        deletions = changeset.deletions.len() as u64,
        modifications = changeset.modifications.len() as u64
    );

    Ok(changeset)
}

fn compute_changeset_impl<S>(
    store: &mut S,
    record_uri: &str,
    data_model: &str,
    schema: &ContentSchema,
    old_version: i64,
    new_version: i64,
    config: &EngineConfig,
) -> Result<Changeset>
where
    S: GraphStore + ?Sized,
{
    let attempt = |store: &mut S| {
        delta::compute_changeset(
            store,
            record_uri,
            data_model,
            schema,
            old_version,
            new_version,
            config.max_subgraph_depth,
        )
    };

    match attempt(store) {
        Err(err) if err.is_retryable() && config.retry_transient => {
            tracing::warn!(
                record_uri,
                data_model,
                error = %err,
                "transient store failure, retrying changeset"
            );
            attempt(store)
        }
        other => other,
    }
}

/// Compute changesets for many records of one data model
///
/// Per-record failures end up in the report; they never abort the job.
///
/// ## Errors
///
/// - `InvalidRange`: `old_version > new_version`, checked before any record
pub fn changeset_job<S>(
    store: &mut S,
    record_uris: &[String],
    data_model: &str,
    schema: &ContentSchema,
    old_version: i64,
    new_version: i64,
    config: &EngineConfig,
) -> Result<ChangesetJobReport>
where
    S: GraphStore + ?Sized,
{
    let run = RunContext::new(data_model);
    log_op_start!(
        "changeset_job",
        data_model = data_model,
        run_id = run.run_id.as_str(),
        records = record_uris.len() as u64
    );
    let start = Instant::now();

    if let Err(err) = Range::new(old_version, new_version) {
        let e = ExError::from(err)
            .with_op("changeset_job")
            .with_data_model(data_model)
            .with_run_id(run.run_id.clone());
        log_op_error!(
            "changeset_job",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        return Err(e);
    }

    let mut records = Vec::with_capacity(record_uris.len());
    for record_uri in record_uris {
        let outcome = compute_changeset(
            store,
            record_uri,
            data_model,
            schema,
            old_version,
            new_version,
            config,
        );
        records.push(match outcome {
            Ok(changeset) => RecordChangeset {
                record_uri: record_uri.clone(),
                changeset: Some(changeset),
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    run_id = %run.run_id,
                    record_uri = %record_uri,
                    err_code = err.code(),
                    "record skipped"
                );
                RecordChangeset {
                    record_uri: record_uri.clone(),
                    changeset: None,
                    error: Some(RecordFailure::from(&err)),
                }
            }
        });
    }

    let report = ChangesetJobReport {
        run_id: run.run_id.to_string(),
        old_version,
        new_version,
        records,
    };

    log_op_end!(
        "changeset_job",
        duration_ms = start.elapsed().as_millis() as u64,
        changed = report.changed() as u64,
        failed = report.failed() as u64
    );

    Ok(report)
}
