//! Batched statement import and record updates.
//!
//! Statements are encoded in batches, one transaction per batch. A batch is
//! closed at a record boundary once it holds `batch_size` statements or has
//! been open for `batch_time_secs`, so a record's blank nodes never span two
//! transactions. A batch that fails with a transient store error is rolled
//! back and replayed once.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use graphdelta_core::encoder::{encode, EncodeContext, ImportStats};
use graphdelta_core::graph::{with_transaction, GraphStore};
use graphdelta_core::model::{record_uris, Statement};
use graphdelta_core::versioning::{
    advance_version, deprecate_records, ensure_data_model, DeprecationStats,
};
use graphdelta_core::{log_op_end, log_op_error, log_op_start};
use graphdelta_core_types::RunContext;
use graphdelta_store::errors::Result;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Result of [`update_records`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Version the statements were written at
    pub version: i64,
    /// Statements of the previous versions closed at `version`
    pub deprecation: DeprecationStats,
    pub stats: ImportStats,
}

/// Import statements into `data_model` at its current version
///
/// An unknown data model is created at the bootstrap version. Importing a
/// statement that is already live resolves to its existing edge.
///
/// ## Errors
///
/// - `Encoding`: a malformed statement; its batch is rolled back
/// - `HashCollision`: the hash index points at a different statement
/// - `StoreTransaction`: the batch failed again after its replay
///
/// Batches committed before the failure stay committed.
pub fn import_statements<S, I>(
    store: &mut S,
    statements: I,
    data_model: &str,
    config: &EngineConfig,
) -> Result<ImportStats>
where
    S: GraphStore + ?Sized,
    I: IntoIterator<Item = Statement>,
{
    let run = RunContext::new(data_model);
    log_op_start!(
        "import_statements",
        data_model = data_model,
        run_id = run.run_id.as_str()
    );
    let start = Instant::now();

    let stats = import_statements_impl(store, statements, &run, config).map_err(|e| {
        let e = e.with_data_model(data_model).with_run_id(run.run_id.clone());
        log_op_error!(
            "import_statements",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "import_statements",
        duration_ms = start.elapsed().as_millis() as u64,
        statements = stats.triples,
        relationships_added = stats.relationships_added
    );

    Ok(stats)
}

fn import_statements_impl<S, I>(
    store: &mut S,
    statements: I,
    run: &RunContext,
    config: &EngineConfig,
) -> Result<ImportStats>
where
    S: GraphStore + ?Sized,
    I: IntoIterator<Item = Statement>,
{
    let version = ensure_data_model(store, &run.data_model)?;
    import_at(store, statements, run, version, config)
}

/// Publish a new version of the records the statements belong to
///
/// Advances the data model's version, deprecates the live statements of
/// every record named by the statements through that version and imports
/// the statements at it. Afterwards both versions can be compared with
/// `compute_changeset`.
///
/// ## Errors
///
/// As [`import_statements`]; deprecation failures roll back only the
/// failing record.
pub fn update_records<S>(
    store: &mut S,
    statements: Vec<Statement>,
    data_model: &str,
    config: &EngineConfig,
) -> Result<UpdateOutcome>
where
    S: GraphStore + ?Sized,
{
    let run = RunContext::new(data_model);
    log_op_start!(
        "update_records",
        data_model = data_model,
        run_id = run.run_id.as_str()
    );
    let start = Instant::now();

    let outcome = update_records_impl(store, statements, &run, config).map_err(|e| {
        let e = e.with_data_model(data_model).with_run_id(run.run_id.clone());
        log_op_error!(
            "update_records",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "update_records",
        duration_ms = start.elapsed().as_millis() as u64,
        version = outcome.version,
        deprecated = outcome.deprecation.deprecated,
        statements = outcome.stats.triples
    );

    Ok(outcome)
}

fn update_records_impl<S>(
    store: &mut S,
    statements: Vec<Statement>,
    run: &RunContext,
    config: &EngineConfig,
) -> Result<UpdateOutcome>
where
    S: GraphStore + ?Sized,
{
    let version = advance_version(store, &run.data_model)?;
    let records = record_uris(&statements);
    let deprecation = deprecate_records(
        store,
        &run.data_model,
        &records,
        version,
        config.max_subgraph_depth,
    )?;
    let stats = import_at(store, statements, run, version, config)?;
    Ok(UpdateOutcome {
        version,
        deprecation,
        stats,
    })
}

fn import_at<S, I>(
    store: &mut S,
    statements: I,
    run: &RunContext,
    version: i64,
    config: &EngineConfig,
) -> Result<ImportStats>
where
    S: GraphStore + ?Sized,
    I: IntoIterator<Item = Statement>,
{
    let mut ctx = EncodeContext::new(run.data_model.clone(), version);
    let mut total = ImportStats::default();
    let mut batch: Vec<Statement> = Vec::new();
    let mut batch_started = Instant::now();
    let mut current_record: Option<String> = None;

    for statement in statements {
        let record = statement.record_uri().map(str::to_string);
        let at_boundary = match (&record, &current_record) {
            (Some(next), Some(current)) => next != current,
            _ => false,
        };
        let due = batch.len() >= config.batch_size || batch_started.elapsed() >= config.batch_time();
        if at_boundary && due && !batch.is_empty() {
            total.absorb(flush_batch(store, &mut ctx, &batch, run, config)?);
            batch.clear();
            batch_started = Instant::now();
        }
        if record.is_some() {
            current_record = record;
        }
        batch.push(statement);
    }

    if !batch.is_empty() {
        total.absorb(flush_batch(store, &mut ctx, &batch, run, config)?);
    }

    Ok(total)
}

fn flush_batch<S>(
    store: &mut S,
    ctx: &mut EncodeContext,
    batch: &[Statement],
    run: &RunContext,
    config: &EngineConfig,
) -> Result<ImportStats>
where
    S: GraphStore + ?Sized,
{
    let mut replayed = false;
    loop {
        let result = with_transaction(store, |s| {
            for statement in batch {
                encode(s, ctx, statement)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                let stats = ctx.flush();
                tracing::debug!(
                    run_id = %run.run_id,
                    data_model = %run.data_model,
                    statements = batch.len(),
                    relationships_added = stats.relationships_added,
                    "batch committed"
                );
                return Ok(stats);
            }
            Err(err) => {
                ctx.reset_after_rollback();
                if err.is_retryable() && config.retry_transient && !replayed {
                    tracing::warn!(
                        run_id = %run.run_id,
                        data_model = %run.data_model,
                        statements = batch.len(),
                        error = %err,
                        "transient store failure, replaying batch"
                    );
                    replayed = true;
                    continue;
                }
                return Err(err);
            }
        }
    }
}
