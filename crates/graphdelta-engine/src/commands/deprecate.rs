//! Deprecation jobs.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use graphdelta_core::graph::GraphStore;
use graphdelta_core::versioning::{deprecate_data_model, deprecate_records, DeprecationStats};
use graphdelta_core::{log_op_end, log_op_error, log_op_start};
use graphdelta_core_types::RunContext;
use graphdelta_store::errors::Result;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// What a deprecation job closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum DeprecationTarget {
    /// Every record of the data model
    DataModel,
    /// The named records; unknown URIs are skipped
    Records { record_uris: Vec<String> },
}

/// Set `validTo = through_version` on every live statement of the target
///
/// Each record is deprecated in its own transaction. Running the same job
/// twice deprecates nothing the second time.
///
/// ## Errors
///
/// - `InvalidRange`: a live statement of the record became valid after
///   `through_version`
/// - `DeterminismViolation`: the record is deeper than `max_subgraph_depth`
/// - `StoreTransaction` / `Persistence`
///
/// The failing record is rolled back; records deprecated before it stay
/// deprecated.
pub fn deprecate<S>(
    store: &mut S,
    data_model: &str,
    target: &DeprecationTarget,
    through_version: i64,
    config: &EngineConfig,
) -> Result<DeprecationStats>
where
    S: GraphStore + ?Sized,
{
    let run = RunContext::new(data_model);
    log_op_start!(
        "deprecate",
        data_model = data_model,
        version = through_version,
        run_id = run.run_id.as_str()
    );
    let start = Instant::now();

    let result = match target {
        DeprecationTarget::DataModel => deprecate_data_model(
            store,
            data_model,
            through_version,
            config.max_subgraph_depth,
        ),
        DeprecationTarget::Records { record_uris } => deprecate_records(
            store,
            data_model,
            record_uris,
            through_version,
            config.max_subgraph_depth,
        ),
    };

    let stats = result.map_err(|e| {
        let e = e.with_data_model(data_model).with_run_id(run.run_id.clone());
        log_op_error!(
            "deprecate",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "deprecate",
        duration_ms = start.elapsed().as_millis() as u64,
        deprecated = stats.deprecated,
        records = stats.records
    );

    Ok(stats)
}
