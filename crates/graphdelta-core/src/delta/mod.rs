//! Delta computation between two versions of one record
//!
//! [`compute_changeset`] runs the whole pipeline: open both version views,
//! check the record identifier, build content-schema entities, mark both
//! subgraphs, persist the marks and read them back into a [`Changeset`].
//! Marking for one record is strictly sequential; independent records may
//! be processed by independent workers.

pub mod assembler;
pub mod entity;
pub mod marker;
pub mod matcher;
pub mod view;

pub use assembler::assemble;
pub use entity::{CSEntity, KeyEntity, SubGraphEntity, SubGraphLeafEntity, ValueEntity};
pub use marker::{clear_marks, mark_delta, Element, MarkBook, MarkSummary};
pub use matcher::{match_entities, record_identifier};
pub use view::{Edge, RecordView};

use crate::errors::{ExError, ExResult, GraphDeltaError};
use crate::graph::{with_transaction, GraphStore};
use crate::model::{Changeset, ContentSchema, Range};

/// Compare `old_version` and `new_version` of `record_uri`
///
/// Marks are persisted in one transaction before the changeset is read
/// back, so the store must not have a transaction open.
///
/// # Errors
///
/// - `InvalidRange` when `old_version > new_version`
/// - `NotFound` when the record does not exist
/// - `SchemaResolution` when the record identifier is missing or changed
/// - `MatchingIncomplete` when marking leaves statements unaccounted for
pub fn compute_changeset<S: GraphStore + ?Sized>(
    store: &mut S,
    record_uri: &str,
    data_model: &str,
    schema: &ContentSchema,
    old_version: i64,
    new_version: i64,
    max_depth: usize,
) -> ExResult<Changeset> {
    Range::new(old_version, new_version)
        .map_err(|e| ExError::from(e).with_op("compute_changeset").with_record_uri(record_uri))?;

    let old_view = RecordView::open(&*store, record_uri, data_model, old_version)?;
    let new_view = RecordView::open(&*store, record_uri, data_model, new_version)?;

    let old_id = record_identifier(&*store, &old_view, schema, max_depth)?;
    let new_id = record_identifier(&*store, &new_view, schema, max_depth)?;
    if old_id != new_id {
        return Err(GraphDeltaError::UnresolvablePath {
            path: schema
                .record_identifier_attribute_path
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            record_uri: record_uri.to_string(),
            reason: format!(
                "record identifier changed from {:?} to {:?}",
                old_id.unwrap_or_default(),
                new_id.unwrap_or_default()
            ),
        }
        .into());
    }

    let old_entities = match_entities(&*store, &old_view, schema, max_depth)?;
    let new_entities = match_entities(&*store, &new_view, schema, max_depth)?;

    with_transaction(store, |s| {
        clear_marks(s, &[&old_view, &new_view], max_depth)?;
        let book = mark_delta(&*s, &old_view, &new_view, &old_entities, &new_entities, max_depth)?;
        book.persist(s)
    })?;

    let changeset = assemble(&*store, &old_view, &new_view, max_depth)?;
    tracing::debug!(
        record_uri,
        data_model,
        old_version,
        new_version,
        additions = changeset.additions.len(),
        deletions = changeset.deletions.len(),
        modifications = changeset.modifications.len(),
        "changeset assembled"
    );
    Ok(changeset)
}
