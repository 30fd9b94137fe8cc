use graphdelta_core::encoder::{encode, EncodeContext, ImportStats};
use graphdelta_core::graph::MemoryGraph;
use graphdelta_core::model::{AttributePath, Statement, Term, RDF_TYPE};
use graphdelta_core::versioning::{advance_version, deprecate_records};

pub const DM: &str = "http://example.org/dm/books";
pub const MAX_DEPTH: usize = 64;

/// Build an attribute path from predicate names
#[allow(dead_code)]
pub fn path(attrs: &[&str]) -> AttributePath {
    AttributePath::new(attrs.iter().copied()).expect("non-empty path")
}

/// Encode statements at `version` with a fresh context
#[allow(dead_code)]
pub fn load(store: &mut MemoryGraph, version: i64, statements: &[Statement]) -> ImportStats {
    let mut ctx = EncodeContext::new(DM, version);
    for st in statements {
        encode(store, &mut ctx, st).expect("encode");
    }
    ctx.flush()
}

/// Publish a new version of one record: advance, deprecate, import
///
/// The first publish of a data model lands at version 1.
#[allow(dead_code)]
pub fn publish(store: &mut MemoryGraph, record_uri: &str, statements: &[Statement]) -> i64 {
    let version = advance_version(store, DM).expect("advance");
    deprecate_records(store, DM, &[record_uri.to_string()], version, MAX_DEPTH)
        .expect("deprecate");
    load(store, version, statements);
    version
}

/// Book record: one author blank node with a name, one title literal
#[allow(dead_code)]
pub fn book(uri: &str, author: &str, title: &str) -> Vec<Statement> {
    vec![
        Statement::new(Term::resource(uri), RDF_TYPE, Term::resource("http://example.org/Book")),
        Statement::new(Term::resource(uri), "hasAuthor", Term::bnode("author")),
        Statement::new(Term::bnode("author"), "hasName", Term::literal(author)),
        Statement::new(Term::resource(uri), "hasTitle", Term::literal(title)),
    ]
}

/// Record with one tag literal per value
#[allow(dead_code)]
pub fn tagged(uri: &str, tags: &[&str]) -> Vec<Statement> {
    tags.iter()
        .enumerate()
        .map(|(i, tag)| {
            Statement::new(Term::resource(uri), "hasTag", Term::literal(*tag)).with_order(i as i64)
        })
        .collect()
}

/// Record with typed item blank nodes, each with a name and a value
#[allow(dead_code)]
pub fn items(uri: &str, entries: &[(&str, &str)]) -> Vec<Statement> {
    let mut out = Vec::new();
    for (i, (name, value)) in entries.iter().enumerate() {
        let b = format!("item{}", i);
        out.push(Statement::new(Term::resource(uri), "hasItem", Term::bnode(&b)).with_order(i as i64));
        out.push(Statement::new(Term::bnode(&b), RDF_TYPE, Term::resource("http://example.org/Item")));
        out.push(Statement::new(Term::bnode(&b), "hasName", Term::literal(*name)));
        out.push(Statement::new(Term::bnode(&b), "hasValue", Term::literal(*value)));
    }
    out
}
