use graphdelta_core::model::{AttributePath, ContentSchema, Statement, Term, RDF_TYPE};

pub const DM: &str = "http://example.org/dm/books";

/// Book record: one author blank node with a name, one title literal
#[allow(dead_code)]
pub fn book(uri: &str, author: &str, title: &str) -> Vec<Statement> {
    let author_node = format!("{}#author", uri);
    vec![
        Statement::new(Term::resource(uri), RDF_TYPE, Term::resource("http://example.org/Book")),
        Statement::new(Term::resource(uri), "hasAuthor", Term::bnode(&author_node)),
        Statement::new(Term::bnode(&author_node), "hasName", Term::literal(author)),
        Statement::new(Term::resource(uri), "hasTitle", Term::literal(title)),
    ]
}

/// Several books, concatenated in record order
#[allow(dead_code)]
pub fn shelf(books: &[(&str, &str, &str)]) -> Vec<Statement> {
    books
        .iter()
        .flat_map(|(uri, author, title)| book(uri, author, title))
        .collect()
}

/// Authors identify a book's entity; the title is its value
#[allow(dead_code)]
pub fn book_schema() -> ContentSchema {
    ContentSchema::new(
        vec![AttributePath::new(["hasAuthor", "hasName"]).expect("path")],
        AttributePath::new(["hasTitle"]).expect("path"),
    )
}
