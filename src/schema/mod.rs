//! Ontology schema: download, cache and query the schema.org graph.
//!
//! - [`fetch`] — one-time download of N-Triples files into the local cache
//! - [`graph`] — read-only, SPARQL-backed [`SchemaGraph`] with the lookup
//!   primitives the ontology resolver needs

pub mod fetch;
pub mod graph;

use std::fmt;

pub use fetch::{HttpSchemaSource, SchemaSource, StaticSchemaSource, ensure_cached};
pub use graph::SchemaGraph;

use crate::error::SchemaError;

/// Result type for schema operations.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";

/// Local name of the property linking a property to the types it applies to.
pub const DOMAIN_INCLUDES: &str = "domainIncludes";
/// Local name of the property linking a property to the types of its values.
pub const RANGE_INCLUDES: &str = "rangeIncludes";

/// A term read back from the schema graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Iri(String),
    Literal {
        value: String,
        language: Option<String>,
    },
    Blank(String),
}

impl Node {
    /// The IRI, if this node is one.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// IRI string, literal value or blank node id.
    pub fn lexical(&self) -> &str {
        match self {
            Node::Iri(iri) => iri,
            Node::Literal { value, .. } => value,
            Node::Blank(id) => id,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Literal {
                value,
                language: Some(lang),
            } => write!(f, "\"{value}\"@{lang}"),
            Node::Literal { value, .. } => write!(f, "\"{value}\""),
            Node::Blank(id) => write!(f, "_:{id}"),
        }
    }
}

/// Last path or fragment segment of an IRI (`http://schema.org/musicBy` → `musicBy`).
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['/', '#']).next().unwrap_or(iri)
}
