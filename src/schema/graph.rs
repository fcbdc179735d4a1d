//! Read-only schema graph backed by an in-memory oxigraph store.
//!
//! The graph is loaded once from N-Triples and never mutated afterwards, so
//! a single `SchemaGraph` can be shared (`Arc`) across resolver calls.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use oxigraph::io::RdfFormat;
use oxigraph::model::{NamedNode, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use super::{Node, RDFS_COMMENT, RDFS_LABEL, SKOS_PREF_LABEL, SchemaResult};
use crate::error::SchemaError;

/// Label properties consulted by [`SchemaGraph::preferred_label`], in order.
const LABEL_PROPERTIES: [&str; 2] = [SKOS_PREF_LABEL, RDFS_LABEL];

/// Queryable ontology graph.
pub struct SchemaGraph {
    store: Store,
    namespace: String,
}

fn sparql_err<E: std::fmt::Display>(e: E) -> SchemaError {
    SchemaError::Sparql {
        message: e.to_string(),
    }
}

fn to_node(term: &Term) -> Option<Node> {
    match term {
        Term::NamedNode(n) => Some(Node::Iri(n.as_str().to_string())),
        Term::BlankNode(b) => Some(Node::Blank(b.as_str().to_string())),
        Term::Literal(l) => Some(Node::Literal {
            value: l.value().to_string(),
            language: l.language().map(str::to_string),
        }),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn iri(value: &str) -> SchemaResult<NamedNode> {
    NamedNode::new(value).map_err(|e| SchemaError::Sparql {
        message: format!("invalid IRI {value:?}: {e}"),
    })
}

impl SchemaGraph {
    /// Create an empty graph for `namespace`.
    pub fn empty(namespace: &str) -> SchemaResult<Self> {
        let store = Store::new().map_err(|e| SchemaError::Sparql {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self {
            store,
            namespace: namespace.to_string(),
        })
    }

    /// Load and merge one or more cached N-Triples files.
    ///
    /// Fails if any file is unreadable or malformed, or if the merged graph
    /// holds no triples at all.
    pub fn load<P: AsRef<Path>>(namespace: &str, files: &[P]) -> SchemaResult<Self> {
        let graph = Self::empty(namespace)?;
        for path in files {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| SchemaError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            graph
                .store
                .load_from_reader(RdfFormat::NTriples, BufReader::new(file))
                .map_err(|e| SchemaError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            tracing::debug!(path = %path.display(), "merged schema file");
        }

        let len = graph.len()?;
        if len == 0 {
            let path = files
                .first()
                .map(|p| p.as_ref().display().to_string())
                .unwrap_or_default();
            return Err(SchemaError::Empty { path });
        }
        tracing::info!(triples = len, "schema graph loaded");
        Ok(graph)
    }

    /// Build a graph from an in-memory N-Triples document.
    pub fn from_ntriples(namespace: &str, data: &[u8]) -> SchemaResult<Self> {
        let graph = Self::empty(namespace)?;
        graph
            .store
            .load_from_reader(RdfFormat::NTriples, data)
            .map_err(|e| SchemaError::Parse {
                path: "<memory>".into(),
                message: e.to_string(),
            })?;
        Ok(graph)
    }

    /// Namespace that bare concept names are resolved in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of triples in the graph.
    pub fn len(&self) -> SchemaResult<usize> {
        self.store.len().map_err(sparql_err)
    }

    pub fn is_empty(&self) -> SchemaResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// IRI for a bare concept name in this graph's namespace.
    ///
    /// Returns `None` when the name cannot form a valid IRI (e.g. it contains
    /// spaces); such a concept can never be in the graph.
    pub fn concept_iri(&self, name: &str) -> Option<String> {
        let candidate = format!("{}{}", self.namespace, name.trim());
        NamedNode::new(candidate).ok().map(NamedNode::into_string)
    }

    /// IRI for a term in this graph's namespace (e.g. `domainIncludes`).
    pub fn term(&self, local: &str) -> String {
        format!("{}{local}", self.namespace)
    }

    /// Whether `iri` occurs as the subject of any triple.
    pub fn contains(&self, concept: &str) -> SchemaResult<bool> {
        let concept = iri(concept)?;
        let query = format!("ASK {{ {concept} ?p ?o }}");
        match self.store.query(query.as_str()).map_err(sparql_err)? {
            QueryResults::Boolean(b) => Ok(b),
            _ => Err(SchemaError::Sparql {
                message: "expected boolean result from ASK query".into(),
            }),
        }
    }

    /// Single-variable SELECT, in store iteration order.
    fn select(&self, query: &str, var: &str) -> SchemaResult<Vec<Node>> {
        match self.store.query(query).map_err(sparql_err)? {
            QueryResults::Solutions(solutions) => {
                let mut nodes = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(sparql_err)?;
                    if let Some(node) = solution.get(var).and_then(to_node) {
                        nodes.push(node);
                    }
                }
                Ok(nodes)
            }
            _ => Err(SchemaError::Sparql {
                message: "expected solutions from SELECT query".into(),
            }),
        }
    }

    /// All `o` with `(subject, predicate, o)` in the graph.
    pub fn objects(&self, subject: &str, predicate: &str) -> SchemaResult<Vec<Node>> {
        let query = format!("SELECT ?o WHERE {{ {} {} ?o }}", iri(subject)?, iri(predicate)?);
        self.select(&query, "o")
    }

    /// All `s` with `(s, predicate, object)` in the graph, `object` being an IRI.
    pub fn subjects(&self, predicate: &str, object: &str) -> SchemaResult<Vec<Node>> {
        let query = format!("SELECT ?s WHERE {{ ?s {} {} }}", iri(predicate)?, iri(object)?);
        self.select(&query, "s")
    }

    /// `(label property, label)` pairs from the first label property that has any.
    ///
    /// `skos:prefLabel` wins over `rdfs:label`.
    pub fn preferred_label(&self, concept: &str) -> SchemaResult<Vec<(String, Node)>> {
        for property in LABEL_PROPERTIES {
            let labels: Vec<(String, Node)> = self
                .objects(concept, property)?
                .into_iter()
                .filter(|n| matches!(n, Node::Literal { .. }))
                .map(|n| (property.to_string(), n))
                .collect();
            if !labels.is_empty() {
                return Ok(labels);
            }
        }
        Ok(Vec::new())
    }

    /// The first `rdfs:comment` of `concept`, if any.
    pub fn comment(&self, concept: &str) -> SchemaResult<Option<String>> {
        Ok(self
            .objects(concept, RDFS_COMMENT)?
            .into_iter()
            .find_map(|n| match n {
                Node::Literal { value, .. } => Some(value),
                _ => None,
            }))
    }
}

impl std::fmt::Debug for SchemaGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGraph")
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DOMAIN_INCLUDES;

    const NS: &str = "http://schema.org/";

    const FIXTURE: &str = r#"<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#label> "Movie" .
<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#comment> "A movie." .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#label> "musicBy" .
<http://schema.org/musicBy> <http://schema.org/domainIncludes> <http://schema.org/Movie> .
<http://schema.org/musicBy> <http://schema.org/rangeIncludes> <http://schema.org/Person> .
<http://schema.org/Person> <http://www.w3.org/2004/02/skos/core#prefLabel> "Person"@en .
<http://schema.org/Person> <http://www.w3.org/2000/01/rdf-schema#label> "Human" .
"#;

    fn graph() -> SchemaGraph {
        SchemaGraph::from_ntriples(NS, FIXTURE.as_bytes()).unwrap()
    }

    #[test]
    fn loads_all_triples() {
        assert_eq!(graph().len().unwrap(), 7);
    }

    #[test]
    fn subjects_and_objects() {
        let g = graph();
        let movie = g.concept_iri("Movie").unwrap();
        let props = g.subjects(&g.term(DOMAIN_INCLUDES), &movie).unwrap();
        assert_eq!(props, vec![Node::Iri("http://schema.org/musicBy".into())]);

        let ranges = g
            .objects("http://schema.org/musicBy", &g.term("rangeIncludes"))
            .unwrap();
        assert_eq!(ranges, vec![Node::Iri("http://schema.org/Person".into())]);
    }

    #[test]
    fn pref_label_wins_over_rdfs_label() {
        let g = graph();
        let labels = g.preferred_label("http://schema.org/Person").unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].0, SKOS_PREF_LABEL);
        assert_eq!(labels[0].1.lexical(), "Person");

        let labels = g.preferred_label("http://schema.org/musicBy").unwrap();
        assert_eq!(labels[0].0, RDFS_LABEL);
        assert_eq!(labels[0].1.lexical(), "musicBy");
    }

    #[test]
    fn comment_lookup() {
        let g = graph();
        assert_eq!(
            g.comment("http://schema.org/Movie").unwrap().as_deref(),
            Some("A movie.")
        );
        assert_eq!(g.comment("http://schema.org/Person").unwrap(), None);
    }

    #[test]
    fn invalid_concept_names_have_no_iri() {
        let g = graph();
        assert!(g.concept_iri("Movie Theater").is_none());
        assert!(g.contains(&g.concept_iri("Movie").unwrap()).unwrap());
        assert!(!g.contains(&g.concept_iri("Bar").unwrap()).unwrap());
    }

    #[test]
    fn load_from_files_merges_and_rejects_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("schema.nt");
        let extra = dir.path().join("Book.nt");
        std::fs::write(&base, FIXTURE).unwrap();
        std::fs::write(
            &extra,
            "<http://schema.org/isbn> <http://schema.org/domainIncludes> <http://schema.org/Book> .\n",
        )
        .unwrap();
        let g = SchemaGraph::load(NS, &[&base, &extra]).unwrap();
        assert_eq!(g.len().unwrap(), 8);

        let empty = dir.path().join("empty.nt");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            SchemaGraph::load(NS, &[&empty]),
            Err(SchemaError::Empty { .. })
        ));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let bad = dir.path().join("bad.nt");
        std::fs::write(&bad, "this is not n-triples\n").unwrap();
        assert!(matches!(
            SchemaGraph::load(NS, &[&bad]),
            Err(SchemaError::Parse { .. })
        ));
    }
}
