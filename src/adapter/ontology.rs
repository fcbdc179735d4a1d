//! Ontology resolver: turns "X is a Y" into a follow-up question.
//!
//! The object slot `Y` is resolved to a concept in the schema graph. Every
//! property whose `domainIncludes` names that concept applies to `X`; the
//! first one the graph yields becomes the question
//! `What is {property} for {X}?`. An unknown concept produces an apology
//! with confidence 0.

use std::sync::{Arc, LazyLock, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use super::LogicAdapter;
use crate::error::ChatResult;
use crate::schema::{DOMAIN_INCLUDES, Node, RANGE_INCLUDES, SchemaGraph, local_name};
use crate::utterance::{Candidate, Utterance};

static PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<instance>.+?) is a (?P<object>.+)$").unwrap());

/// The two slots of an `<instance> is a <object>` utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyPattern {
    pub instance: String,
    pub object: String,
}

impl OntologyPattern {
    /// Parse `text`; `None` unless both slots are non-empty.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PATTERN.captures(text.trim())?;
        let instance = caps.name("instance")?.as_str().trim();
        let object = caps
            .name("object")?
            .as_str()
            .trim()
            .trim_end_matches(['.', '?', '!'])
            .trim();
        if instance.is_empty() || object.is_empty() {
            return None;
        }
        Some(Self {
            instance: instance.to_string(),
            object: object.to_string(),
        })
    }
}

/// A schema concept with its human-readable label and comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptInfo {
    pub iri: String,
    pub label: String,
    pub comment: Option<String>,
}

/// A property applicable to a concept, with the types its values may take.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMatch {
    pub property: ConceptInfo,
    pub ranges: Vec<ConceptInfo>,
}

/// Scores the question built from a set of domain-matching properties.
pub trait ConfidencePolicy: Send + Sync {
    /// Confidence in [0, 1]; `matches` is never empty.
    fn score(&self, matches: &[PropertyMatch]) -> f32;
}

/// `1 / n` for `n` domain-matching properties.
///
/// A concept with a single applicable property yields an unambiguous
/// question; the more properties compete, the less the first one is trusted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecificityConfidence;

impl ConfidencePolicy for SpecificityConfidence {
    fn score(&self, matches: &[PropertyMatch]) -> f32 {
        if matches.is_empty() {
            0.0
        } else {
            1.0 / matches.len() as f32
        }
    }
}

/// Uniform confidence from a seeded generator, reproducible across runs.
#[derive(Debug)]
pub struct SeededConfidence {
    rng: Mutex<StdRng>,
}

impl SeededConfidence {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ConfidencePolicy for SeededConfidence {
    fn score(&self, _matches: &[PropertyMatch]) -> f32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0f32..=1.0),
            Err(_) => 0.0,
        }
    }
}

/// Logic adapter backed by the schema graph.
pub struct OntologyAdapter {
    graph: Arc<SchemaGraph>,
    policy: Box<dyn ConfidencePolicy>,
}

impl OntologyAdapter {
    pub fn new(graph: Arc<SchemaGraph>, policy: Box<dyn ConfidencePolicy>) -> Self {
        Self { graph, policy }
    }

    fn concept_info(&self, iri: &str) -> ChatResult<ConceptInfo> {
        let label = self
            .graph
            .preferred_label(iri)?
            .into_iter()
            .next()
            .map(|(_, node)| node.lexical().to_string())
            .unwrap_or_else(|| local_name(iri).to_string());
        Ok(ConceptInfo {
            iri: iri.to_string(),
            label,
            comment: self.graph.comment(iri)?,
        })
    }

    /// Every property whose domain includes `object`, in graph order.
    ///
    /// Names that cannot form an IRI, or concepts absent from the graph,
    /// yield an empty list.
    pub fn describe(&self, object: &str) -> ChatResult<Vec<PropertyMatch>> {
        let Some(concept) = self.graph.concept_iri(object) else {
            return Ok(Vec::new());
        };
        let domain_includes = self.graph.term(DOMAIN_INCLUDES);
        let range_includes = self.graph.term(RANGE_INCLUDES);

        let mut matches = Vec::new();
        for subject in self.graph.subjects(&domain_includes, &concept)? {
            let Some(property_iri) = subject.as_iri() else {
                continue;
            };
            let property = self.concept_info(property_iri)?;

            let mut ranges = Vec::new();
            for range in self.graph.objects(property_iri, &range_includes)? {
                if let Node::Iri(range_iri) = &range {
                    ranges.push(self.concept_info(range_iri)?);
                }
            }

            tracing::debug!(
                property = %property.label,
                ranges = ?ranges.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
                comment = property.comment.as_deref().unwrap_or(""),
                "domain-matching property"
            );
            matches.push(PropertyMatch { property, ranges });
        }
        Ok(matches)
    }

    /// Build the follow-up candidate for a parsed pattern.
    pub fn resolve_pattern(&self, pattern: &OntologyPattern) -> ChatResult<Candidate> {
        let matches = self.describe(&pattern.object)?;
        let Some(first) = matches.first() else {
            tracing::debug!(object = %pattern.object, "no domain-matching property");
            return Ok(Candidate::new(
                format!(
                    "I'm sorry I don't know what sort of thing a '{}' is.",
                    pattern.instance
                ),
                0.0,
            ));
        };

        let confidence = self.policy.score(&matches);
        Ok(Candidate::new(
            format!("What is {} for {}?", first.property.label, pattern.instance),
            confidence,
        ))
    }
}

impl LogicAdapter for OntologyAdapter {
    fn name(&self) -> &str {
        "ontology"
    }

    fn can_handle(&self, utterance: &Utterance) -> bool {
        OntologyPattern::parse(utterance.text()).is_some()
    }

    fn resolve(&self, utterance: &Utterance) -> ChatResult<Candidate> {
        match OntologyPattern::parse(utterance.text()) {
            Some(pattern) => self.resolve_pattern(&pattern),
            None => Ok(Candidate::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://schema.org/";

    const FIXTURE: &str = r#"<http://schema.org/Movie> <http://www.w3.org/2000/01/rdf-schema#label> "Movie" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#label> "musicBy" .
<http://schema.org/musicBy> <http://www.w3.org/2000/01/rdf-schema#comment> "The composer of the soundtrack." .
<http://schema.org/musicBy> <http://schema.org/domainIncludes> <http://schema.org/Movie> .
<http://schema.org/musicBy> <http://schema.org/rangeIncludes> <http://schema.org/Person> .
<http://schema.org/musicBy> <http://schema.org/rangeIncludes> <http://schema.org/MusicGroup> .
<http://schema.org/Person> <http://www.w3.org/2000/01/rdf-schema#label> "Person" .
<http://schema.org/author> <http://schema.org/domainIncludes> <http://schema.org/Book> .
<http://schema.org/isbn> <http://schema.org/domainIncludes> <http://schema.org/Book> .
"#;

    fn adapter() -> OntologyAdapter {
        let graph = SchemaGraph::from_ntriples(NS, FIXTURE.as_bytes()).unwrap();
        OntologyAdapter::new(Arc::new(graph), Box::new(SpecificityConfidence))
    }

    #[test]
    fn pattern_requires_both_slots() {
        assert_eq!(
            OntologyPattern::parse("Avengers is a Movie"),
            Some(OntologyPattern {
                instance: "Avengers".into(),
                object: "Movie".into()
            })
        );
        assert!(OntologyPattern::parse("is a Movie").is_none());
        assert!(OntologyPattern::parse("Avengers is a").is_none());
        assert!(OntologyPattern::parse("hello there").is_none());
        assert!(OntologyPattern::parse("").is_none());
    }

    #[test]
    fn pattern_is_case_insensitive_and_drops_trailing_punctuation() {
        let p = OntologyPattern::parse("Dune IS A Book.").unwrap();
        assert_eq!(p.instance, "Dune");
        assert_eq!(p.object, "Book");
    }

    #[test]
    fn known_concept_yields_question() {
        let c = adapter()
            .resolve(&Utterance::new("Avengers is a Movie"))
            .unwrap();
        assert_eq!(c.text, "What is musicBy for Avengers?");
        assert!((0.0..=1.0).contains(&c.confidence));
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn unknown_concept_yields_apology_with_zero_confidence() {
        let c = adapter().resolve(&Utterance::new("Foo is a Bar")).unwrap();
        assert_eq!(c.text, "I'm sorry I don't know what sort of thing a 'Foo' is.");
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn object_with_spaces_is_a_resolution_failure() {
        let c = adapter()
            .resolve(&Utterance::new("Rex is a good dog"))
            .unwrap();
        assert_eq!(c.confidence, 0.0);
        assert!(c.text.contains("'Rex'"));
    }

    #[test]
    fn describe_collects_ranges_and_comments() {
        let matches = adapter().describe("Movie").unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.property.label, "musicBy");
        assert_eq!(
            m.property.comment.as_deref(),
            Some("The composer of the soundtrack.")
        );
        let mut ranges: Vec<&str> = m.ranges.iter().map(|r| r.label.as_str()).collect();
        ranges.sort();
        // MusicGroup has no label in the fixture, so its local name is used.
        assert_eq!(ranges, vec!["MusicGroup", "Person"]);
    }

    #[test]
    fn specificity_divides_by_match_count() {
        let c = adapter().resolve(&Utterance::new("Dune is a Book")).unwrap();
        assert_eq!(c.confidence, 0.5);
        assert!(c.text == "What is author for Dune?" || c.text == "What is isbn for Dune?");
    }

    #[test]
    fn seeded_policy_is_reproducible() {
        let graph = Arc::new(SchemaGraph::from_ntriples(NS, FIXTURE.as_bytes()).unwrap());
        let a = OntologyAdapter::new(graph.clone(), Box::new(SeededConfidence::new(42)));
        let b = OntologyAdapter::new(graph, Box::new(SeededConfidence::new(42)));
        let u = Utterance::new("Avengers is a Movie");
        let ca = a.resolve(&u).unwrap();
        let cb = b.resolve(&u).unwrap();
        assert_eq!(ca.confidence, cb.confidence);
        assert!((0.0..=1.0).contains(&ca.confidence));
    }

    #[test]
    fn can_handle_only_matches_the_pattern() {
        let a = adapter();
        assert!(a.can_handle(&Utterance::new("Avengers is a Movie")));
        assert!(!a.can_handle(&Utterance::new("How are you?")));
    }
}
