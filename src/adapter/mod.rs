//! Candidate generation: logic adapters composed into a matcher.
//!
//! Each [`LogicAdapter`] decides whether it applies to an utterance and, if
//! so, proposes a [`Candidate`]. The [`AdapterChain`] asks every applicable
//! adapter and keeps the most confident answer; on ties the adapter listed
//! first wins.

pub mod best_match;
pub mod ontology;

pub use best_match::BestMatchAdapter;
pub use ontology::{
    ConfidencePolicy, OntologyAdapter, OntologyPattern, PropertyMatch, SeededConfidence,
    SpecificityConfidence,
};

use crate::error::ChatResult;
use crate::utterance::{Candidate, Utterance};

/// A source of candidate responses for some shape of utterance.
pub trait LogicAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this adapter recognizes the utterance. Not an error when false.
    fn can_handle(&self, utterance: &Utterance) -> bool;

    /// Produce a candidate. Only called when [`LogicAdapter::can_handle`] is true.
    fn resolve(&self, utterance: &Utterance) -> ChatResult<Candidate>;
}

/// The matching engine as seen by the dialogue loop.
pub trait ResponseMatcher {
    /// Best candidate for the utterance. Synchronous; never waits on a human.
    fn best_match(&self, utterance: &Utterance) -> ChatResult<Candidate>;
}

/// Ordered list of adapters.
#[derive(Default)]
pub struct AdapterChain {
    adapters: Vec<Box<dyn LogicAdapter>>,
}

impl AdapterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter; earlier adapters win confidence ties.
    pub fn with(mut self, adapter: impl LogicAdapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Names of the registered adapters, in order.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl ResponseMatcher for AdapterChain {
    fn best_match(&self, utterance: &Utterance) -> ChatResult<Candidate> {
        let mut best: Option<Candidate> = None;

        for adapter in &self.adapters {
            if !adapter.can_handle(utterance) {
                tracing::trace!(adapter = adapter.name(), "adapter not applicable");
                continue;
            }
            let candidate = adapter.resolve(utterance)?;
            tracing::debug!(
                adapter = adapter.name(),
                confidence = candidate.confidence,
                text = %candidate.text,
                "candidate proposed"
            );
            let better = best
                .as_ref()
                .is_none_or(|b| candidate.confidence > b.confidence);
            if better {
                best = Some(candidate);
            }
        }

        Ok(best.unwrap_or_else(Candidate::empty))
    }
}

impl std::fmt::Debug for AdapterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterChain")
            .field("adapters", &self.names())
            .finish()
    }
}
