//! Baseline matcher: closest known input by edit distance.
//!
//! Known inputs are the `in_response_to` texts of stored statements. The
//! search narrows to inputs sharing a bigram with the utterance and falls
//! back to every known input when none do. The response recorded first for
//! the closest input is returned with the similarity as its confidence.

use std::collections::HashSet;
use std::sync::Arc;

use super::LogicAdapter;
use crate::error::ChatResult;
use crate::store::StatementStore;
use crate::tagger;
use crate::utterance::{Candidate, Utterance};

/// Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Case-insensitive similarity in [0, 1], rounded to two decimals.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let ratio = 1.0 - levenshtein(&a, &b) as f32 / longest as f32;
    (ratio * 100.0).round() / 100.0
}

/// Statement-store matcher.
pub struct BestMatchAdapter {
    store: Arc<dyn StatementStore>,
    default_response: String,
}

impl BestMatchAdapter {
    pub fn new(store: Arc<dyn StatementStore>) -> Self {
        Self {
            store,
            default_response: String::new(),
        }
    }

    /// Text returned (with confidence 0) when nothing matches.
    pub fn with_default_response(mut self, text: impl Into<String>) -> Self {
        self.default_response = text.into();
        self
    }
}

impl LogicAdapter for BestMatchAdapter {
    fn name(&self) -> &str {
        "best-match"
    }

    fn can_handle(&self, utterance: &Utterance) -> bool {
        !utterance.is_empty()
    }

    fn resolve(&self, utterance: &Utterance) -> ChatResult<Candidate> {
        let statements = self.store.statements()?;

        // Distinct known inputs with their search keys, in insertion order.
        let mut seen = HashSet::new();
        let known: Vec<(&str, &str)> = statements
            .iter()
            .filter_map(|s| {
                s.in_response_to
                    .as_deref()
                    .map(|input| (input, s.search_in_response_to.as_str()))
            })
            .filter(|(input, _)| seen.insert(*input))
            .collect();

        let narrowed: Vec<&str> = known
            .iter()
            .filter(|(_, key)| tagger::keys_overlap(utterance.search_key(), key))
            .map(|(input, _)| *input)
            .collect();
        let pool: Vec<&str> = if narrowed.is_empty() {
            known.iter().map(|(input, _)| *input).collect()
        } else {
            narrowed
        };

        let mut closest: Option<(&str, f32)> = None;
        for input in pool {
            let score = similarity(utterance.text(), input);
            if closest.is_none_or(|(_, best)| score > best) {
                closest = Some((input, score));
            }
        }

        let Some((input, confidence)) = closest else {
            return Ok(Candidate::new(self.default_response.clone(), 0.0));
        };

        let response = statements
            .iter()
            .find(|s| s.in_response_to.as_deref() == Some(input));
        match response {
            Some(statement) => {
                tracing::trace!(closest = input, confidence, "closest known input");
                Ok(Candidate::new(statement.text.clone(), confidence))
            }
            None => Ok(Candidate::new(self.default_response.clone(), 0.0)),
        }
    }
}
