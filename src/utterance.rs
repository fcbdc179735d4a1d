//! Utterances and the candidate responses produced for them.

use serde::{Deserialize, Serialize};

use crate::preprocess;
use crate::tagger;

/// One line of user input plus its derived search key.
///
/// Immutable once built; the constructor normalizes the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    text: String,
    search_key: String,
    conversation: Option<String>,
}

impl Utterance {
    /// Normalize `raw` and derive its search key.
    pub fn new(raw: &str) -> Self {
        Self::in_conversation(raw, None)
    }

    /// Like [`Utterance::new`], tagged with a conversation/thread identifier.
    pub fn in_conversation(raw: &str, conversation: Option<String>) -> Self {
        let text = preprocess::normalize(raw);
        let search_key = tagger::bigram_pair_string(&text);
        Self {
            text,
            search_key,
            conversation,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    pub fn conversation(&self) -> Option<&str> {
        self.conversation.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A proposed reply with its confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub confidence: f32,
}

impl Candidate {
    /// Build a candidate, clamping the confidence into [0, 1].
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// The "nothing to say" candidate: empty text, zero confidence.
    pub fn empty() -> Self {
        Self::new("", 0.0)
    }

    /// Whether this is the "nothing to say" candidate.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.confidence == 0.0
    }
}
