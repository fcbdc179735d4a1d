//! Statement storage: the knowledge store behind the matcher.
//!
//! Two backends implement [`StatementStore`]:
//!
//! - [`MemStatementStore`] — concurrent in-memory map (DashMap), lost on exit
//! - [`DurableStatementStore`] — ACID file-backed store (redb)
//!
//! The write path is append-only. Inserting a statement that already exists
//! (same text answering the same input) is a no-op, so recording a pairing
//! twice is indistinguishable from recording it once.

pub mod durable;
pub mod mem;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use durable::DurableStatementStore;
pub use mem::MemStatementStore;

use crate::error::StoreError;
use crate::tagger;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A stored statement: a response text and the input it answers (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub search_text: String,
    pub in_response_to: Option<String>,
    pub search_in_response_to: String,
    pub conversation: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Insertion order, assigned by the store.
    pub seq: u64,
}

impl Statement {
    /// Build a statement answering `in_response_to`, deriving search keys.
    pub fn new(text: impl Into<String>, in_response_to: Option<String>) -> Self {
        let text = text.into();
        let search_text = tagger::bigram_pair_string(&text);
        let search_in_response_to = in_response_to
            .as_deref()
            .map(tagger::bigram_pair_string)
            .unwrap_or_default();
        Self {
            text,
            search_text,
            in_response_to,
            search_in_response_to,
            conversation: None,
            created_at_ms: now_ms(),
            seq: 0,
        }
    }

    /// Tag the statement with a conversation identifier.
    pub fn with_conversation(mut self, conversation: Option<String>) -> Self {
        self.conversation = conversation;
        self
    }

    /// Identity key: the same text answering the same input is one statement.
    pub fn key(&self) -> String {
        match &self.in_response_to {
            Some(input) => format!("r{input}\u{1f}{}", self.text),
            None => format!("-\u{1f}{}", self.text),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Persistent statement storage consumed by the matcher and the reconciler.
pub trait StatementStore: Send + Sync {
    /// Number of stored statements.
    fn count(&self) -> StoreResult<usize>;

    /// Append a statement. Returns `false` if an identical one already exists.
    fn insert(&self, statement: Statement) -> StoreResult<bool>;

    /// All statements in insertion order.
    fn statements(&self) -> StoreResult<Vec<Statement>>;

    /// Statements answering exactly `input`, in insertion order.
    fn responses_to(&self, input: &str) -> StoreResult<Vec<Statement>> {
        Ok(self
            .statements()?
            .into_iter()
            .filter(|s| s.in_response_to.as_deref() == Some(input))
            .collect())
    }

    /// Whether the store holds no statements.
    fn is_empty(&self) -> StoreResult<bool> {
        self.count().map(|n| n == 0)
    }
}
