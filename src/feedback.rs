//! Human feedback: yes/no parsing and recording validated pairings.
//!
//! Two upstream events lead to a pairing being recorded: an uncertain
//! candidate the user confirmed, and a response the user taught. Both end
//! in [`Reconciler::record_valid`], and the store never sees which one it was.

use std::sync::Arc;

use crate::channel::{Channel, ChannelError, ChannelResult};
use crate::error::ChatResult;
use crate::store::{Statement, StatementStore};
use crate::utterance::Utterance;

/// Interpret a confirmation answer.
///
/// The first word that is a yes (`yes`, `y`, `yeah`, `yep`, `yup`) or a no
/// (`no`, `n`, `nope`, `nah`), in any case, decides. Words that merely
/// contain one, like "know" or "eyes", do not count.
pub fn parse_feedback(text: &str) -> Option<bool> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .find_map(|word| match word.as_str() {
            "yes" | "y" | "yeah" | "yep" | "yup" => Some(true),
            "no" | "n" | "nope" | "nah" => Some(false),
            _ => None,
        })
}

/// Keep asking until an answer parses or `max_attempts` answers were rejected.
///
/// `read` returns `None` when input has ended. `reprompt` runs after each
/// rejected answer except the last.
pub fn ask_until_decided(
    max_attempts: usize,
    mut read: impl FnMut() -> ChannelResult<Option<String>>,
    mut reprompt: impl FnMut() -> ChannelResult<()>,
) -> ChannelResult<bool> {
    for attempt in 1..=max_attempts {
        let answer = read()?.ok_or(ChannelError::Closed)?;
        if let Some(decision) = parse_feedback(&answer) {
            return Ok(decision);
        }
        tracing::debug!(attempt, answer = %answer, "confirmation answer not understood");
        if attempt < max_attempts {
            reprompt()?;
        }
    }
    Err(ChannelError::NoDecision {
        attempts: max_attempts,
    })
}

/// Where a validated pairing came from. Only used for acknowledgements and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// An existing candidate the user confirmed.
    Confirmed,
    /// A fresh response the user taught.
    Taught,
}

/// Commits human-validated pairings to the statement store.
pub struct Reconciler {
    store: Arc<dyn StatementStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn StatementStore>) -> Self {
        Self { store }
    }

    /// Record `response` as a valid reply to `utterance` and acknowledge it.
    ///
    /// Idempotent: recording the same pair again changes nothing in the store.
    pub fn record_valid(
        &self,
        utterance: &Utterance,
        response: &str,
        provenance: Provenance,
        channel: &mut dyn Channel,
    ) -> ChatResult<()> {
        let statement = Statement::new(response, Some(utterance.text().to_string()))
            .with_conversation(utterance.conversation().map(str::to_string));
        let inserted = self.store.insert(statement)?;
        tracing::info!(
            input = utterance.text(),
            response,
            ?provenance,
            inserted,
            "valid pairing recorded"
        );

        channel.info("Confirmed response.")?;
        if provenance == Provenance::Taught {
            channel.info("Response added to database.")?;
        }
        Ok(())
    }
}
