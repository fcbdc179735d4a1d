//! The confidence-gated dialogue loop.
//!
//! Each cycle runs one utterance through
//! `AwaitingInput → Evaluating → {Accepted, Confirming, Teaching} → AwaitingInput`.
//! Trusted candidates are shown as-is, uncertain ones go to the human for a
//! yes/no, and when nothing usable exists the human is asked to teach a
//! response. Confirmed and taught pairings end up in the store through the
//! [`Reconciler`].
//!
//! One utterance is processed to completion before the next is read. The
//! only blocking points are the channel's `ask_*` calls.

use std::sync::atomic::{AtomicBool, Ordering};

use miette::Diagnostic;

use crate::adapter::ResponseMatcher;
use crate::channel::{Channel, ChannelError};
use crate::error::{ChatError, ChatResult};
use crate::feedback::{Provenance, Reconciler};
use crate::preprocess;
use crate::utterance::{Candidate, Utterance};

/// Prompt shown while waiting for the next utterance.
pub const LISTENING_PROMPT: &str = "I'm listening";

/// Default confidence at or above which a candidate is shown unchecked.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Where a cycle is. Only used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    AwaitingInput,
    Evaluating,
    Accepted,
    Confirming,
    Teaching,
}

/// What to do with an evaluated candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Show the candidate without asking.
    Accept(Candidate),
    /// Ask the human whether the candidate is coherent.
    Confirm(Candidate),
    /// Nothing to offer; ask the human for a response.
    Teach,
}

impl Decision {
    pub fn state(&self) -> DialogueState {
        match self {
            Decision::Accept(_) => DialogueState::Accepted,
            Decision::Confirm(_) => DialogueState::Confirming,
            Decision::Teach => DialogueState::Teaching,
        }
    }
}

/// Route a candidate by its confidence.
///
/// The empty candidate always teaches. Otherwise `confidence >= threshold`
/// accepts and anything lower asks for confirmation, including non-empty
/// text with zero confidence.
pub fn classify(candidate: &Candidate, threshold: f32) -> Decision {
    if candidate.is_empty() {
        Decision::Teach
    } else if candidate.confidence >= threshold {
        Decision::Accept(candidate.clone())
    } else {
        Decision::Confirm(candidate.clone())
    }
}

/// How a completed cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Candidate shown without a human check.
    Accepted,
    /// Human confirmed the candidate; pairing recorded.
    Confirmed,
    /// Human taught a response; pairing recorded.
    Taught,
    /// Human declined to teach; nothing recorded.
    Discarded,
    /// No yes/no answer within the retry cap; nothing recorded.
    Abandoned,
}

/// Drives cycles against a matcher, a reconciler and a channel.
pub struct DialogueLoop<M: ResponseMatcher> {
    matcher: M,
    reconciler: Reconciler,
    threshold: f32,
    conversation: Option<String>,
}

impl<M: ResponseMatcher> DialogueLoop<M> {
    pub fn new(matcher: M, reconciler: Reconciler, threshold: f32) -> Self {
        Self {
            matcher,
            reconciler,
            threshold,
            conversation: None,
        }
    }

    /// Tag recorded pairings with a conversation identifier.
    pub fn with_conversation(mut self, conversation: impl Into<String>) -> Self {
        self.conversation = Some(conversation.into());
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Best candidate for the utterance. Synchronous, never asks the human.
    pub fn evaluate(&self, utterance: &Utterance) -> ChatResult<Candidate> {
        self.matcher.best_match(utterance)
    }

    /// Run one cycle for `text`.
    ///
    /// Matcher and store errors propagate; the caller abandons the cycle.
    pub fn process(&self, text: &str, channel: &mut dyn Channel) -> ChatResult<CycleOutcome> {
        let utterance = Utterance::in_conversation(text, self.conversation.clone());
        tracing::debug!(state = ?DialogueState::Evaluating, input = utterance.text());
        let candidate = self.evaluate(&utterance)?;

        let decision = classify(&candidate, self.threshold);
        tracing::debug!(
            state = ?decision.state(),
            confidence = candidate.confidence,
            threshold = self.threshold,
            "candidate classified"
        );

        match decision {
            Decision::Accept(candidate) => {
                channel.show_response(&candidate)?;
                Ok(CycleOutcome::Accepted)
            }
            Decision::Confirm(candidate) => {
                match channel.ask_confirmation(&candidate, &utterance) {
                    Ok(true) => {
                        self.reconciler.record_valid(
                            &utterance,
                            &candidate.text,
                            Provenance::Confirmed,
                            channel,
                        )?;
                        Ok(CycleOutcome::Confirmed)
                    }
                    Ok(false) => self.teach(&utterance, channel),
                    Err(ChannelError::NoDecision { attempts }) => {
                        tracing::info!(attempts, "confirmation abandoned");
                        channel.info("No answer given, moving on.")?;
                        Ok(CycleOutcome::Abandoned)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Decision::Teach => self.teach(&utterance, channel),
        }
    }

    fn teach(&self, utterance: &Utterance, channel: &mut dyn Channel) -> ChatResult<CycleOutcome> {
        tracing::debug!(state = ?DialogueState::Teaching, input = utterance.text());
        let taught = preprocess::normalize(&channel.ask_teaching(utterance)?);
        if taught.is_empty() {
            tracing::debug!("empty teaching response discarded");
            return Ok(CycleOutcome::Discarded);
        }
        self.reconciler
            .record_valid(utterance, &taught, Provenance::Taught, channel)?;
        Ok(CycleOutcome::Taught)
    }

    /// Serve utterances until input ends or `shutdown` is set.
    ///
    /// `shutdown` is checked only between cycles. A failed cycle is logged,
    /// reported on the channel, and the loop carries on. A closed channel
    /// ends the loop normally.
    pub fn run(&self, channel: &mut dyn Channel, shutdown: &AtomicBool) -> ChatResult<()> {
        self.run_interruptible(channel, shutdown, &AtomicBool::new(false))
    }

    /// Like [`run`](Self::run), but holds `idle` true while blocked waiting
    /// for the next utterance and false for the rest of the cycle.
    ///
    /// A signal handler can consult `idle` to exit at once from the prompt
    /// while letting a running cycle finish.
    pub fn run_interruptible(
        &self,
        channel: &mut dyn Channel,
        shutdown: &AtomicBool,
        idle: &AtomicBool,
    ) -> ChatResult<()> {
        let mut cycles = 0usize;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!(cycles, "shutdown requested");
                break;
            }

            tracing::trace!(state = ?DialogueState::AwaitingInput);
            idle.store(true, Ordering::SeqCst);
            let read = channel.read_utterance(LISTENING_PROMPT);
            idle.store(false, Ordering::SeqCst);
            let Some(text) = read? else {
                tracing::info!(cycles, "input ended");
                break;
            };
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!(cycles, "shutdown requested");
                break;
            }
            if preprocess::normalize(&text).is_empty() {
                continue;
            }

            cycles += 1;
            match self.process(&text, channel) {
                Ok(outcome) => tracing::info!(?outcome, "cycle complete"),
                Err(ChatError::Channel(ChannelError::Closed)) => {
                    tracing::info!(cycles, "input ended mid-cycle");
                    break;
                }
                Err(e) => {
                    let code = e
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "semchat::cycle".to_string());
                    tracing::error!(error = %e, code = %code, "cycle abandoned");
                    channel.error(&code, &e.to_string())?;
                }
            }
        }
        Ok(())
    }
}
