//! The conversation surface the dialogue loop talks to.
//!
//! A [`Channel`] delivers utterances to the loop and carries everything the
//! loop needs from the human: acknowledgements, accepted responses,
//! confirmation questions and teaching requests. [`TerminalChannel`] serves
//! a single user on a text terminal; [`ScriptedChannel`] replays canned
//! answers for tests.

pub mod scripted;
pub mod terminal;

use miette::Diagnostic;
use thiserror::Error;

pub use scripted::{ChannelEvent, ScriptedChannel};
pub use terminal::TerminalChannel;

use crate::utterance::{Candidate, Utterance};

// ── Errors ───────────────────────────────────────────────────────────────

/// Errors from the conversation channel.
#[derive(Debug, Error, Diagnostic)]
pub enum ChannelError {
    #[error("input closed")]
    #[diagnostic(
        code(semchat::channel::closed),
        help("The input stream ended (Ctrl-D or end of piped input).")
    )]
    Closed,

    #[error("no yes/no answer after {attempts} attempt(s)")]
    #[diagnostic(
        code(semchat::channel::no_decision),
        help("Answer confirmation questions with \"yes\" or \"no\".")
    )]
    NoDecision { attempts: usize },

    #[error("channel I/O error")]
    #[diagnostic(
        code(semchat::channel::io),
        help("Reading from or writing to the terminal failed.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for channel operations.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

// ── Channel trait ────────────────────────────────────────────────────────

/// A single synchronous conversation with one human.
///
/// The `ask_*` methods block until the human answers; they are the only
/// points where the dialogue loop waits.
pub trait Channel {
    /// Show a status or acknowledgement message.
    fn info(&mut self, message: &str) -> ChannelResult<()>;

    /// Show a response the loop trusts.
    fn show_response(&mut self, response: &Candidate) -> ChannelResult<()>;

    /// Ask whether `response` is a coherent reply to `utterance`.
    fn ask_confirmation(
        &mut self,
        response: &Candidate,
        utterance: &Utterance,
    ) -> ChannelResult<bool>;

    /// Ask for a replacement response; an empty string means "skip".
    fn ask_teaching(&mut self, utterance: &Utterance) -> ChannelResult<String>;

    /// Wait for the next utterance. `None` when input has ended.
    fn read_utterance(&mut self, prompt: &str) -> ChannelResult<Option<String>>;

    /// Report a failed cycle.
    fn error(&mut self, code: &str, message: &str) -> ChannelResult<()> {
        self.info(&format!("[error:{code}] {message}"))
    }
}

/// Confirmation question shown for an uncertain candidate.
pub fn confirmation_question(response: &Candidate, utterance: &Utterance) -> String {
    format!(
        "Is \"{}\" a coherent response to \"{}\"?",
        response.text,
        utterance.text()
    )
}

/// Teaching request shown when no trusted answer exists.
pub fn teaching_question(utterance: &Utterance) -> String {
    format!("teach me about: {}", utterance.text())
}

/// Re-prompt after an answer that was neither yes nor no.
pub const YES_NO_REPROMPT: &str = "Please type either \"Yes\" or \"No\"";
