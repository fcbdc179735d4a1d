//! Scripted channel: replays canned answers and records what was shown.

use std::collections::VecDeque;

use super::{Channel, ChannelError, ChannelResult};
use crate::feedback::ask_until_decided;
use crate::utterance::{Candidate, Utterance};

/// Something the dialogue loop did to a [`ScriptedChannel`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Info(String),
    Shown(Candidate),
    Confirm { response: String, utterance: String },
    Reprompt,
    Teach { utterance: String },
    Prompt(String),
    Error { code: String, message: String },
}

/// A channel whose human side is a fixed queue of answers.
///
/// Every answer, whether an utterance, a yes/no or a taught response, is
/// taken from the same queue in order. An exhausted queue behaves like a
/// closed terminal.
#[derive(Debug)]
pub struct ScriptedChannel {
    answers: VecDeque<String>,
    events: Vec<ChannelEvent>,
    max_attempts: usize,
}

impl ScriptedChannel {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            events: Vec::new(),
            max_attempts: 3,
        }
    }

    /// Cap on unparseable confirmation answers.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Every recorded event, oldest first.
    pub fn events(&self) -> &[ChannelEvent] {
        &self.events
    }

    /// Texts of the `info` messages.
    pub fn infos(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChannelEvent::Info(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Candidates shown as trusted responses.
    pub fn shown(&self) -> Vec<Candidate> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ChannelEvent::Shown(c) => Some(c.clone()),
                _ => None,
            })
            .collect()
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Channel for ScriptedChannel {
    fn info(&mut self, message: &str) -> ChannelResult<()> {
        self.events.push(ChannelEvent::Info(message.to_string()));
        Ok(())
    }

    fn show_response(&mut self, response: &Candidate) -> ChannelResult<()> {
        self.events.push(ChannelEvent::Shown(response.clone()));
        Ok(())
    }

    fn ask_confirmation(
        &mut self,
        response: &Candidate,
        utterance: &Utterance,
    ) -> ChannelResult<bool> {
        self.events.push(ChannelEvent::Confirm {
            response: response.text.clone(),
            utterance: utterance.text().to_string(),
        });

        let answers = &mut self.answers;
        let events = &mut self.events;
        ask_until_decided(
            self.max_attempts,
            || Ok(answers.pop_front()),
            || {
                events.push(ChannelEvent::Reprompt);
                Ok(())
            },
        )
    }

    fn ask_teaching(&mut self, utterance: &Utterance) -> ChannelResult<String> {
        self.events.push(ChannelEvent::Teach {
            utterance: utterance.text().to_string(),
        });
        self.answers.pop_front().ok_or(ChannelError::Closed)
    }

    fn read_utterance(&mut self, prompt: &str) -> ChannelResult<Option<String>> {
        self.events.push(ChannelEvent::Prompt(prompt.to_string()));
        Ok(self.answers.pop_front())
    }

    fn error(&mut self, code: &str, message: &str) -> ChannelResult<()> {
        self.events.push(ChannelEvent::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
