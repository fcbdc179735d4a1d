//! Line-oriented terminal channel.

use std::io::BufRead;

use super::{
    Channel, ChannelError, ChannelResult, YES_NO_REPROMPT, confirmation_question,
    teaching_question,
};
use crate::feedback::ask_until_decided;
use crate::message::{ChatMessage, MessageSink};
use crate::utterance::{Candidate, Utterance};

/// Reads answers line by line from `input` and renders output through a sink.
pub struct TerminalChannel<R: BufRead> {
    input: R,
    sink: Box<dyn MessageSink>,
    max_attempts: usize,
}

impl<R: BufRead> TerminalChannel<R> {
    pub fn new(input: R, sink: Box<dyn MessageSink>, max_attempts: usize) -> Self {
        Self {
            input,
            sink,
            max_attempts: max_attempts.max(1),
        }
    }
}

/// One line without its terminator; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> ChannelResult<Option<String>> {
    let mut line = String::new();
    let n = input
        .read_line(&mut line)
        .map_err(|e| ChannelError::Io { source: e })?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

impl<R: BufRead> Channel for TerminalChannel<R> {
    fn info(&mut self, message: &str) -> ChannelResult<()> {
        self.sink.emit(&ChatMessage::system(message));
        Ok(())
    }

    fn show_response(&mut self, response: &Candidate) -> ChannelResult<()> {
        self.sink.emit(&ChatMessage::Response {
            text: response.text.clone(),
            confidence: response.confidence,
        });
        Ok(())
    }

    fn ask_confirmation(
        &mut self,
        response: &Candidate,
        utterance: &Utterance,
    ) -> ChannelResult<bool> {
        self.sink
            .emit(&ChatMessage::prompt(confirmation_question(response, utterance)));

        let input = &mut self.input;
        let sink = &self.sink;
        ask_until_decided(
            self.max_attempts,
            || read_line(input),
            || {
                sink.emit(&ChatMessage::prompt(YES_NO_REPROMPT));
                Ok(())
            },
        )
    }

    fn ask_teaching(&mut self, utterance: &Utterance) -> ChannelResult<String> {
        self.sink
            .emit(&ChatMessage::prompt(teaching_question(utterance)));
        read_line(&mut self.input)?.ok_or(ChannelError::Closed)
    }

    fn read_utterance(&mut self, prompt: &str) -> ChannelResult<Option<String>> {
        self.sink.emit(&ChatMessage::prompt(prompt));
        read_line(&mut self.input)
    }

    fn error(&mut self, code: &str, message: &str) -> ChannelResult<()> {
        self.sink.emit(&ChatMessage::Error {
            code: code.to_string(),
            message: message.to_string(),
            help: None,
        });
        Ok(())
    }
}
