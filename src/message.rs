//! Structured message protocol for chatbot output.
//!
//! `ChatMessage` replaces raw `println!()` calls with typed messages that
//! different sinks render: terminal (plain), JSON (streaming), or collected
//! in memory (testing).

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// ── Message types ───────────────────────────────────────────────────────

/// A structured message emitted by the chatbot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatMessage {
    /// Status or acknowledgement text.
    System { text: String },
    /// A reply shown to the user.
    Response { text: String, confidence: f32 },
    /// Request for user input.
    Prompt { question: String },
    /// A failed cycle, reported on the conversation channel.
    Error {
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        help: Option<String>,
    },
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    pub fn prompt(question: impl Into<String>) -> Self {
        Self::Prompt {
            question: question.into(),
        }
    }
}

// ── MessageSink trait ───────────────────────────────────────────────────

/// A destination for structured chatbot messages.
pub trait MessageSink: Send + Sync {
    /// Emit a single message.
    fn emit(&self, msg: &ChatMessage);

    /// Emit a batch of messages.
    fn emit_batch(&self, msgs: &[ChatMessage]) {
        for m in msgs {
            self.emit(m);
        }
    }
}

// ── StdoutSink ──────────────────────────────────────────────────────────

/// Renders messages as plain terminal output.
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn emit(&self, msg: &ChatMessage) {
        match msg {
            ChatMessage::System { text } => println!("{text}"),
            ChatMessage::Response { text, .. } => println!("{text}"),
            ChatMessage::Prompt { question } => {
                println!("{question}");
                print!(">");
                std::io::stdout().flush().ok();
            }
            ChatMessage::Error {
                code,
                message,
                help,
            } => {
                eprintln!("[error:{code}] {message}");
                if let Some(h) = help {
                    eprintln!("  help: {h}");
                }
            }
        }
    }
}

// ── JsonSink ────────────────────────────────────────────────────────────

/// Emits messages as newline-delimited JSON.
pub struct JsonSink;

impl MessageSink for JsonSink {
    fn emit(&self, msg: &ChatMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            println!("{json}");
        }
    }
}

// ── VecSink ─────────────────────────────────────────────────────────────

/// Collects messages into a `Vec<ChatMessage>` for testing.
#[derive(Default)]
pub struct VecSink {
    messages: Mutex<Vec<ChatMessage>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected messages.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Texts of all collected `System` messages.
    pub fn system_texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                ChatMessage::System { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of collected messages.
    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageSink for VecSink {
    fn emit(&self, msg: &ChatMessage) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(msg.clone());
        }
    }
}

impl<S: MessageSink + ?Sized> MessageSink for std::sync::Arc<S> {
    fn emit(&self, msg: &ChatMessage) {
        (**self).emit(msg);
    }
}
