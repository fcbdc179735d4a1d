//! Conversation corpora: bootstrap training and training-data export.
//!
//! A corpus pack is a TOML file of conversations, each an ordered list of
//! lines where every line answers the one before it. Three packs are bundled
//! into the binary: `greetings`, `conversations`, and `botprofile`.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ChatResult;
use crate::store::{Statement, StatementStore};

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("failed to parse corpus pack \"{id}\": {message}")]
    #[diagnostic(
        code(semchat::corpus::parse),
        help("Check the pack's TOML syntax: a [corpus] table and [[conversations]] with `lines`.")
    )]
    Parse { id: String, message: String },

    #[error("failed to read corpus file: {path}")]
    #[diagnostic(code(semchat::corpus::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write training export to {path}: {message}")]
    #[diagnostic(
        code(semchat::corpus::export),
        help("Check that the output directory is writable.")
    )]
    Export { path: String, message: String },
}

pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

// ── Data model ──────────────────────────────────────────────────────────

/// A named bundle of conversations.
#[derive(Debug, Clone)]
pub struct CorpusPack {
    pub id: String,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub conversations: Vec<Vec<String>>,
}

/// Report after training from one pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingReport {
    pub id: String,
    pub conversations: usize,
    pub statements_added: usize,
    pub statements_skipped: usize,
}

#[derive(Debug, Deserialize)]
struct CorpusToml {
    corpus: CorpusMeta,
    #[serde(default)]
    conversations: Vec<ConversationToml>,
}

#[derive(Debug, Deserialize)]
struct CorpusMeta {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationToml {
    lines: Vec<String>,
}

// ── Bundled packs ───────────────────────────────────────────────────────

const GREETINGS_TOML: &str = include_str!("../../data/corpus/greetings.toml");
const CONVERSATIONS_TOML: &str = include_str!("../../data/corpus/conversations.toml");
const BOTPROFILE_TOML: &str = include_str!("../../data/corpus/botprofile.toml");

/// Parse one pack from TOML text.
pub fn parse_corpus_toml(toml_str: &str) -> CorpusResult<CorpusPack> {
    let parsed: CorpusToml = toml::from_str(toml_str).map_err(|e| CorpusError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;
    Ok(CorpusPack {
        id: parsed.corpus.id,
        name: parsed.corpus.name,
        description: parsed.corpus.description,
        categories: parsed.corpus.categories,
        conversations: parsed
            .conversations
            .into_iter()
            .map(|c| c.lines)
            .collect(),
    })
}

/// Load a pack from a file on disk.
pub fn load_corpus_file(path: &Path) -> CorpusResult<CorpusPack> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_corpus_toml(&content).map_err(|e| match e {
        CorpusError::Parse { message, .. } => CorpusError::Parse {
            id: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// The packs compiled into the binary. Broken packs are skipped with a warning.
pub fn bundled_packs() -> Vec<CorpusPack> {
    [
        (GREETINGS_TOML, "greetings"),
        (CONVERSATIONS_TOML, "conversations"),
        (BOTPROFILE_TOML, "botprofile"),
    ]
    .iter()
    .filter_map(|(toml, id)| match parse_corpus_toml(toml) {
        Ok(pack) => Some(pack),
        Err(e) => {
            tracing::warn!(corpus = id, "Failed to parse bundled corpus: {e}");
            None
        }
    })
    .collect()
}

// ── Training ────────────────────────────────────────────────────────────

/// Store every line of every conversation as a response to the line before.
///
/// The first line of a conversation is stored with no input. Lines are
/// normalized the same way utterances are. Re-training is a no-op for
/// pairings already present.
pub fn train(pack: &CorpusPack, store: &dyn StatementStore) -> ChatResult<TrainingReport> {
    let mut report = TrainingReport {
        id: pack.id.clone(),
        conversations: pack.conversations.len(),
        ..Default::default()
    };

    for conversation in &pack.conversations {
        let mut previous: Option<String> = None;
        for line in conversation {
            let text = crate::preprocess::normalize(line);
            if text.is_empty() {
                continue;
            }
            let statement = Statement::new(text.clone(), previous.take())
                .with_conversation(Some(format!("training:{}", pack.id)));
            if store.insert(statement)? {
                report.statements_added += 1;
            } else {
                report.statements_skipped += 1;
            }
            previous = Some(text);
        }
    }

    tracing::info!(
        corpus = %report.id,
        conversations = report.conversations,
        added = report.statements_added,
        skipped = report.statements_skipped,
        "corpus trained"
    );
    Ok(report)
}

/// Train from every bundled pack.
pub fn train_bundled(store: &dyn StatementStore) -> ChatResult<Vec<TrainingReport>> {
    bundled_packs()
        .iter()
        .map(|pack| train(pack, store))
        .collect()
}

// ── Export ──────────────────────────────────────────────────────────────

/// Shape of the training export file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExport {
    pub conversations: Vec<[String; 2]>,
}

/// Every `[input, response]` pair in the store, in insertion order.
pub fn training_pairs(store: &dyn StatementStore) -> ChatResult<TrainingExport> {
    let conversations = store
        .statements()?
        .into_iter()
        .filter_map(|s| s.in_response_to.map(|input| [input, s.text]))
        .collect();
    Ok(TrainingExport { conversations })
}

/// Write the training pairs as pretty JSON to `path`, creating parent dirs.
pub fn export_for_training(store: &dyn StatementStore, path: &Path) -> ChatResult<usize> {
    let export = training_pairs(store)?;
    let to_export_error = |message: String| CorpusError::Export {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| to_export_error(e.to_string()))?;
    }
    let json =
        serde_json::to_string_pretty(&export).map_err(|e| to_export_error(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| to_export_error(e.to_string()))?;

    tracing::info!(path = %path.display(), pairs = export.conversations.len(), "training data exported");
    Ok(export.conversations.len())
}
