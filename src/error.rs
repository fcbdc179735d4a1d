//! Rich diagnostic error types for semantic-chat.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know exactly
//! what went wrong at startup or during a dialogue cycle.

use miette::Diagnostic;
use thiserror::Error;

use crate::channel::ChannelError;
use crate::config::ConfigError;
use crate::corpus::CorpusError;
use crate::paths::PathError;

/// Top-level error type for the chatbot.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ChatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(semchat::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(semchat::store::redb),
        help(
            "The statement database encountered a transaction error. \
             Another process may hold the database open, or the file is corrupt. \
             Try running with a fresh --data-dir."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(semchat::store::serde),
        help(
            "Failed to serialize or deserialize a stored statement. \
             The on-disk format may come from an incompatible version; \
             move the database aside and retrain."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("failed to download schema from {url}: {message}")]
    #[diagnostic(
        code(semchat::schema::download),
        help(
            "The ontology schema could not be fetched. Check network access, \
             or place an N-Triples file at the cache path and restart."
        )
    )]
    Download { url: String, message: String },

    #[error("schema cache I/O error at {path}")]
    #[diagnostic(
        code(semchat::schema::io),
        help("Check that the cache directory is writable and the disk is not full.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema file {path}: {message}")]
    #[diagnostic(
        code(semchat::schema::parse),
        help(
            "The cached schema is not valid N-Triples. Delete it so it is \
             downloaded again on the next start."
        )
    )]
    Parse { path: String, message: String },

    #[error("SPARQL query error: {message}")]
    #[diagnostic(
        code(semchat::schema::sparql),
        help("The schema graph rejected a query. This is a bug; please report it.")
    )]
    Sparql { message: String },

    #[error("schema graph is empty after loading {path}")]
    #[diagnostic(
        code(semchat::schema::empty),
        help("The schema file contained no triples. Delete it and restart to re-download.")
    )]
    Empty { path: String },
}

/// Convenience alias for functions returning chatbot results.
pub type ChatResult<T> = std::result::Result<T, ChatError>;
