//! XDG-compliant path resolution for semantic-chat.
//!
//! Provides `ChatPaths`, the set of directories the chatbot reads from and
//! writes to, following the XDG Base Directory Specification.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Application directory name under each XDG root.
const APP_DIR: &str = "semantic-chat";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(semchat::paths::no_home),
        help("Set the HOME environment variable or pass --data-dir explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(semchat::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Directories used by the chatbot.
#[derive(Debug, Clone)]
pub struct ChatPaths {
    /// `$XDG_CONFIG_HOME/semantic-chat/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/semantic-chat/`
    pub data_dir: PathBuf,
    /// `$XDG_CACHE_HOME/semantic-chat/`
    pub cache_dir: PathBuf,
}

impl ChatPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join(APP_DIR);

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join(APP_DIR);

        let cache_dir = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".cache"))
            .join(APP_DIR);

        Ok(Self {
            config_dir,
            data_dir,
            cache_dir,
        })
    }

    /// Root everything under a single directory (used by `--data-dir` and tests).
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    /// Path to the TOML configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Directory holding the statement database.
    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join("database")
    }

    /// Default location of the training export.
    pub fn training_export(&self) -> PathBuf {
        self.data_dir.join("output").join("training_export.json")
    }

    /// Directory holding cached ontology schema files.
    pub fn schema_dir(&self) -> PathBuf {
        self.cache_dir.join("schema-org")
    }

    /// Create all directories the chatbot writes into.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.database_dir(), &self.schema_dir()] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}
