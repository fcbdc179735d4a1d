//! Chatbot configuration, persisted as TOML.
//!
//! Every field has a serde default so a partial (or missing) config file
//! still yields a complete `ChatConfig`. CLI flags override file values.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(semchat::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(semchat::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(semchat::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(semchat::config::invalid), help("{message}"))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// How the ontology resolver scores the follow-up questions it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceKind {
    /// `1 / n` over the number of domain-matching properties.
    Specificity,
    /// Uniform in [0, 1] from a seeded generator.
    Seeded,
}

/// Confidence policy selection for the ontology resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_confidence_kind")]
    pub kind: ConfidenceKind,
    /// Seed for [`ConfidenceKind::Seeded`]; ignored otherwise.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            kind: default_confidence_kind(),
            seed: None,
        }
    }
}

/// Where the ontology schema comes from and how it is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// N-Triples download URL for the full schema.
    #[serde(default = "default_schema_url")]
    pub url: String,
    /// Namespace the `<object>` slot is resolved in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// File name of the cached schema under the schema cache directory.
    #[serde(default = "default_schema_file")]
    pub file_name: String,
    /// Additional per-type schema files (`{namespace}{Type}.nt`) merged at load.
    #[serde(default)]
    pub extra_types: Vec<String>,
    /// HTTP timeout for schema downloads.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            url: default_schema_url(),
            namespace: default_namespace(),
            file_name: default_schema_file(),
            extra_types: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SchemaConfig {
    /// Download URL for a single type's schema file.
    pub fn type_url(&self, type_name: &str) -> String {
        format!("{}{type_name}.nt", self.namespace.replacen("http://", "https://", 1))
    }
}

/// Top-level chatbot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Display name of the bot.
    #[serde(default = "default_name")]
    pub name: String,
    /// Candidates at or above this confidence are shown without confirmation.
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    /// Train an empty store from the bundled corpus on startup.
    #[serde(default = "default_true")]
    pub seed_if_empty: bool,
    /// Re-prompts allowed when a confirmation answer is neither yes nor no.
    #[serde(default = "default_attempts")]
    pub max_confirmation_attempts: usize,
    #[serde(default)]
    pub confidence_policy: ConfidenceConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

fn default_name() -> String {
    "Terminal".into()
}
fn default_threshold() -> f32 {
    0.8
}
fn default_true() -> bool {
    true
}
fn default_attempts() -> usize {
    3
}
fn default_confidence_kind() -> ConfidenceKind {
    ConfidenceKind::Specificity
}
fn default_schema_url() -> String {
    "http://schema.org/version/latest/schema.nt".into()
}
fn default_namespace() -> String {
    "http://schema.org/".into()
}
fn default_schema_file() -> String {
    "schema.nt".into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            confidence_threshold: default_threshold(),
            seed_if_empty: default_true(),
            max_confirmation_attempts: default_attempts(),
            confidence_policy: ConfidenceConfig::default(),
            schema: SchemaConfig::default(),
        }
    }
}

impl ChatConfig {
    /// Create a config with a specific bot name (other fields default).
    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Reject values the dialogue loop cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "confidence_threshold must be within [0, 1], got {}",
                    self.confidence_threshold
                ),
            });
        }
        if self.max_confirmation_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_confirmation_attempts must be at least 1".into(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "name must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
