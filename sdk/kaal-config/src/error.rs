//! Error taxonomy for the configuration pipeline
//!
//! - [`ParseError`]: malformed manifest syntax (line number + offending text)
//! - [`ConfigError`]: violated schema constraint (document path + offending value)
//! - [`Error`]: everything a pipeline run can fail with, including I/O
//!
//! Unrecognized capability kinds and target modes are not errors at all:
//! the synthesizer drops them without telling the caller.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Manifest syntax error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}: {content}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,

    /// The offending line, trimmed
    pub content: String,

    /// What was wrong with it
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, content: &str, message: impl Into<String>) -> Self {
        Self {
            line,
            content: content.trim().to_string(),
            message: message.into(),
        }
    }
}

/// Schema violation with document-path context
///
/// `path` uses the manifest's own addressing, e.g.
/// `containers[1].memory.physical[0].start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub path: String,
    pub message: String,
    pub value: Option<String>,
}

impl ConfigError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the offending value
    pub fn with_value(mut self, value: impl fmt::Display) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Pipeline error
#[derive(Debug, Error)]
pub enum Error {
    #[error("Manifest parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode configuration snapshot: {0}")]
    SnapshotEncode(#[from] toml::ser::Error),

    #[error("Failed to decode configuration snapshot: {0}")]
    SnapshotDecode(#[from] toml::de::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
