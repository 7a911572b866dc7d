//! Error types for text concatenation

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConcatError>;

/// Errors that can occur while resolving, reading or loading concat-text inputs
#[derive(Error, Debug, Diagnostic)]
pub enum ConcatError {
    /// The `files` pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {source}")]
    #[diagnostic(
        code(fob::concat_text::invalid_pattern),
        help("Check the `files` option for unbalanced brackets or braces")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The filesystem walk behind the pattern failed
    #[error("Failed to resolve glob pattern '{pattern}': {source}")]
    #[diagnostic(code(fob::concat_text::walk_failed))]
    Walk {
        pattern: String,
        #[source]
        source: walkdir::Error,
    },

    /// A matched file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    #[diagnostic(
        code(fob::concat_text::read_failed),
        help("The file may have been removed or its permissions changed during the build")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plugin options could not be loaded
    #[error("Invalid concat-text configuration: {0}")]
    #[diagnostic(
        code(fob::concat_text::config),
        help("`files` is required; `outputPath` and `name` are optional")
    )]
    Config(Box<figment::Error>),

    /// The blocking glob task panicked or was cancelled
    #[error("Glob task failed: {0}")]
    #[diagnostic(code(fob::concat_text::task))]
    Task(#[from] tokio::task::JoinError),
}

impl ConcatError {
    pub fn invalid_pattern(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn walk(pattern: impl Into<String>, source: walkdir::Error) -> Self {
        Self::Walk {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// True when the pattern resolver failed
    pub fn is_glob_error(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. } | Self::Walk { .. } | Self::Task(_))
    }

    /// True when a matched file could not be read
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}

impl From<figment::Error> for ConcatError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
