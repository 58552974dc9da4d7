//! Error types for vista-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an extension function while it runs.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// The function was called with arguments it cannot accept.
    #[error("{function}() expects {expected}")]
    InvalidArgument { function: String, expected: String },

    /// Provider-specific failure (missing asset, I/O, ...).
    #[error(transparent)]
    Failed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ExtensionError {
    /// Shorthand for [`ExtensionError::InvalidArgument`].
    pub fn invalid_argument(function: impl Into<String>, expected: impl Into<String>) -> Self {
        ExtensionError::InvalidArgument {
            function: function.into(),
            expected: expected.into(),
        }
    }
}

/// Errors that can arise while loading renderer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load. Carries the file path; serde_yaml adds the line.
    #[error("failed to parse renderer config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
