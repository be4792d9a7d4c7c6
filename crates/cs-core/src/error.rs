//! Error types for the cs-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! validation, and [`RequestError`] for rejecting malformed migration requests
//! before any generation call is made.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use cs_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::NotFound(Utf8PathBuf::from("/etc/codeshift.json"));
/// assert!(error.to_string().contains("/etc/codeshift.json"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    NotFound(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons a migration request is rejected at the pipeline entry point.
///
/// Every file must carry a non-empty path and non-empty content, paths must be
/// unique across the request, and the target platform must be named.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The request contains no files.
    #[error("request must contain at least one file")]
    NoFiles,

    /// A file entry has an empty path.
    #[error("file at index {index} has an empty path")]
    EmptyPath {
        /// Position of the offending entry in the request.
        index: usize,
    },

    /// A file entry has empty content.
    #[error("file '{path}' has empty content")]
    EmptyContent {
        /// Path of the offending file.
        path: String,
    },

    /// Two entries share the same path.
    #[error("duplicate file path '{0}'")]
    DuplicatePath(String),

    /// The target platform is empty or whitespace.
    #[error("target platform must not be empty")]
    EmptyTarget,
}
