//! Error types for the paywall command-line driver.

use std::path::PathBuf;

/// Errors raised while loading the CLI configuration or the presigned proof.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML configuration is malformed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The presigned proof file is not valid JSON.
    #[error("invalid proof file {path}: {source}")]
    Proof {
        /// Proof file that failed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An environment override holds an invalid URL.
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        /// Environment variable name.
        var: &'static str,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A required setting is absent from both file and flags.
    #[error("missing setting: {0}")]
    Missing(&'static str),
}
