//! Error types for config loading and lookup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading files into a namespace or reading from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file (or import target) did not exist when it was read.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// Reading the file failed for a reason other than it being missing.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoder rejected the file contents.
    #[error("failed to decode {format} from {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    /// The extension is not one of yaml, json or toml.
    #[error("unsupported config file type '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A mapping key cannot be addressed by a dotted path.
    #[error("invalid config key '{0}': keys must be non-empty and must not contain '.'")]
    InvalidKey(String),

    /// A file imports itself, directly or through other files.
    #[error("cyclic import of {path} (chain: {chain})")]
    CyclicImport { path: PathBuf, chain: String },

    /// The requested key was never set.
    #[error("config has no attribute '{0}'")]
    AttributeNotFound(String),

    /// A value exists but does not deserialize into the requested type.
    #[error("failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "not_found",
            ConfigError::Io { .. } => "io",
            ConfigError::Parse { .. } => "parse",
            ConfigError::UnsupportedFormat { .. } => "unsupported_format",
            ConfigError::InvalidKey(_) => "invalid_key",
            ConfigError::CyclicImport { .. } => "cyclic_import",
            ConfigError::AttributeNotFound(_) => "attribute_not_found",
            ConfigError::Decode { .. } => "decode",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
