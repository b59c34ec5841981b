//! Error types for linemark-core.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in linemark-core operations.
///
/// Backend queries never fail with these; they degrade to empty or sentinel
/// values instead. Only configuration handling is fallible.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Config file parsing error.
    #[error("failed to parse {file}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
