//! Configuration management for linemark.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// linemark configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Programs used to query the backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// File content settings.
    #[serde(default)]
    pub files: FilesConfig,
}

impl Config {
    /// Load config from a TOML file, falling back to defaults when it is
    /// missing.
    ///
    /// # Errors
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            file: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Save config to a TOML file, creating parent directories.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default location: `<config dir>/linemark/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("linemark").join("config.toml"))
    }
}

/// Programs invoked for backend, hashing and identity queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Version-control program.
    #[serde(default = "default_program")]
    pub program: String,

    /// Program printing `<digest> <path>` for a file.
    #[serde(default = "default_hash_program")]
    pub hash_program: String,

    /// Program printing the acting user's login with `-un`.
    #[serde(default = "default_identity_program")]
    pub identity_program: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            hash_program: default_hash_program(),
            identity_program: default_identity_program(),
        }
    }
}

fn default_program() -> String {
    "git".into()
}

fn default_hash_program() -> String {
    "sha1sum".into()
}

fn default_identity_program() -> String {
    "id".into()
}

/// File content settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Encoding assumed for historical content when none is given.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            default_encoding: default_encoding(),
        }
    }
}

fn default_encoding() -> String {
    crate::encoding::CANONICAL.into()
}
