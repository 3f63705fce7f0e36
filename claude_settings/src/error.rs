//! Error type for settings-file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Failures while locating, reading, or writing a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file does not exist. Callers that tolerate a fresh install match
    /// on this variant rather than inspecting IO error kinds.
    #[error("no settings file at {0}")]
    NotFound(PathBuf),

    #[error("could not read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not contain valid settings JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings could not be serialized")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot locate a home directory")]
    NoHome,
}
