//! Settings file I/O.
//!
//! Reads tolerate a missing file; writes create parent directories on demand
//! and can copy the previous contents aside first, so hook registration never
//! destroys a hand-edited settings file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{Level, instrument};

use crate::error::{Result, SettingsError};
use crate::types::Settings;

/// Read and parse the settings file at `path`.
#[instrument(level = Level::TRACE)]
pub fn read_settings_from_path(path: &Path) -> Result<Settings> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Like [`read_settings_from_path`], but a missing file is `Ok(None)`.
#[instrument(level = Level::TRACE)]
pub fn read_settings_from_path_optional(path: &Path) -> Result<Option<Settings>> {
    match read_settings_from_path(path) {
        Ok(settings) => Ok(Some(settings)),
        Err(SettingsError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Serialize `settings` to `path`, creating parent directories as needed.
#[instrument(level = Level::TRACE, skip(settings))]
pub fn write_settings_to_path(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, content).map_err(|e| SettingsError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Copy the current file to `{path}.{suffix}` before it is overwritten.
///
/// A missing source is `Ok(None)`: there is nothing to preserve on a first
/// install.
#[instrument(level = Level::TRACE)]
pub fn backup_settings_file(path: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".");
    backup.push(suffix);
    let backup = PathBuf::from(backup);

    fs::copy(path, &backup).map_err(|e| SettingsError::Write {
        path: backup.clone(),
        source: e,
    })?;
    Ok(Some(backup))
}

/// Back up the existing file, then write. Returns the backup path, if one
/// was made.
#[instrument(level = Level::TRACE, skip(settings))]
pub fn write_settings_to_path_with_backup(
    path: &Path,
    settings: &Settings,
    backup_suffix: &str,
) -> Result<Option<PathBuf>> {
    let backup = backup_settings_file(path, backup_suffix)?;
    write_settings_to_path(path, settings)?;
    Ok(backup)
}
