//! Read, edit, and write Claude Code `settings.json` files.
//!
//! This crate owns the mechanics of hook registration: resolving where the
//! settings files live, reading them without dropping unknown fields, merging
//! or removing a PermissionRequest hook entry, and writing the result back
//! with a backup of the previous contents.

mod error;
mod io;
mod paths;
mod types;

pub use error::{Result, SettingsError};
pub use io::{
    backup_settings_file, read_settings_from_path, read_settings_from_path_optional,
    write_settings_to_path, write_settings_to_path_with_backup,
};
pub use paths::{PathResolver, SettingsLevel};
pub use types::{Hook, HookMatcher, Hooks, Settings};
