//! Where Claude Code settings files live.
//!
//! Three levels exist: user (`~/.claude/settings.json`), project
//! (`<root>/.claude/settings.json`), and project-local
//! (`settings.local.json`, uncommitted). Hook registration writes the user
//! level; the others are read so a status report can find an existing
//! registration wherever it lives.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, SettingsError};

const CLAUDE_DIR: &str = ".claude";

/// The scope a settings file applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsLevel {
    User,
    Project,
    ProjectLocal,
}

impl SettingsLevel {
    /// Every level, highest precedence first (Claude Code's own order).
    pub fn all_by_priority() -> &'static [SettingsLevel] {
        &[
            SettingsLevel::ProjectLocal,
            SettingsLevel::Project,
            SettingsLevel::User,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SettingsLevel::User => "user",
            SettingsLevel::Project => "project",
            SettingsLevel::ProjectLocal => "project-local",
        }
    }

    fn file_name(&self) -> &'static str {
        match self {
            SettingsLevel::ProjectLocal => "settings.local.json",
            SettingsLevel::User | SettingsLevel::Project => "settings.json",
        }
    }
}

/// Resolves settings file paths, with overridable home and project roots so
/// tests never touch the real home directory.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    home_override: Option<PathBuf>,
    project_override: Option<PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_override = Some(home.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<PathBuf>) -> Self {
        self.project_override = Some(project.into());
        self
    }

    pub fn home_dir(&self) -> Result<PathBuf> {
        match self.home_override {
            Some(ref home) => Ok(home.clone()),
            None => env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or(SettingsError::NoHome),
        }
    }

    /// The project root: an explicit override, else the nearest ancestor of
    /// the working directory carrying `.claude` (or, failing that, `.git`),
    /// else the working directory itself.
    pub fn project_dir(&self) -> Result<PathBuf> {
        if let Some(ref project) = self.project_override {
            return Ok(project.clone());
        }

        let cwd = env::current_dir().map_err(|e| SettingsError::Read {
            path: PathBuf::from("."),
            source: e,
        })?;

        Ok(nearest_ancestor_with(&cwd, CLAUDE_DIR)
            .or_else(|| nearest_ancestor_with(&cwd, ".git"))
            .unwrap_or(cwd))
    }

    pub fn settings_path(&self, level: SettingsLevel) -> Result<PathBuf> {
        let base = match level {
            SettingsLevel::User => self.home_dir()?,
            SettingsLevel::Project | SettingsLevel::ProjectLocal => self.project_dir()?,
        };
        Ok(base.join(CLAUDE_DIR).join(level.file_name()))
    }

    /// `(level, path)` pairs for every level, highest precedence first. A
    /// missing home directory drops the user level instead of failing.
    pub fn all_settings_paths(&self) -> Result<Vec<(SettingsLevel, PathBuf)>> {
        let mut paths = Vec::new();
        for &level in SettingsLevel::all_by_priority() {
            match self.settings_path(level) {
                Ok(path) => paths.push((level, path)),
                Err(SettingsError::NoHome) if level == SettingsLevel::User => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(paths)
    }
}

fn nearest_ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
}
