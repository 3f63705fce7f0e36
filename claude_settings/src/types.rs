//! Type definitions for Claude Code settings.
//!
//! Only the parts of the settings schema that hook registration touches are
//! modeled as typed fields; everything else rides along untouched in `extra`
//! so a read-modify-write cycle never drops unrelated configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Claude Code settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Hook configurations, keyed by lifecycle event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Hooks>,

    /// Any fields not explicitly modeled, preserved verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Hook configurations for the lifecycle events the guard cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Hooks {
    /// Hooks that answer permission prompts on behalf of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_request: Option<Vec<HookMatcher>>,

    /// Other hook events, preserved verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.permission_request
            .as_ref()
            .is_none_or(|m| m.is_empty())
            && self.extra.is_empty()
    }
}

/// A hook matcher that triggers hooks based on a tool-name pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookMatcher {
    /// Pattern to match against (empty string or `*` matches all tools).
    #[serde(default)]
    pub matcher: String,

    /// List of hooks to execute when the pattern matches.
    #[serde(default)]
    pub hooks: Vec<Hook>,
}

/// A single hook definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hook {
    /// The type of hook (always "command" for entries the guard writes).
    #[serde(rename = "type")]
    pub hook_type: String,

    /// The command to execute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Hook {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            hook_type: "command".into(),
            command: Some(command.into()),
            timeout: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The key used in `extra` to track guard installation status.
    const INSTALLED_KEY: &'static str = "_clawguardInstalled";

    /// Returns true if these settings carry the guard's install marker.
    pub fn is_guard_installed(&self) -> bool {
        self.extra
            .get(Self::INSTALLED_KEY)
            .is_some_and(|v| v.as_bool().unwrap_or(false))
    }

    /// Stamps the guard's install marker.
    pub fn mark_guard_installed(&mut self) {
        self.extra
            .insert(Self::INSTALLED_KEY.to_string(), serde_json::json!(true));
    }

    /// Removes the guard's install marker.
    pub fn clear_guard_installed(&mut self) {
        self.extra.remove(Self::INSTALLED_KEY);
    }

    /// Finds a registered PermissionRequest hook command containing `needle`.
    pub fn find_permission_hook(&self, needle: &str) -> Option<&str> {
        self.hooks
            .as_ref()?
            .permission_request
            .as_ref()?
            .iter()
            .flat_map(|m| m.hooks.iter())
            .filter_map(|h| h.command.as_deref())
            .find(|cmd| cmd.contains(needle))
    }

    /// Registers a PermissionRequest hook command under the given matcher.
    ///
    /// Idempotent: if the exact command is already registered under any
    /// matcher, nothing changes. Returns true if the settings were modified.
    pub fn add_permission_hook(&mut self, matcher: &str, command: &str) -> bool {
        let hooks = self.hooks.get_or_insert_with(Hooks::default);
        let matchers = hooks.permission_request.get_or_insert_with(Vec::new);

        let already_registered = matchers
            .iter()
            .flat_map(|m| m.hooks.iter())
            .any(|h| h.command.as_deref() == Some(command));
        if already_registered {
            return false;
        }

        if let Some(existing) = matchers.iter_mut().find(|m| m.matcher == matcher) {
            existing.hooks.push(Hook::command(command));
        } else {
            matchers.push(HookMatcher {
                matcher: matcher.into(),
                hooks: vec![Hook::command(command)],
            });
        }
        true
    }

    /// Removes every PermissionRequest hook whose command contains `needle`.
    ///
    /// Empty matchers are pruned. Returns the number of hook entries removed.
    pub fn remove_permission_hooks(&mut self, needle: &str) -> usize {
        let Some(hooks) = self.hooks.as_mut() else {
            return 0;
        };
        let Some(matchers) = hooks.permission_request.as_mut() else {
            return 0;
        };

        let mut removed = 0;
        for m in matchers.iter_mut() {
            let before = m.hooks.len();
            m.hooks
                .retain(|h| !h.command.as_deref().is_some_and(|c| c.contains(needle)));
            removed += before - m.hooks.len();
        }
        matchers.retain(|m| !m.hooks.is_empty());

        if matchers.is_empty() {
            hooks.permission_request = None;
        }
        if hooks.is_empty() {
            self.hooks = None;
        }
        removed
    }
}
