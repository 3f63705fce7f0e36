//! Checkpoint classification: what *kind* of sensitive action is this?
//!
//! Ordered, first-wins. URL-shortener detection runs before the generic
//! network family so `curl https://bit.ly/x -o file` classifies as
//! `url_shortener` (the redirect destination is unknown), and script
//! execution outranks plain network fetches.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::urls::find_shortener_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    UrlShortener,
    ScriptExecution,
    Network,
    PackageInstall,
    GitOperation,
    EnvModification,
    FileSensitive,
}

impl CheckpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointKind::UrlShortener => "url_shortener",
            CheckpointKind::ScriptExecution => "script_execution",
            CheckpointKind::Network => "network",
            CheckpointKind::PackageInstall => "package_install",
            CheckpointKind::GitOperation => "git_operation",
            CheckpointKind::EnvModification => "env_modification",
            CheckpointKind::FileSensitive => "file_sensitive",
        }
    }
}

/// A labeled sensitive action, the trigger for deeper review.
#[derive(Debug, Clone, Serialize)]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    pub original_command: String,
    pub description: String,
}

fn re(source: &str) -> Regex {
    Regex::new(source).expect("built-in checkpoint pattern must compile")
}

static SCRIPT_EXECUTION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"(?i)\b(curl|wget)\b[^|]*\|\s*(ba|z|fi|da)?sh\b"),
        re(r"(?i)\b(ba|z|da)?sh\s+\S+\.sh\b"),
        re(r"(^|[;&|]\s*)\./\S+"),
        re(r"(?i)\bchmod\s+(-[a-zA-Z]+\s+)*\+x\b"),
        re(r"(?i)\b(npm|pnpm|yarn)\s+run\b"),
        re(r"(?i)(^|[;&|]\s*)make\b"),
        re(r"(?i)\b(node|python[23]?|ruby|perl)\s+\S+\.(js|mjs|cjs|py|rb|pl)\b"),
    ]
});

static NETWORK: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(curl|wget)\b[^|;&]*https?://"));

static PACKAGE_INSTALL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"(?i)\bnpm\s+(install|i|add)\s+[^-\s]"),
        re(r"(?i)\bpnpm\s+(add|install)\b"),
        re(r"(?i)\byarn\s+add\b"),
        re(r"(?i)\bpip[23]?\s+install\b"),
        re(r"(?i)\bapt(-get)?\s+install\b"),
        re(r"(?i)\bbrew\s+install\b"),
        re(r"(?i)\bgem\s+install\b"),
        re(r"(?i)\bcargo\s+install\b"),
    ]
});

static GIT_OPERATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Hook-bearing subcommands; `git add` stays here so staged content
        // still passes review before hooks can ever see it.
        re(r"(?i)\bgit\s+(-[a-zA-Z-]+\s+)*(commit|checkout|switch|merge|rebase|pull|fetch|stash|cherry-pick|add|push)\b"),
        re(r"(?i)\bgit\s+reset\s+--hard\b"),
        re(r"(?i)\bgit\b[^|;&]*--force\b"),
        re(r"(?i)\bgit\s+clean\s+-[a-zA-Z]*f"),
    ]
});

static ENV_MODIFICATION: LazyLock<Regex> = LazyLock::new(|| {
    re(r#"(?i)(^|[\s/"'=])\.env(\.local|\.production|\.development)?(["'\s]|$)"#)
});

static FILE_SENSITIVE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\.ssh\b|\.aws\b|\bcredentials\b"));

/// Classify the command, or `None` for no checkpoint (→ allow).
pub fn classify(command: &str) -> Option<Checkpoint> {
    let make = |kind: CheckpointKind, description: String| Checkpoint {
        kind,
        original_command: command.to_string(),
        description,
    };

    if let Some(url) = find_shortener_url(command) {
        return Some(make(
            CheckpointKind::UrlShortener,
            format!("fetches shortened URL {url} whose destination is unknown"),
        ));
    }
    if SCRIPT_EXECUTION.iter().any(|re| re.is_match(command)) {
        return Some(make(
            CheckpointKind::ScriptExecution,
            "downloads, builds, or executes a script".into(),
        ));
    }
    if NETWORK.is_match(command) {
        return Some(make(
            CheckpointKind::Network,
            "performs a network fetch".into(),
        ));
    }
    if PACKAGE_INSTALL.iter().any(|re| re.is_match(command)) {
        return Some(make(
            CheckpointKind::PackageInstall,
            "installs a package (supply-chain surface)".into(),
        ));
    }
    if GIT_OPERATION.iter().any(|re| re.is_match(command)) {
        return Some(make(
            CheckpointKind::GitOperation,
            "git operation that can trigger repository hooks".into(),
        ));
    }
    if ENV_MODIFICATION.is_match(command) {
        return Some(make(
            CheckpointKind::EnvModification,
            "touches an environment file".into(),
        ));
    }
    if FILE_SENSITIVE.is_match(command) {
        return Some(make(
            CheckpointKind::FileSensitive,
            "touches credential-bearing paths".into(),
        ));
    }
    None
}
