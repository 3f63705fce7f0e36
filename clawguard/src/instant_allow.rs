//! Instant-allow filter for provably safe commands.
//!
//! Only pure, single, read-only git commands qualify. Anything that can chain
//! a second command, substitute output, or fire a repository hook falls
//! through to the rest of the pipeline.

use std::sync::LazyLock;

use regex::Regex;

/// Read-only, hook-free git subcommands.
const READ_ONLY_GIT: &[&str] = &[
    "status",
    "log",
    "diff",
    "show",
    "blame",
    "reflog",
    "shortlog",
    "describe",
    "rev-parse",
    "ls-files",
    "ls-tree",
];

/// Dangerous shapes that disqualify even a read-only-looking invocation.
static DANGEROUS_GIT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bpush\b",
        r"(?i)\breset\s+--hard\b",
        r"(?i)\bclean\s+-[a-zA-Z]*f",
        r"(?i)--force\b",
        r"(?i)(^|\s)-f(\s|$)",
    ]
    .iter()
    .map(|src| Regex::new(src).expect("built-in git pattern must compile"))
    .collect()
});

/// True if the command contains any construct that could smuggle in a second
/// command: chaining operators, substitution, or embedded newlines.
fn has_compound_syntax(command: &str) -> bool {
    command.contains(';')
        || command.contains('&')
        || command.contains('|')
        || command.contains('`')
        || command.contains("$(")
        || command.contains('\n')
}

/// True only for a pure, single, read-only git command.
///
/// `commit`, `checkout`, `merge`, `pull`, `add` and friends never qualify:
/// they can execute repository-local hooks, which is arbitrary code.
pub fn is_instant_allow(command: &str) -> bool {
    let command = command.trim();
    if command.is_empty() || has_compound_syntax(command) {
        return false;
    }

    let mut tokens = command.split_whitespace();
    if tokens.next() != Some("git") {
        return false;
    }

    // The subcommand must come directly after `git`; global flags like
    // `-C <path>` redirect the repository and don't qualify.
    let Some(subcommand) = tokens.next() else {
        return false;
    };
    if !READ_ONLY_GIT.contains(&subcommand) {
        return false;
    }

    !DANGEROUS_GIT.iter().any(|re| re.is_match(command))
}
