//! Shared shape of the built-in pattern corpora.
//!
//! Every corpus entry compiles its regex exactly once (first use) and is
//! read-only afterwards. Matching is stateless: `is_match` twice on the same
//! input always agrees.

use regex::Regex;
use serde::Serialize;

/// How bad a match is if the operator lets it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a built-in corpus.
#[derive(Debug)]
pub struct RiskPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub severity: Severity,
    /// Short label of what was matched.
    pub description: &'static str,
    /// One-sentence user-facing harm statement.
    pub risk: &'static str,
    /// Honest reasons someone might run this on purpose.
    pub legitimate_uses: &'static [&'static str],
}

impl RiskPattern {
    /// Compile a corpus entry. Built-in sources are compile-time constants,
    /// so a failure here is a programming error, not input-dependent.
    pub fn new(
        name: &'static str,
        source: &str,
        severity: Severity,
        description: &'static str,
        risk: &'static str,
        legitimate_uses: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            regex: Regex::new(source)
                .unwrap_or_else(|e| panic!("built-in pattern `{name}` must compile: {e}")),
            severity,
            description,
            risk,
            legitimate_uses,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}
