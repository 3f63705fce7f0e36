//! The pipeline's output type.
//!
//! A `Decision` is immutable once constructed; the host adapter translates it
//! to the wire envelope. The core never sleeps through a timeout window —
//! `timeout_seconds` is advice to the host about how long to hold a denial
//! open for operator override.

use serde::Serialize;

use crate::checkpoint::Checkpoint;

/// Window the host holds an ordinary denial open for operator override.
pub const DEFAULT_DENY_TIMEOUT_SECS: u64 = 7;

/// Plan approval may wait for an operator who is away from the keyboard.
pub const PLAN_APPROVAL_TIMEOUT_SECS: u64 = 72 * 60 * 60;

/// Whether the tool invocation proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Allow,
    Deny,
}

/// Which pipeline stage produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    InstantAllow,
    InstantBlock,
    HighRisk,
    TrustedDomain,
    NoCheckpoint,
    Checkpoint,
    NonShellTool,
    Haiku,
    Sonnet,
    CustomAllow,
    CustomBlock,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::InstantAllow => "instant-allow",
            Source::InstantBlock => "instant-block",
            Source::HighRisk => "high-risk",
            Source::TrustedDomain => "trusted-domain",
            Source::NoCheckpoint => "no-checkpoint",
            Source::Checkpoint => "checkpoint",
            Source::NonShellTool => "non-shell-tool",
            Source::Haiku => "haiku",
            Source::Sonnet => "sonnet",
            Source::CustomAllow => "custom-allow",
            Source::CustomBlock => "custom-block",
        }
    }
}

/// Final output of `decide`.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub behavior: Behavior,
    pub reason: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Decision {
    pub fn allow(source: Source, reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Allow,
            reason: reason.into(),
            source,
            checkpoint: None,
            user_message: None,
            timeout_seconds: None,
        }
    }

    /// A denial with the default operator-override window.
    pub fn deny(source: Source, reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Deny,
            reason: reason.into(),
            source,
            checkpoint: None,
            user_message: None,
            timeout_seconds: Some(DEFAULT_DENY_TIMEOUT_SECS),
        }
    }

    pub fn with_user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn is_deny(&self) -> bool {
        self.behavior == Behavior::Deny
    }
}
