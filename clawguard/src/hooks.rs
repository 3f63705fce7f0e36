//! Wire types for the Claude Code PermissionRequest hook.
//!
//! The host delivers one JSON request on stdin and expects exactly one JSON
//! envelope on stdout. Everything else (diagnostics, warnings) must go to
//! stderr or the log file.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::decision::{Behavior, Decision};

/// The complete hook input received from Claude Code via stdin.
///
/// Unknown fields are ignored; fields the host may omit are defaulted so a
/// minimal request still parses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub permission_mode: String,
    #[serde(default)]
    pub hook_event_name: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: serde_json::Value,
}

impl HookInput {
    /// Parse from any reader (for testability).
    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse from stdin (convenience wrapper for production).
    pub fn from_stdin() -> anyhow::Result<Self> {
        Self::from_reader(std::io::stdin().lock())
    }

    /// The shell command, for the Bash tool.
    pub fn command(&self) -> Option<&str> {
        self.tool_input.get("command").and_then(|v| v.as_str())
    }

    /// The target path, for file tools.
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input.get("file_path").and_then(|v| v.as_str())
    }

    /// The target notebook, for the notebook-edit tool.
    pub fn notebook_path(&self) -> Option<&str> {
        self.tool_input.get("notebook_path").and_then(|v| v.as_str())
    }
}

/// The decision payload inside the hook envelope.
#[derive(Debug, Clone, Serialize)]
pub struct WireDecision {
    pub behavior: Behavior,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Hook-specific output for PermissionRequest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequestOutput {
    pub hook_event_name: &'static str,
    pub decision: WireDecision,
}

/// The complete hook output sent to Claude Code via stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_specific_output: PermissionRequestOutput,
}

impl HookOutput {
    /// Translate a pipeline decision into the wire envelope.
    ///
    /// `user_message` is authoritative when present; otherwise a denial
    /// surfaces its reason and an allow stays silent.
    pub fn from_decision(decision: &Decision) -> Self {
        let message = decision.user_message.clone().or_else(|| match decision.behavior {
            Behavior::Deny => Some(decision.reason.clone()),
            Behavior::Allow => None,
        });

        Self {
            hook_specific_output: PermissionRequestOutput {
                hook_event_name: "PermissionRequest",
                decision: WireDecision {
                    behavior: decision.behavior,
                    message,
                },
            },
        }
    }

    /// A denial produced before the pipeline could run (e.g. unparseable
    /// input). Kept here so the IO shell never hand-assembles JSON.
    pub fn deny_invalid_input(detail: &str) -> Self {
        Self {
            hook_specific_output: PermissionRequestOutput {
                hook_event_name: "PermissionRequest",
                decision: WireDecision {
                    behavior: Behavior::Deny,
                    message: Some(format!("clawguard could not parse the request: {detail}")),
                },
            },
        }
    }

    /// Write the envelope to any writer (for testability).
    pub fn write_to(&self, mut writer: impl Write) -> anyhow::Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the envelope to stdout.
    pub fn write_stdout(&self) -> anyhow::Result<()> {
        self.write_to(std::io::stdout().lock())
    }
}
