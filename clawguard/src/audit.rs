//! Structured audit logging for guard decisions.
//!
//! Writes JSON Lines entries to `~/.clawguard/audit.jsonl` when enabled.
//! Audit failures are logged and swallowed; they never affect the decision.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::config::LoggingConfig;
use crate::decision::{Behavior, Decision};
use crate::hooks::HookInput;

/// A single audit log entry.
#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    /// Unix timestamp with millisecond precision (e.g. `1706123456.789`).
    timestamp: String,
    tool_name: &'a str,
    /// Summary of the tool input, truncated for large inputs.
    tool_input_summary: String,
    behavior: &'static str,
    source: &'static str,
    reason: &'a str,
}

/// Resolve the audit log path from config, defaulting to the guard dir.
pub fn log_path(config: &LoggingConfig) -> PathBuf {
    if let Some(ref path) = config.path {
        PathBuf::from(path)
    } else {
        dirs::home_dir()
            .map(|h| h.join(".clawguard").join("audit.jsonl"))
            .unwrap_or_else(|| PathBuf::from("audit.jsonl"))
    }
}

/// Append an audit entry for a decision, if logging is enabled.
pub fn log_decision(config: &LoggingConfig, input: &HookInput, decision: &Decision) {
    if !config.enabled {
        return;
    }

    let entry = AuditEntry {
        timestamp: unix_timestamp(),
        tool_name: &input.tool_name,
        tool_input_summary: summarize(&input.tool_input),
        behavior: match decision.behavior {
            Behavior::Allow => "allow",
            Behavior::Deny => "deny",
        },
        source: decision.source.as_str(),
        reason: &decision.reason,
    };

    let path = log_path(config);
    if let Err(e) = append_entry(&path, &entry) {
        warn!(error = %e, path = %path.display(), "Failed to write audit log entry");
    }
}

fn summarize(tool_input: &serde_json::Value) -> String {
    let input_str = tool_input.to_string();
    if input_str.len() <= 200 {
        return input_str;
    }
    let truncate_at = input_str
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= 200)
        .last()
        .unwrap_or(0);
    format!("{}...", &input_str[..truncate_at])
}

fn unix_timestamp() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

fn append_entry(path: &std::path::Path, entry: &AuditEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry).map_err(std::io::Error::other)?;
    writeln!(file, "{}", json)?;
    Ok(())
}
