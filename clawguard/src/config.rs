//! Guard configuration.
//!
//! Read once per request lifecycle from `~/.clawguard/config.json` and never
//! mutated by the decision path. The file may carry an API credential, so it
//! is written with owner-only permissions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domains::DEFAULT_TRUSTED_DOMAINS;

/// Environment variable that overrides `credential.apiKey`. Env wins.
pub const CREDENTIAL_ENV_VAR: &str = "ANTHROPIC_API_KEY";

const DEFAULT_TRIAGE_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_REVIEW_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    #[serde(default, skip_serializing_if = "Credential::is_empty")]
    pub credential: Credential,

    #[serde(default)]
    pub models: Models,

    /// Extra trusted domains, merged on top of the built-in set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trusted_domains: Vec<String>,

    #[serde(default, skip_serializing_if = "CustomPatterns::is_empty")]
    pub custom_patterns: CustomPatterns,

    /// Pre-approved extension tool identifiers; a trailing `*` is a prefix
    /// wildcard.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_extension_tools: Vec<String>,

    /// Older config files used this key for the same list.
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "allowedMCPTools")]
    pub allowed_mcp_tools: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Credential {
    fn is_empty(&self) -> bool {
        self.api_key.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Models {
    #[serde(default = "default_triage_model")]
    pub triage: String,
    #[serde(default = "default_review_model")]
    pub review: String,
}

fn default_triage_model() -> String {
    DEFAULT_TRIAGE_MODEL.into()
}

fn default_review_model() -> String {
    DEFAULT_REVIEW_MODEL.into()
}

impl Default for Models {
    fn default() -> Self {
        Self {
            triage: default_triage_model(),
            review: default_review_model(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomPatterns {
    /// Regex source strings; a match short-circuits to allow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
    /// Regex source strings; a match short-circuits to deny.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<String>,
}

impl CustomPatterns {
    fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.block.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl GuardConfig {
    /// The guard's dot directory: `~/.clawguard`.
    pub fn settings_dir() -> Result<PathBuf> {
        home_dir()
            .map(|h| h.join(".clawguard"))
            .context("$HOME is not set; cannot determine settings directory")
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::settings_dir()?.join("config.json"))
    }

    /// Load from the default location. A missing file yields defaults; an
    /// unreadable or malformed file is logged and also yields defaults so the
    /// guard still stands between the agent and the shell.
    pub fn load() -> Self {
        let path = match Self::config_file() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Cannot determine config path; using defaults");
                return Self::default();
            }
        };
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &std::path::Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config; using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse config; using defaults");
                Self::default()
            }
        }
    }

    /// Persist to the default location with owner-only permissions.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;

        // The file may carry a credential.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// The credential in effect: the environment variable wins over config.
    pub fn api_key(&self) -> Option<String> {
        resolve_credential(std::env::var(CREDENTIAL_ENV_VAR).ok(), self)
    }

    /// Built-in trusted domains plus the user's additions, lowercased and
    /// deduplicated.
    pub fn effective_trusted_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = DEFAULT_TRUSTED_DOMAINS
            .iter()
            .map(|d| d.to_string())
            .collect();
        for d in &self.trusted_domains {
            let d = d.trim().trim_start_matches('.').to_lowercase();
            if !d.is_empty() && !domains.contains(&d) {
                domains.push(d);
            }
        }
        domains
    }

    /// Pre-approved extension tool identifiers from both recognized keys.
    pub fn extension_allowlist(&self) -> Vec<&str> {
        self.allowed_extension_tools
            .iter()
            .chain(self.allowed_mcp_tools.iter())
            .map(|s| s.as_str())
            .collect()
    }
}

/// Env-over-config credential resolution, split out so tests don't have to
/// mutate the process environment.
fn resolve_credential(env_value: Option<String>, config: &GuardConfig) -> Option<String> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.credential.api_key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = GuardConfig::load_from_path(&temp.path().join("config.json"));
        assert_eq!(config, GuardConfig::default());
        assert_eq!(config.models.triage, DEFAULT_TRIAGE_MODEL);
        assert_eq!(config.models.review, DEFAULT_REVIEW_MODEL);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{oops").unwrap();
        assert_eq!(GuardConfig::load_from_path(&path), GuardConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        let mut config = GuardConfig::default();
        config.credential.api_key = Some("sk-test".into());
        config.trusted_domains.push("internal.example.com".into());
        config.custom_patterns.allow.push(r"^make test\b".into());
        config.allowed_extension_tools.push("mcp__linear__*".into());
        config.logging.enabled = true;

        config.save_to_path(&path).unwrap();
        let loaded = GuardConfig::load_from_path(&path);
        assert_eq!(loaded, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        GuardConfig::default().save_to_path(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "config must be 0600, got {mode:o}");
    }

    #[test]
    fn test_recognized_keys_parse() {
        let json = r#"{
            "credential": {"apiKey": "sk-abc"},
            "models": {"triage": "haiku-x", "review": "sonnet-y"},
            "trustedDomains": ["example.org"],
            "customPatterns": {"allow": ["^ls "], "block": ["badness"]},
            "allowedMCPTools": ["mcp__github__get_issue"],
            "allowedExtensionTools": ["mcp__linear__*"],
            "logging": {"enabled": true, "path": "/tmp/guard.jsonl"}
        }"#;

        let config: GuardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.credential.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.models.triage, "haiku-x");
        assert_eq!(config.models.review, "sonnet-y");
        assert_eq!(config.trusted_domains, vec!["example.org"]);
        assert_eq!(config.custom_patterns.allow, vec!["^ls "]);
        assert_eq!(config.custom_patterns.block, vec!["badness"]);
        assert_eq!(
            config.extension_allowlist(),
            vec!["mcp__linear__*", "mcp__github__get_issue"]
        );
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_env_credential_wins() {
        let mut config = GuardConfig::default();
        config.credential.api_key = Some("from-config".into());

        assert_eq!(
            resolve_credential(Some("from-env".into()), &config).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            resolve_credential(None, &config).as_deref(),
            Some("from-config")
        );
        // Blank env values are ignored.
        assert_eq!(
            resolve_credential(Some("  ".into()), &config).as_deref(),
            Some("from-config")
        );
    }

    #[test]
    fn test_effective_trusted_domains_merges_and_dedupes() {
        let mut config = GuardConfig::default();
        config.trusted_domains.push("GitHub.com".into());
        config.trusted_domains.push(".internal.corp".into());

        let domains = config.effective_trusted_domains();
        assert!(domains.contains(&"internal.corp".to_string()));
        assert_eq!(
            domains.iter().filter(|d| *d == "github.com").count(),
            1,
            "built-in github.com must not be duplicated"
        );
    }
}
