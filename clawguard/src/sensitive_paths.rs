//! Path sensitivity checks for file-affecting tools.
//!
//! Two curated pattern sets, one for writes (and edits) and one for reads.
//! Ordering within each set is load-bearing: critical entries precede high
//! entries wherever both could match the same path, so `~/.ssh/authorized_keys`
//! reports as critical rather than being downgraded by the shell-startup rule.

use std::sync::LazyLock;

use crate::patterns::{RiskPattern, Severity};

/// What the tool intends to do with the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    Read,
    Write,
    Edit,
}

/// Paths where a write can grant persistence, credentials, or code execution.
static WRITE_SENSITIVE: LazyLock<Vec<RiskPattern>> = LazyLock::new(|| {
    vec![
        // -- critical --
        RiskPattern::new(
            "ssh_directory",
            r"(?i)(^|/)\.ssh(/|$)",
            Severity::Critical,
            "SSH configuration directory",
            "Writing here can plant attacker keys in authorized_keys or rewrite known_hosts, granting persistent remote access.",
            &["rotating your own SSH keys", "adding a host alias to ~/.ssh/config"],
        ),
        RiskPattern::new(
            "cloud_credentials_dir",
            r"(?i)(^|/)(\.aws|\.azure|\.config/gcloud|\.kube)(/|$)",
            Severity::Critical,
            "cloud provider credential directory",
            "Modified cloud credentials can silently redirect deployments or grant an attacker your cloud account.",
            &["re-running `aws configure`", "switching kubectl contexts"],
        ),
        RiskPattern::new(
            "gpg_directory",
            r"(?i)(^|/)\.gnupg(/|$)",
            Severity::Critical,
            "GPG keyring directory",
            "Tampered keyrings can forge signatures or exfiltrate private keys.",
            &["importing a colleague's public key"],
        ),
        RiskPattern::new(
            "system_directory",
            r"(?i)^/(etc|usr|bin|sbin|boot|lib|lib64)(/|$)",
            Severity::Critical,
            "system directory",
            "System files affect every user and process; a bad write can break the machine or install a backdoor.",
            &["editing /etc/hosts for local development", "system administration you initiated"],
        ),
        RiskPattern::new(
            "agent_settings",
            r"(?i)(^|/)\.claude/settings(\.local)?\.json$",
            Severity::Critical,
            "host agent settings file",
            "Rewriting the agent's settings can disable this guard and every other safety hook.",
            &["deliberately reconfiguring Claude Code hooks"],
        ),
        RiskPattern::new(
            "guard_directory",
            r"(?i)(^|/)\.clawguard(/|$)",
            Severity::Critical,
            "clawguard configuration directory",
            "Writing to the guard's own files can neuter the checks you are relying on right now.",
            &["editing guard config through `clawguard config`"],
        ),
        // -- high --
        RiskPattern::new(
            "shell_startup_file",
            r"(?i)(^|/)\.(bashrc|bash_profile|bash_login|profile|zshrc|zshenv|zprofile|zlogin|config/fish/config\.fish)$",
            Severity::High,
            "shell startup file",
            "Anything appended here runs in every future shell, a classic persistence spot.",
            &["adding an alias or PATH entry yourself"],
        ),
        RiskPattern::new(
            "crontab",
            r"(?i)(^|/)(crontab|cron\.(d|daily|hourly|weekly|monthly))(/|$)|/var/spool/cron",
            Severity::High,
            "scheduled job configuration",
            "A planted cron entry re-runs attacker code forever, surviving reboots.",
            &["scheduling a backup job you wrote"],
        ),
        RiskPattern::new(
            "git_hooks",
            r"(?i)(^|/)\.git/hooks(/|$)",
            Severity::High,
            "git hooks directory",
            "Hook scripts execute on ordinary git operations, so a bad hook runs arbitrary code the next time anyone commits.",
            &["installing a lint pre-commit hook in your own repo"],
        ),
        RiskPattern::new(
            "package_manager_config",
            r"(?i)(^|/)(\.npmrc|\.pypirc|\.cargo/credentials(\.toml)?|\.docker/config\.json|\.netrc)$",
            Severity::High,
            "package manager or registry config",
            "These files carry auth tokens; rewriting them can steal or replace publishing credentials.",
            &["logging into a private registry"],
        ),
    ]
});

/// Paths whose contents are secrets; reading them is the risk.
static READ_SENSITIVE: LazyLock<Vec<RiskPattern>> = LazyLock::new(|| {
    vec![
        // -- critical --
        RiskPattern::new(
            "ssh_private_key",
            r"(?i)(^|/)(id_rsa|id_dsa|id_ecdsa|id_ed25519|id_ed25519_sk|id_ecdsa_sk)(\.|$)",
            Severity::Critical,
            "SSH private key",
            "A leaked private key is full remote access to every host that trusts it.",
            &["migrating keys to a new machine yourself"],
        ),
        RiskPattern::new(
            "key_material_file",
            r"(?i)\.(pem|key|p12|pfx|asc)$",
            Severity::Critical,
            "private key material",
            "Key files grant whatever the key protects: TLS identities, signing authority, or server access.",
            &["inspecting a certificate you just generated"],
        ),
        RiskPattern::new(
            "cloud_credential_file",
            r"(?i)(^|/)(\.aws/credentials|\.aws/config|\.config/gcloud/[^/]*credentials[^/]*|\.azure/(accessTokens|msal_token_cache)[^/]*|\.kube/config)$",
            Severity::Critical,
            "cloud provider credential file",
            "Cloud credentials read here can be replayed from anywhere to control your infrastructure.",
            &["debugging which profile the CLI is using"],
        ),
        RiskPattern::new(
            "gpg_private_key",
            r"(?i)(^|/)\.gnupg/(private-keys-v1\.d(/|$)|secring)",
            Severity::Critical,
            "GPG private key",
            "A copied signing key lets an attacker impersonate your signatures indefinitely.",
            &["backing up your keyring deliberately"],
        ),
        RiskPattern::new(
            "system_shadow",
            r"(?i)^/etc/shadow$",
            Severity::Critical,
            "system password hashes",
            "Password hashes enable offline cracking of every account on this machine.",
            &["system administration with explicit intent"],
        ),
        RiskPattern::new(
            "plaintext_credentials",
            r"(?i)(^|/)(\.netrc|\.git-credentials|\.pgpass)$",
            Severity::Critical,
            "plaintext credential file",
            "These files store passwords unencrypted; reading one is reading the password.",
            &["checking which hosts have stored credentials"],
        ),
        // -- high --
        RiskPattern::new(
            "registry_token_config",
            r"(?i)(^|/)(\.npmrc|\.pypirc|\.cargo/credentials(\.toml)?)$",
            Severity::High,
            "registry config that may contain tokens",
            "Publishing tokens in these files allow supply-chain attacks against packages you own.",
            &["verifying registry configuration"],
        ),
        RiskPattern::new(
            "environment_file",
            r"(?i)(^|/)\.env(\.local|\.production|\.development)?$",
            Severity::High,
            "environment file",
            "Environment files typically hold API keys and database passwords for this project.",
            &["checking which variables the app expects"],
        ),
    ]
});

/// Expand `$HOME`/`${HOME}` to `~` and collapse runs of `/`, so the corpora
/// match however the caller spells the path.
fn normalize_path(path: &str) -> String {
    let mut out = path.replace("${HOME}", "~").replace("$HOME", "~");
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    out
}

/// First matching rule for the path under the given action, or `None`.
///
/// Edits use the write set: a surgical edit to `authorized_keys` is as bad as
/// rewriting it.
pub fn check_path_sensitivity(path: &str, action: PathAction) -> Option<&'static RiskPattern> {
    let normalized = normalize_path(path);
    let set: &[RiskPattern] = match action {
        PathAction::Read => &READ_SENSITIVE,
        PathAction::Write | PathAction::Edit => &WRITE_SENSITIVE,
    };
    set.iter().find(|rule| rule.is_match(&normalized))
}
