//! Hook registration in the host agent's settings file.
//!
//! `install` merges a PermissionRequest hook entry into the user-level
//! settings (backing up the previous file first), `uninstall` removes it, and
//! `status` reports where the hook is registered without touching anything.

use anyhow::{Context, Result};
use tracing::info;

use claude_settings::{
    PathResolver, Settings, SettingsLevel, read_settings_from_path_optional,
    write_settings_to_path_with_backup,
};

use crate::config::GuardConfig;

/// Needle used to find our own hook entries regardless of install path.
const HOOK_NEEDLE: &str = "clawguard";

const BACKUP_SUFFIX: &str = "bak";

/// The hook command to register: the running binary's path, so installs from
/// cargo, homebrew, or a manual copy all point at themselves.
fn hook_command() -> String {
    let binary = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "clawguard".into());
    format!("{binary} check")
}

/// Register the PermissionRequest hook in the user-level settings file.
///
/// Idempotent: re-running does not duplicate the entry.
pub fn install() -> Result<()> {
    let resolver = PathResolver::new();
    let path = resolver.settings_path(SettingsLevel::User)?;

    let mut settings = read_settings_from_path_optional(&path)
        .with_context(|| format!("reading {}", path.display()))?
        .unwrap_or_else(Settings::new);

    let command = hook_command();
    let modified = settings.add_permission_hook("*", &command);
    settings.mark_guard_installed();

    if modified {
        let backup = write_settings_to_path_with_backup(&path, &settings, BACKUP_SUFFIX)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Registered PermissionRequest hook");
        println!("Registered hook in {}", path.display());
        if let Some(backup) = backup {
            println!("Previous settings backed up to {}", backup.display());
        }
    } else {
        println!("Hook already registered in {}", path.display());
    }

    if GuardConfig::load().api_key().is_none() {
        println!(
            "No API key configured; checkpointed commands will require manual approval. \
             Run `clawguard config` to enable automated review."
        );
    }
    Ok(())
}

/// Remove every clawguard hook entry and the install marker.
pub fn uninstall() -> Result<()> {
    let resolver = PathResolver::new();
    let path = resolver.settings_path(SettingsLevel::User)?;

    let Some(mut settings) = read_settings_from_path_optional(&path)
        .with_context(|| format!("reading {}", path.display()))?
    else {
        println!("No settings file at {}; nothing to remove", path.display());
        return Ok(());
    };

    let removed = settings.remove_permission_hooks(HOOK_NEEDLE);
    settings.clear_guard_installed();

    if removed == 0 {
        println!("No clawguard hook found in {}", path.display());
        return Ok(());
    }

    write_settings_to_path_with_backup(&path, &settings, BACKUP_SUFFIX)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), removed, "Removed PermissionRequest hook");
    println!("Removed {removed} hook entr{} from {}", if removed == 1 { "y" } else { "ies" }, path.display());
    Ok(())
}

#[derive(Debug, serde::Serialize)]
struct StatusReport {
    hook_registered: bool,
    hook_level: Option<&'static str>,
    hook_command: Option<String>,
    credential_configured: bool,
    triage_model: String,
    review_model: String,
    custom_allow_patterns: usize,
    custom_block_patterns: usize,
    extra_trusted_domains: usize,
    audit_log: String,
}

/// Report install state and a config summary. Never prints the credential.
pub fn status(json: bool) -> Result<()> {
    let resolver = PathResolver::new();
    let config = GuardConfig::load();

    let mut hook_level = None;
    let mut hook_command = None;
    for (level, path) in resolver.all_settings_paths()? {
        if let Some(settings) = read_settings_from_path_optional(&path).unwrap_or(None)
            && let Some(cmd) = settings.find_permission_hook(HOOK_NEEDLE)
        {
            hook_level = Some(level.name());
            hook_command = Some(cmd.to_string());
            break;
        }
    }

    let report = StatusReport {
        hook_registered: hook_level.is_some(),
        hook_level,
        hook_command,
        credential_configured: config.api_key().is_some(),
        triage_model: config.models.triage.clone(),
        review_model: config.models.review.clone(),
        custom_allow_patterns: config.custom_patterns.allow.len(),
        custom_block_patterns: config.custom_patterns.block.len(),
        extra_trusted_domains: config.trusted_domains.len(),
        audit_log: crate::audit::log_path(&config.logging)
            .to_string_lossy()
            .into_owned(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match (report.hook_registered, report.hook_level) {
        (true, Some(level)) => println!("hook: registered ({level} settings)"),
        _ => println!("hook: not registered — run `clawguard install`"),
    }
    println!(
        "credential: {}",
        if report.credential_configured {
            "configured"
        } else {
            "not configured (checkpoints fall back to manual approval)"
        }
    );
    println!("models: triage={}, review={}", report.triage_model, report.review_model);
    println!(
        "custom patterns: {} allow, {} block",
        report.custom_allow_patterns, report.custom_block_patterns
    );
    println!("extra trusted domains: {}", report.extra_trusted_domains);
    println!("audit log: {}", report.audit_log);
    Ok(())
}
