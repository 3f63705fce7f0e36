//! Interactive configuration editor for `clawguard config`.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Password};

use crate::config::GuardConfig;

/// Prompt for each configurable value, defaulting to what's already set, and
/// persist the result with owner-only permissions.
pub fn run() -> Result<()> {
    let mut config = GuardConfig::load();

    let key_prompt = if config.credential.api_key.is_some() {
        "Anthropic API key (blank to keep current)"
    } else {
        "Anthropic API key (blank to skip automated review)"
    };
    let api_key = Password::new()
        .with_prompt(key_prompt)
        .allow_empty_password(true)
        .interact()
        .context("reading API key")?;
    if !api_key.trim().is_empty() {
        config.credential.api_key = Some(api_key.trim().to_string());
    }

    config.models.triage = Input::new()
        .with_prompt("Triage model")
        .default(config.models.triage.clone())
        .interact_text()
        .context("reading triage model")?;

    config.models.review = Input::new()
        .with_prompt("Review model")
        .default(config.models.review.clone())
        .interact_text()
        .context("reading review model")?;

    let domains: String = Input::new()
        .with_prompt("Extra trusted domains (comma-separated)")
        .default(config.trusted_domains.join(", "))
        .allow_empty(true)
        .interact_text()
        .context("reading trusted domains")?;
    config.trusted_domains = split_list(&domains);

    let tools: String = Input::new()
        .with_prompt("Pre-approved extension tools (comma-separated, `*` suffix for prefixes)")
        .default(config.allowed_extension_tools.join(", "))
        .allow_empty(true)
        .interact_text()
        .context("reading extension tools")?;
    config.allowed_extension_tools = split_list(&tools);

    config.logging.enabled = Confirm::new()
        .with_prompt("Enable decision audit log?")
        .default(config.logging.enabled)
        .interact()
        .context("reading logging preference")?;

    let path = config.save().context("saving configuration")?;
    println!("Saved {} (owner-only permissions)", path.display());
    Ok(())
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
