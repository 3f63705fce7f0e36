use anyhow::Result;
use clap::Parser;
use tracing::warn;

use clawguard::cli::{Cli, Commands};
use clawguard::config::GuardConfig;
use clawguard::engine::decide;
use clawguard::hooks::{HookInput, HookOutput};
use clawguard::llm::{AnthropicClient, LlmClient};
use clawguard::{audit, errors, install, tracing_init, wizard};

fn main() {
    let cli = Cli::parse();
    tracing_init::init_tracing();

    let result = match cli.command {
        Commands::Install => install::install(),
        Commands::Uninstall => install::uninstall(),
        Commands::Config => wizard::run(),
        Commands::Status { json } => install::status(json),
        Commands::Check => run_check(),
    };

    if let Err(e) = result {
        errors::display_error(&e, cli.verbose);
        std::process::exit(1);
    }
}

/// The hook entry point: one JSON request in, one JSON decision out.
///
/// Failures on the decision path never exit non-zero — an unparseable
/// request becomes a deny envelope, and the host reads it like any other.
fn run_check() -> Result<()> {
    let input = match HookInput::from_stdin() {
        Ok(input) => input,
        Err(e) => {
            warn!(error = %e, "Invalid hook input; denying");
            HookOutput::deny_invalid_input(&e.to_string()).write_stdout()?;
            return Ok(());
        }
    };

    let config = GuardConfig::load();
    let client = config.api_key().map(AnthropicClient::new);
    let llm = client.as_ref().map(|c| c as &dyn LlmClient);

    let decision = decide(&input, &config, llm);
    audit::log_decision(&config.logging, &input, &decision);

    HookOutput::from_decision(&decision).write_stdout()
}
