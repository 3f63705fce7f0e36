use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clawguard")]
#[command(version)]
#[command(about = "Pre-execution command guard for Claude Code tool use")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register the PermissionRequest hook in Claude Code settings
    Install,

    /// Remove the hook registration
    Uninstall,

    /// Interactively set or update guard configuration
    Config,

    /// Read a permission request as JSON on stdin, write a decision to stdout
    ///
    /// This is the hook entry point. stdout carries exactly one JSON
    /// document; diagnostics go to stderr and the log file.
    Check,

    /// Show install state and a configuration summary
    Status {
        /// Output as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}
