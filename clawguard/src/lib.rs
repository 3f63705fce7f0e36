//! clawguard — a pre-execution command guard for Claude Code tool use.
//!
//! The guard sits on the PermissionRequest hook: every tool invocation the
//! agent proposes arrives here as JSON, and a layered, mostly-deterministic
//! pipeline answers allow or deny. Pattern stages run in microseconds; only
//! commands that reach a checkpoint and have a credential configured go to
//! the two-stage remote LLM cascade, and every failure along the way
//! collapses into a conservative decision.
//!
//! The library surface is [`engine::decide`] plus the wire types in
//! [`hooks`]; the binary's subcommands (`install`, `uninstall`, `config`,
//! `check`, `status`) are thin shells over it.

pub mod audit;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod custom_rules;
pub mod decision;
pub mod domains;
pub mod engine;
pub mod errors;
pub mod high_risk;
pub mod hooks;
pub mod injection;
pub mod install;
pub mod instant_allow;
pub mod llm;
pub mod patterns;
pub mod sensitive_paths;
pub mod tracing_init;
pub mod urls;
pub mod wizard;

pub use decision::{Behavior, Decision, Source};
pub use engine::decide;
pub use hooks::{HookInput, HookOutput};
