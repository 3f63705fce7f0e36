//! Tracing setup for the guard binary.
//!
//! The `check` hook owns stdout (exactly one JSON document goes there), so
//! diagnostics are written to a log file when one can be opened and to stderr
//! otherwise.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

use crate::config::GuardConfig;

/// Overrides the default log location `~/.clawguard/clawguard.log`.
const LOG_PATH_ENV_VAR: &str = "CLAWGUARD_LOG";

pub fn init_tracing() {
    let layer: Box<dyn Layer<_> + Send + Sync> = match open_log_file(&log_path()) {
        Some(file) => tracing_subscriber::fmt::layer()
            .with_writer(file)
            .pretty()
            .with_ansi(false)
            .with_filter(LevelFilter::from_level(Level::DEBUG))
            .boxed(),
        // Unopenable log file: stderr still keeps stdout clean for the hook.
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .pretty()
            .with_ansi(false)
            .with_filter(LevelFilter::from_level(Level::INFO))
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).init()
}

fn log_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOG_PATH_ENV_VAR) {
        return PathBuf::from(path);
    }
    GuardConfig::settings_dir()
        .map(|dir| dir.join("clawguard.log"))
        .unwrap_or_else(|_| PathBuf::from("clawguard.log"))
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
