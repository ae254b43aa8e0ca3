//! Logging init: append to a log file under the XDG state dir, or fall back
//! to stderr when that is not writable (read-only HOME during a package
//! install).
//!
//! The filter comes from `GKN_INSTALL_LOG`, then `RUST_LOG`, then the
//! built-in default for the chosen sink.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive for this tool.
pub const LOG_ENV: &str = "GKN_INSTALL_LOG";

const FILE_FILTER: &str = "info,gkn_install_core=debug,gkn_install=debug";

// stderr is what a package manager shows the user; keep it to step progress.
const STDERR_FILTER: &str = "warn,gkn_install_core=info";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Path of the log file, `~/.local/state/gkn-install/gkn-install.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gkn-install")?;
    Ok(xdg_dirs
        .get_state_home()
        .join("gkn-install")
        .join("gkn-install.log"))
}

/// Open `path` for appending, creating its directory first.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Initialize structured logging to the XDG state log file.
/// On failure returns Err so the caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(FILE_FILTER))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {}", e))?;

    // Runs append to one file; mark where each starts.
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        log = %path.display(),
        "gkn-install run started"
    );
    Ok(())
}

/// Initialize logging to stderr only. Use when [`init_logging`] fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(STDERR_FILTER))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}
