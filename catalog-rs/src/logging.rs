//! Tracing subscriber setup for the catalog-rs binary
//!
//! `RUST_LOG` overrides the configured level. Output goes to the TOML
//! `[logging] file` when one is set, stderr otherwise.

use catalog_common::config::{CompiledDefaults, TomlConfig};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Level directive from `[logging] level`, falling back to the compiled default
pub fn resolve_log_level(config: Option<&TomlConfig>) -> String {
    config
        .map(|c| c.logging.level.trim())
        .filter(|level| !level.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().log_level)
}

/// Open a log file for appending, creating it and any missing parent folders
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber
///
/// If the log file cannot be opened the subscriber still goes up on stderr
/// and the open error is returned, so the caller can report it once tracing
/// works.
pub fn init_tracing(level: &str, log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file.map(open_log_file).transpose() {
        Ok(Some(file)) => {
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            Ok(())
        }
        Ok(None) => {
            builder.init();
            Ok(())
        }
        Err(e) => {
            builder.init();
            Err(e)
        }
    }
}
