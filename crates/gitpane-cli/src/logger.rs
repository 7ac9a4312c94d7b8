//! File logging. The terminal belongs to the UI, so log lines go to
//! `<cache dir>/gitpane.log` instead of stderr.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use gitpane_core::config::default_log_path;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// `RUST_LOG` holds a bare level name; anything else falls back to info.
fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .map(|v| match v.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        })
        .unwrap_or(LevelFilter::Info)
}

/// Install the global logger and return the log file path.
pub fn init(level: Option<LevelFilter>) -> Result<PathBuf> {
    let level = level.unwrap_or_else(level_from_env);
    let path = default_log_path().context("failed to resolve log path")?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();
    WriteLogger::init(level, config, file).context("failed to install logger")?;
    Ok(path)
}
