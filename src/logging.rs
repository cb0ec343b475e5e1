//! Tracing initialization
//!
//! Output goes to `<home>/<slug>.log` when `log_to_file` is set (the file is
//! truncated on every start), to stdout when `log_to_stdout` is set, and to
//! stderr at warn level otherwise. `RUST_LOG` overrides the level.

use crate::settings::BootSettings;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// `yyyyMMddHHmmss` local timestamps for the log file
struct CompactLocalTime;

impl FormatTime for CompactLocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y%m%d%H%M%S"))
    }
}

/// Default filter directive for a `log_threshold` value
pub fn threshold_directive(threshold: u8) -> &'static str {
    match threshold {
        0 => "assetboot=info",
        1 => "assetboot=debug",
        _ => "assetboot=trace",
    }
}

pub fn log_file_path(home: &Path, slug: &str) -> PathBuf {
    home.join(format!("{}.log", slug))
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber; returns the log file path when file output is on
pub fn init(settings: &BootSettings, home: &Path, slug: &str) -> Result<Option<PathBuf>, String> {
    let directive = threshold_directive(settings.log_threshold);

    if settings.log_to_file {
        fs::create_dir_all(home).map_err(|e| format!("create {}: {}", home.display(), e))?;
        let path = log_file_path(home, slug);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| format!("open {}: {}", path.display(), e))?;

        tracing_subscriber::fmt()
            .with_env_filter(env_filter(directive))
            .with_writer(Mutex::new(file))
            .with_timer(CompactLocalTime)
            .with_ansi(false)
            .with_target(true)
            .try_init()
            .map_err(|e| e.to_string())?;
        return Ok(Some(path));
    }

    if settings.log_to_stdout {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(directive))
            .with_writer(std::io::stdout)
            .with_target(true)
            .try_init()
            .map_err(|e| e.to_string())?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter("assetboot=warn"))
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .map_err(|e| e.to_string())?;
    }
    Ok(None)
}
