//! Asset bootstrapper - Entry Point
//!
//! # Startup Order
//!
//! 1. Load `.env.local`, parse the command line
//! 2. Resolve the shell home, load or initialize settings
//! 3. Initialize tracing from settings
//! 4. Resolve the application and working roots
//! 5. Explicit index page (command line, then settings) → navigate directly
//! 6. Otherwise run the bootstrapper and wait for the scheduled navigation

use anyhow::{Context, Result};
use assetboot::bootstrap::file_url;
use assetboot::paths::{self, StaticPaths};
use assetboot::{config, logging, settings};
use assetboot::{BootOutcome, Bootstrapper, HostEnvironment, LocalHost};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "assetboot", version, about = "Boot the shell UI from the newest asset tree")]
struct Cli {
    /// Settings file to use
    #[arg(short = 'c', long = "config", value_name = "SETTINGS_FILE")]
    config: Option<PathBuf>,

    /// Page (.html) to load instead of running the boot flow
    #[arg(short = 'i', long = "index", value_name = "INDEX_FILE")]
    index: Option<String>,
}

/// What the shell loads first
#[derive(Debug, PartialEq, Eq)]
enum LaunchTarget {
    /// A page named on the command line or in settings
    Page(String),
    /// Run the asset bootstrap
    Boot,
}

/// Command line beats settings; an empty setting means "boot"
fn launch_target(cli_index: Option<&str>, settings_index: &str) -> LaunchTarget {
    match cli_index {
        Some(index) if !index.is_empty() => LaunchTarget::Page(file_url(index)),
        _ if !settings_index.is_empty() => LaunchTarget::Page(settings_index.to_string()),
        _ => LaunchTarget::Boot,
    }
}

fn main() -> Result<()> {
    // ==========================================================================
    // PHASE 1: ENVIRONMENT AND COMMAND LINE
    // ==========================================================================
    if dotenvy::from_filename(".env.local").is_err() {
        let _ = dotenvy::from_filename("../.env.local");
    }
    let cli = Cli::parse();

    // ==========================================================================
    // PHASE 2: HOME AND SETTINGS
    // ==========================================================================
    let home = paths::default_home_path().context("no home directory for this user")?;
    std::fs::create_dir_all(&home).with_context(|| format!("create {}", home))?;

    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(&home).join(format!("{}.json", config::app_slug())));
    let settings = settings::load_or_init(&settings_path)
        .with_context(|| format!("load settings {}", settings_path.display()))?;

    // ==========================================================================
    // PHASE 3: TRACING INITIALIZATION
    // ==========================================================================
    let log_file = logging::init(&settings, Path::new(&home), config::app_slug())
        .map_err(anyhow::Error::msg)?;

    tracing::info!(
        op = "boot.startup",
        app = %config::app_name(),
        version = %config::app_version(),
        settings = %settings_path.display(),
        log_file = ?log_file,
        "Shell bootstrapper starting"
    );

    // ==========================================================================
    // PHASE 4: ROOTS
    // ==========================================================================
    std::fs::create_dir_all(&settings.jail_working)
        .with_context(|| format!("create working directory {}", settings.jail_working))?;
    let application = paths::application_path().map_err(anyhow::Error::msg)?;
    let static_paths = StaticPaths::new(&home, &application, &settings.jail_working);

    tracing::debug!(
        op = "boot.paths",
        home = %static_paths.home,
        application = %static_paths.application,
        working = %static_paths.working,
        "Roots resolved"
    );

    let host = Arc::new(LocalHost::new(
        static_paths,
        settings.clone(),
        config::app_name(),
        config::app_version(),
    ));

    // ==========================================================================
    // PHASE 5: EXPLICIT PAGE
    // ==========================================================================
    if let LaunchTarget::Page(url) = launch_target(cli.index.as_deref(), &settings.index_file) {
        tracing::info!(op = "boot.explicit_page", url = %url, "Loading explicit index page");
        host.navigate(&url);
        return Ok(());
    }

    // ==========================================================================
    // PHASE 6: ASSET BOOTSTRAP
    // ==========================================================================
    let mut bootstrapper = Bootstrapper::new(host);
    match bootstrapper.run() {
        Ok(BootOutcome::Navigating { url, handle }) => {
            tracing::info!(op = "boot.navigate.pending", url = %url, "Waiting for navigation");
            handle.wait();
            Ok(())
        }
        Ok(BootOutcome::NoAssets) => {
            tracing::warn!(op = "boot.no_assets", "No asset tree found, staying on boot page");
            Ok(())
        }
        Err(e) => {
            tracing::error!(op = "boot.fatal", error = %e, "FATAL: Boot aborted");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_index_wins() {
        assert_eq!(
            launch_target(Some("/srv/ui/index.html"), "file:///other.html"),
            LaunchTarget::Page("file:///srv/ui/index.html".to_string())
        );
    }

    #[test]
    fn test_settings_index_used_verbatim() {
        assert_eq!(
            launch_target(None, "http://localhost:8080/"),
            LaunchTarget::Page("http://localhost:8080/".to_string())
        );
        assert_eq!(
            launch_target(Some(""), "file:///x.html"),
            LaunchTarget::Page("file:///x.html".to_string())
        );
    }

    #[test]
    fn test_boot_when_nothing_given() {
        assert_eq!(launch_target(None, ""), LaunchTarget::Boot);
    }

    #[test]
    fn test_cli_parses_short_flags() {
        let cli = Cli::parse_from(["assetboot", "-c", "/tmp/s.json", "-i", "page.html"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(cli.index.as_deref(), Some("page.html"));
    }
}
