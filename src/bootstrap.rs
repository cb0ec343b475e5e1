//! Asset tree bootstrap
//!
//! Picks the asset tree to boot from, syncs newer bundled copies into the
//! working directory and schedules navigation to the chosen index page.
//!
//! # Flow
//!
//! 1. `resolve_asset_source` compares `assets/js/version.js` in the working
//!    and application roots, copying `assets` when the bundled copy is newer
//! 2. No marker in either root → abort, the shell stays on its boot page
//! 3. `sync_plugins` copies every bundled plugin that is missing or older in
//!    the working root
//! 4. `navigate` schedules a one-shot switch to the working index page
//!
//! # Copy failures
//!
//! The host reports each directory step as a success flag. Under
//! `CopyFailureMode::LogOnly` a failed step is logged and the boot carries on
//! as if it succeeded (the shell's long-standing behaviour, which can boot a
//! half-copied tree). `CopyFailureMode::Abort` turns it into
//! `BootError::CopyFailed` and nothing is navigated.

use crate::config;
use crate::host::HostEnvironment;
use crate::log_buffer::LogBuffer;
use crate::paths::{Jail, StaticPaths};
use crate::settings::{
    CopyFailureMode, VersionFormat, VersionOrdering, KEY_COPY_FAILURE, KEY_FILEREAD_JAILED,
    KEY_FORWARD_DEBUG, KEY_NAVIGATE_DELAY_MS, KEY_VERSION_FORMAT, KEY_VERSION_ORDERING,
};
use crate::timer::{self, TimerHandle};
use crate::version::{
    parse_assets_marker, parse_plugin_marker, plugin_version_file, VersionMarker,
    ASSETS_VERSION_FILE,
};
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Types
// =============================================================================

/// Policy knobs read from host configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BootPolicy {
    /// Copy sources are addressed inside the application jail instead of by
    /// absolute path
    pub fileread_jailed: bool,
    pub version_format: VersionFormat,
    pub version_ordering: VersionOrdering,
    pub copy_failure: CopyFailureMode,
    pub navigate_delay: Duration,
    /// Also send every log line to the host debug sink
    pub forward_debug: bool,
}

impl Default for BootPolicy {
    fn default() -> Self {
        Self {
            fileread_jailed: false,
            version_format: VersionFormat::default(),
            version_ordering: VersionOrdering::default(),
            copy_failure: CopyFailureMode::default(),
            navigate_delay: Duration::from_millis(3000),
            forward_debug: true,
        }
    }
}

fn config_or<T: FromStr>(host: &dyn HostEnvironment, key: &str, default: T) -> T {
    match host.configuration(key) {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    op = "boot.config.invalid",
                    key = %key,
                    value = %raw,
                    "Invalid configuration value, using default"
                );
                default
            }
        },
    }
}

impl BootPolicy {
    pub fn from_host(host: &dyn HostEnvironment) -> Self {
        let defaults = Self::default();
        Self {
            // Only the literal "true" enables jailed reads
            fileread_jailed: host
                .configuration(KEY_FILEREAD_JAILED)
                .map(|v| v == "true")
                .unwrap_or(false),
            version_format: config_or(host, KEY_VERSION_FORMAT, defaults.version_format),
            version_ordering: config_or(host, KEY_VERSION_ORDERING, defaults.version_ordering),
            copy_failure: config_or(host, KEY_COPY_FAILURE, defaults.copy_failure),
            navigate_delay: Duration::from_millis(config_or(
                host,
                KEY_NAVIGATE_DELAY_MS,
                defaults.navigate_delay.as_millis() as u64,
            )),
            forward_debug: config_or(host, KEY_FORWARD_DEBUG, defaults.forward_debug),
        }
    }
}

/// Everything one boot run works with, built once from the host
#[derive(Debug, Clone)]
pub struct BootContext {
    pub paths: StaticPaths,
    pub policy: BootPolicy,
    pub log: LogBuffer,
}

impl BootContext {
    pub fn from_host(host: &dyn HostEnvironment) -> Self {
        Self {
            paths: host.static_paths(),
            policy: BootPolicy::from_host(host),
            log: LogBuffer::new(),
        }
    }
}

/// Which presence/ordering case selected the boot root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetDecision {
    OnlyWorking,
    OnlyApplication,
    WorkingNewer,
    Same,
    ApplicationNewer,
}

impl AssetDecision {
    /// Whether the bundled assets must be copied into the working root
    pub fn needs_copy(self) -> bool {
        matches!(self, AssetDecision::OnlyApplication | AssetDecision::ApplicationNewer)
    }

    fn describe(self) -> &'static str {
        match self {
            AssetDecision::OnlyWorking => "Assets only found in working directory.",
            AssetDecision::OnlyApplication => "Assets only found in application directory.",
            AssetDecision::WorkingNewer => "Upgraded assets found in working directory.",
            AssetDecision::Same => "Assets in working and application directory are the same.",
            AssetDecision::ApplicationNewer => "Newer assets found in application directory.",
        }
    }
}

/// Decide where to boot from given the two asset markers
///
/// `None` when neither root carries a usable marker.
pub fn decide(
    working: Option<&VersionMarker>,
    application: Option<&VersionMarker>,
    ordering: VersionOrdering,
) -> Option<AssetDecision> {
    match (working, application) {
        (None, None) => None,
        (Some(_), None) => Some(AssetDecision::OnlyWorking),
        (None, Some(_)) => Some(AssetDecision::OnlyApplication),
        (Some(w), Some(a)) => Some(match w.compare(a, ordering) {
            Ordering::Greater => AssetDecision::WorkingNewer,
            Ordering::Equal => AssetDecision::Same,
            Ordering::Less => AssetDecision::ApplicationNewer,
        }),
    }
}

/// Root the UI boots from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub root: String,
    pub decision: AssetDecision,
}

/// What `sync_plugins` did with each bundled plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSyncReport {
    pub copied: Vec<String>,
    pub current: Vec<String>,
    pub skipped: Vec<String>,
}

/// Error that stops a boot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootError {
    /// A directory step failed while copy failures abort
    CopyFailed { path: String },
}

impl std::fmt::Display for BootError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootError::CopyFailed { path } => write!(f, "Copy into working directory failed: {}", path),
        }
    }
}

impl std::error::Error for BootError {}

/// Result of a full boot run
pub enum BootOutcome {
    /// Navigation scheduled
    Navigating { url: String, handle: TimerHandle },
    /// No asset tree in either root; nothing navigated
    NoAssets,
}

/// Build the `file://` URL for an absolute path
pub fn file_url(path: &str) -> String {
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    }
}

// =============================================================================
// Bootstrapper
// =============================================================================

pub struct Bootstrapper<H: HostEnvironment + 'static> {
    host: Arc<H>,
    ctx: BootContext,
}

impl<H: HostEnvironment + 'static> Bootstrapper<H> {
    pub fn new(host: Arc<H>) -> Self {
        let ctx = BootContext::from_host(host.as_ref());
        Self { host, ctx }
    }

    pub fn context(&self) -> &BootContext {
        &self.ctx
    }

    /// Record a diagnostic line everywhere it is shown
    fn log(&mut self, op: &'static str, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(op = op, "{}", line);
        if self.ctx.policy.forward_debug {
            self.host.debug(&line);
        }
        self.ctx.log.push(line);
        self.host.render_log(&self.ctx.log.render_html());
    }

    /// Log app identity, pick the asset root, sync plugins and navigate
    pub fn run(&mut self) -> Result<BootOutcome, BootError> {
        let identity = format!("{} {}", self.host.app_name(), self.host.app_version());
        self.log("boot.start", identity);
        self.log("boot.start", "Booting...");

        let source = match self.resolve_asset_source()? {
            Some(s) => s,
            None => return Ok(BootOutcome::NoAssets),
        };

        self.sync_plugins()?;
        let (url, handle) = self.navigate(&source.root);
        Ok(BootOutcome::Navigating { url, handle })
    }

    fn read_assets_marker(&mut self, jail: Jail) -> Option<VersionMarker> {
        if !self.host.file_exists(jail, ASSETS_VERSION_FILE) {
            return None;
        }

        let parsed = self
            .host
            .file_read(jail, ASSETS_VERSION_FILE)
            .map_err(|e| e.to_string())
            .and_then(|contents| parse_assets_marker(&contents).map_err(|e| e.to_string()));

        match parsed {
            Ok(marker) => {
                self.log(
                    "boot.assets.found",
                    format!("Found assets in {} dir: Version {}", jail, marker.raw()),
                );
                Some(marker)
            }
            Err(e) => {
                self.log(
                    "boot.assets.unreadable",
                    format!("Assets in {} dir have no usable version ({})", jail, e),
                );
                None
            }
        }
    }

    /// Pick the asset tree to boot from, copying the bundled one if needed
    ///
    /// The boot root is always the working directory; `None` means no tree
    /// was found anywhere.
    pub fn resolve_asset_source(&mut self) -> Result<Option<AssetSource>, BootError> {
        let working = self.read_assets_marker(Jail::Working);
        let application = self.read_assets_marker(Jail::Application);

        let decision = match decide(
            working.as_ref(),
            application.as_ref(),
            self.ctx.policy.version_ordering,
        ) {
            Some(d) => d,
            None => {
                let msg = format!(
                    "Assets not found in either working directory ( {} ) or application directory ( {} ).",
                    self.ctx.paths.working, self.ctx.paths.application
                );
                self.log("boot.assets.missing", msg);
                return Ok(None);
            }
        };

        self.log("boot.assets.decision", decision.describe());

        if decision.needs_copy() {
            self.copy_directory("assets")?;
        }

        Ok(Some(AssetSource {
            root: self.ctx.paths.working.clone(),
            decision,
        }))
    }

    fn read_plugin_marker(&self, jail: Jail, plugin: &str) -> Result<VersionMarker, String> {
        let format = self.ctx.policy.version_format;
        let file = plugin_version_file(plugin, format);
        let contents = self.host.file_read(jail, &file).map_err(|e| e.to_string())?;
        parse_plugin_marker(plugin, &contents, format).map_err(|e| e.to_string())
    }

    /// Copy every bundled plugin that is missing or older in the working root
    pub fn sync_plugins(&mut self) -> Result<PluginSyncReport, BootError> {
        self.log("boot.plugins.start", "Setting up plugins");

        let mut report = PluginSyncReport::default();
        let plugins = self.host.list_dir(Jail::Application, "plugins", "*");

        for plugin in plugins {
            let app_version = match self.read_plugin_marker(Jail::Application, &plugin) {
                Ok(v) => {
                    self.log(
                        "boot.plugins.app_version",
                        format!("Plugin {} in app dir: {}", plugin, v.raw()),
                    );
                    v
                }
                Err(e) => {
                    self.log(
                        "boot.plugins.skip",
                        format!("Plugin {} in app dir: Could not find version ({}). Skipping.", plugin, e),
                    );
                    report.skipped.push(plugin);
                    continue;
                }
            };

            let version_file = plugin_version_file(&plugin, self.ctx.policy.version_format);
            let working_version = if self.host.file_exists(Jail::Working, &version_file) {
                match self.read_plugin_marker(Jail::Working, &plugin) {
                    Ok(v) => {
                        self.log(
                            "boot.plugins.working_version",
                            format!("Plugin {} in working dir: {}", plugin, v.raw()),
                        );
                        Some(v)
                    }
                    Err(e) => {
                        self.log(
                            "boot.plugins.working_unreadable",
                            format!("Plugin {} in working dir has no usable version ({})", plugin, e),
                        );
                        None
                    }
                }
            } else {
                None
            };

            let outdated = match &working_version {
                None => true,
                Some(w) => app_version.compare(w, self.ctx.policy.version_ordering) == Ordering::Greater,
            };

            if outdated {
                self.log("boot.plugins.copy", format!("Plugin {} copying.", plugin));
                self.copy_directory(&format!("plugins/{}", plugin))?;
                report.copied.push(plugin);
            } else {
                self.log(
                    "boot.plugins.current",
                    format!("Plugin {} up to date or newer", plugin),
                );
                report.current.push(plugin);
            }
        }

        Ok(report)
    }

    /// Replace `working/path_rel` with the bundled copy
    ///
    /// Always runs remove, make and copy in that order.
    pub fn copy_directory(&mut self, path_rel: &str) -> Result<(), BootError> {
        let working = self.ctx.paths.working.clone();

        self.log("boot.copy.remove", format!("Removing {}{}", working, path_rel));
        let removed = self.host.dir_remove(path_rel);
        self.log("boot.copy.remove", format!("Remove result: {}", removed));

        self.log("boot.copy.make", format!("Making dir {}{}", working, path_rel));
        let made = self.host.dir_make(path_rel);
        self.log("boot.copy.make", format!("Making dir result: {}", made));

        let (src, src_jail) = if self.ctx.policy.fileread_jailed {
            (path_rel.to_string(), Some(Jail::Application))
        } else {
            (format!("{}{}", self.ctx.paths.application, path_rel), None)
        };
        self.log(
            "boot.copy.copy",
            format!("Copying from {} to {}{}", src, working, path_rel),
        );
        let copied = self.host.dir_copy(path_rel, Jail::Working, &src, src_jail);
        self.log("boot.copy.copy", format!("Copying result: {}", copied));

        if removed && made && copied {
            return Ok(());
        }

        match self.ctx.policy.copy_failure {
            CopyFailureMode::LogOnly => {
                tracing::warn!(
                    op = "boot.copy.failed",
                    path = %path_rel,
                    removed = removed,
                    made = made,
                    copied = copied,
                    "Directory copy reported failure, continuing"
                );
                Ok(())
            }
            CopyFailureMode::Abort => {
                self.log("boot.copy.fatal", format!("Copy of {} failed. Aborting boot.", path_rel));
                Err(BootError::CopyFailed {
                    path: path_rel.to_string(),
                })
            }
        }
    }

    /// Schedule the switch to `root`'s index page
    ///
    /// The returned handle can cancel the switch before the delay elapses.
    pub fn navigate(&mut self, root: &str) -> (String, TimerHandle) {
        let url = file_url(&format!("{}{}", root, config::index_page()));
        self.log("boot.navigate", format!("Navigating to {}", url));

        let host = Arc::clone(&self.host);
        let target = url.clone();
        let handle = timer::schedule(self.ctx.policy.navigate_delay, move || {
            tracing::info!(op = "boot.navigate.fire", url = %target, "Changing page");
            host.navigate(&target);
        });
        (url, handle)
    }
}
