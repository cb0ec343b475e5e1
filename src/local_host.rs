//! Filesystem-backed host
//!
//! Implements the host contract on the local disk so the bootstrapper can run
//! as a standalone binary. Relative paths are resolved inside their jail and
//! rejected if they try to leave it; mutations only ever touch the working
//! jail.

use crate::host::{HostError, HostEnvironment};
use crate::paths::{is_jail_safe, Jail, StaticPaths};
use crate::settings::BootSettings;
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// Largest file `file_read` will return
pub const MAX_READ_BYTES: u64 = 1_000_000;

pub struct LocalHost {
    paths: StaticPaths,
    settings: BootSettings,
    app_name: String,
    app_version: String,
    /// Latest diagnostic HTML handed to `render_log`
    last_render: Mutex<Option<String>>,
    /// Every URL passed to `navigate`
    navigated: Mutex<Vec<String>>,
}

impl LocalHost {
    pub fn new(paths: StaticPaths, settings: BootSettings, app_name: &str, app_version: &str) -> Self {
        Self {
            paths,
            settings,
            app_name: app_name.to_string(),
            app_version: app_version.to_string(),
            last_render: Mutex::new(None),
            navigated: Mutex::new(Vec::new()),
        }
    }

    fn resolve(&self, jail: Jail, path_rel: &str) -> Result<PathBuf, HostError> {
        if !is_jail_safe(path_rel) {
            return Err(HostError::PathEscapesJail(path_rel.to_string()));
        }
        Ok(PathBuf::from(format!("{}{}", self.paths.root(jail), path_rel)))
    }

    pub fn last_render(&self) -> Option<String> {
        self.last_render.lock().ok().and_then(|g| g.clone())
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

/// Copy the tree under `src` into `dst`, creating directories as needed
fn copy_tree(src: &Path, dst: &Path) -> Result<u64, String> {
    if !src.is_dir() {
        return Err(format!("source is not a directory: {}", src.display()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| e.to_string())?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| e.to_string())?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| format!("create {}: {}", target.display(), e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .map_err(|e| format!("copy {}: {}", entry.path().display(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

impl HostEnvironment for LocalHost {
    fn static_paths(&self) -> StaticPaths {
        self.paths.clone()
    }

    fn configuration(&self, key: &str) -> Option<String> {
        self.settings.value(key)
    }

    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn app_version(&self) -> String {
        self.app_version.clone()
    }

    fn file_exists(&self, jail: Jail, path_rel: &str) -> bool {
        self.resolve(jail, path_rel)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    fn file_read(&self, jail: Jail, path_rel: &str) -> Result<String, HostError> {
        let path = self.resolve(jail, path_rel)?;
        let meta = fs::metadata(&path).map_err(|_| HostError::NotFound(path_rel.to_string()))?;
        if meta.len() > MAX_READ_BYTES {
            return Err(HostError::TooLarge(path_rel.to_string()));
        }
        let bytes = fs::read(&path).map_err(|e| HostError::Io(format!("{}: {}", path_rel, e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn list_dir(&self, jail: Jail, path_rel: &str, pattern: &str) -> Vec<String> {
        let dir = match self.resolve(jail, path_rel) {
            Ok(d) => d,
            Err(_) => return Vec::new(),
        };
        let matcher = match Pattern::new(pattern) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(op = "host.list.bad_pattern", pattern = %pattern, error = %e, "Invalid glob pattern");
                return Vec::new();
            }
        };
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| matcher.matches(name))
            .collect();
        names.sort();
        names
    }

    fn dir_remove(&self, path_rel: &str) -> bool {
        let path = match self.resolve(Jail::Working, path_rel) {
            Ok(p) => p,
            Err(_) => return false,
        };
        if !path.exists() {
            return true;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(op = "host.dir.remove_failed", path = %path.display(), error = %e, "Remove failed");
                false
            }
        }
    }

    fn dir_make(&self, path_rel: &str) -> bool {
        let path = match self.resolve(Jail::Working, path_rel) {
            Ok(p) => p,
            Err(_) => return false,
        };
        match fs::create_dir_all(&path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(op = "host.dir.make_failed", path = %path.display(), error = %e, "Make dir failed");
                false
            }
        }
    }

    fn dir_copy(&self, dst_rel: &str, dst_jail: Jail, src: &str, src_jail: Option<Jail>) -> bool {
        // Only the working jail is writable
        if dst_jail != Jail::Working {
            return false;
        }
        let dst = match self.resolve(dst_jail, dst_rel) {
            Ok(p) => p,
            Err(_) => return false,
        };
        let src = match src_jail {
            Some(jail) => match self.resolve(jail, src) {
                Ok(p) => p,
                Err(_) => return false,
            },
            None if is_jail_safe(src) => PathBuf::from(src),
            None => return false,
        };

        match copy_tree(&src, &dst) {
            Ok(files) => {
                tracing::debug!(
                    op = "host.dir.copied",
                    src = %src.display(),
                    dst = %dst.display(),
                    files = files,
                    "Directory copied"
                );
                true
            }
            Err(e) => {
                tracing::warn!(op = "host.dir.copy_failed", error = %e, "Directory copy failed");
                false
            }
        }
    }

    fn debug(&self, line: &str) {
        tracing::debug!(op = "host.debug", "{}", line);
    }

    fn render_log(&self, html: &str) {
        tracing::trace!(op = "host.render_log", html = %html, "Diagnostics updated");
        if let Ok(mut guard) = self.last_render.lock() {
            *guard = Some(html.to_string());
        }
    }

    fn navigate(&self, url: &str) {
        tracing::info!(op = "host.navigate", url = %url, "Navigating");
        println!("{}", url);
        if let Ok(mut guard) = self.navigated.lock() {
            guard.push(url.to_string());
        }
    }
}
