//! Path roots and jails
//!
//! Every root is an absolute prefix string ending in `/`, so a relative path
//! can be appended directly (`working + "assets"`).

use crate::config;
use std::fmt;
use std::path::{Path, PathBuf};

/// Named filesystem scope that relative paths are resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jail {
    Home,
    Application,
    Working,
}

impl fmt::Display for Jail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jail::Home => write!(f, "home"),
            Jail::Application => write!(f, "application"),
            Jail::Working => write!(f, "working"),
        }
    }
}

/// The three roots the bootstrapper works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub home: String,
    pub application: String,
    pub working: String,
}

impl StaticPaths {
    pub fn new(home: &str, application: &str, working: &str) -> Self {
        Self {
            home: with_trailing_slash(home),
            application: with_trailing_slash(application),
            working: with_trailing_slash(working),
        }
    }

    /// Root prefix for a jail
    pub fn root(&self, jail: Jail) -> &str {
        match jail {
            Jail::Home => &self.home,
            Jail::Application => &self.application,
            Jail::Working => &self.working,
        }
    }
}

/// Append `/` unless already present
pub fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Relative jail paths must not climb out of their root
pub fn is_jail_safe(path_rel: &str) -> bool {
    !path_rel.contains("..")
}

fn path_to_prefix(path: &Path) -> String {
    with_trailing_slash(&path.to_string_lossy().replace('\\', "/"))
}

/// Per-user home of the shell (settings file, log file)
///
/// `<config dir>/<slug>/` on Linux, `<user home>/<slug>/` elsewhere.
pub fn default_home_path() -> Option<String> {
    let base: PathBuf = if cfg!(target_os = "linux") {
        dirs::config_dir()?
    } else {
        dirs::home_dir()?
    };
    Some(path_to_prefix(&base.join(config::app_slug())))
}

/// Directory holding the running executable
pub fn application_path() -> Result<String, String> {
    let exe = std::env::current_exe().map_err(|e| format!("current_exe: {}", e))?;
    let exe = exe.canonicalize().unwrap_or(exe);
    let dir = exe
        .parent()
        .ok_or_else(|| "executable has no parent directory".to_string())?;
    Ok(path_to_prefix(dir))
}

/// Default writable working root (`<user home>/<slug>-files/`)
pub fn default_working_path() -> Option<String> {
    let home = dirs::home_dir()?;
    Some(path_to_prefix(
        &home.join(format!("{}-files", config::app_slug())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_gain_trailing_slash() {
        let paths = StaticPaths::new("/h", "/app/", "/w");
        assert_eq!(paths.home, "/h/");
        assert_eq!(paths.application, "/app/");
        assert_eq!(paths.root(Jail::Working), "/w/");
    }

    #[test]
    fn test_jail_safety() {
        assert!(is_jail_safe("assets/js/version.js"));
        assert!(!is_jail_safe("../etc/passwd"));
        assert!(!is_jail_safe("plugins/../../x"));
    }

    #[test]
    fn test_jail_display_matches_host_names() {
        assert_eq!(Jail::Working.to_string(), "working");
        assert_eq!(Jail::Application.to_string(), "application");
        assert_eq!(Jail::Home.to_string(), "home");
    }
}
