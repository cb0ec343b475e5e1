//! Host environment contract
//!
//! Everything the bootstrapper needs from the shell it runs in: configuration
//! lookup, jailed file queries, working-directory mutations, diagnostics and
//! navigation. Directory mutations report a plain success flag, the way the
//! shell's script API does.

use crate::paths::{Jail, StaticPaths};

/// Error from a host file query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Relative path tries to leave its jail
    PathEscapesJail(String),
    NotFound(String),
    TooLarge(String),
    Io(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::PathEscapesJail(p) => write!(f, "Path escapes jail: {}", p),
            HostError::NotFound(p) => write!(f, "Not found: {}", p),
            HostError::TooLarge(p) => write!(f, "File too large: {}", p),
            HostError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for HostError {}

/// Call surface of the shell the bootstrapper runs inside
pub trait HostEnvironment: Send + Sync {
    fn static_paths(&self) -> StaticPaths;

    /// Named configuration value, rendered as a string
    fn configuration(&self, key: &str) -> Option<String>;

    fn app_name(&self) -> String;

    fn app_version(&self) -> String;

    fn file_exists(&self, jail: Jail, path_rel: &str) -> bool;

    fn file_read(&self, jail: Jail, path_rel: &str) -> Result<String, HostError>;

    /// Immediate children of a directory whose names match `pattern`
    fn list_dir(&self, jail: Jail, path_rel: &str, pattern: &str) -> Vec<String>;

    /// Remove `working/path_rel` recursively
    fn dir_remove(&self, path_rel: &str) -> bool;

    /// Create `working/path_rel` and its parents
    fn dir_make(&self, path_rel: &str) -> bool;

    /// Copy the tree at `src` into `dst_jail/dst_rel`
    ///
    /// With `src_jail` set, `src` is relative to that jail; otherwise it is an
    /// absolute path.
    fn dir_copy(&self, dst_rel: &str, dst_jail: Jail, src: &str, src_jail: Option<Jail>) -> bool;

    /// Host debug log sink
    fn debug(&self, line: &str);

    /// Show the diagnostic HTML while no page is loaded
    fn render_log(&self, html: &str);

    /// Change the displayed page
    fn navigate(&self, url: &str);
}
