//! Persistent shell settings
//!
//! A JSON object at the settings path. Missing keys are filled with defaults
//! and written back, unknown keys are preserved.

use crate::paths::{default_working_path, with_trailing_slash};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const KEY_JAIL_WORKING: &str = "jail_working";
pub const KEY_FILEREAD_JAILED: &str = "fileread_jailed";
pub const KEY_INDEX_FILE: &str = "index_file";
pub const KEY_VERSION_FORMAT: &str = "version_format";
pub const KEY_VERSION_ORDERING: &str = "version_ordering";
pub const KEY_COPY_FAILURE: &str = "copy_failure";
pub const KEY_NAVIGATE_DELAY_MS: &str = "navigate_delay_ms";
pub const KEY_FORWARD_DEBUG: &str = "forward_debug";

/// Where plugin version markers live and how they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionFormat {
    /// `plugins/<name>/js/version.js` containing `plugin_<name>_version = "X"`
    #[default]
    Script,
    /// `plugins/<name>/version.txt` containing the bare dotted version
    PlainText,
}

/// How two version markers are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrdering {
    /// Strip dots and compare as one integer ("1.10" == "11.0")
    #[default]
    DigitConcat,
    /// Compare dot-separated components numerically ("1.10" > "1.9")
    Numeric,
}

/// What a failed directory copy does to the boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyFailureMode {
    /// Log the host result and carry on as if the copy succeeded
    #[default]
    LogOnly,
    /// Stop the boot with `BootError::CopyFailed`
    Abort,
}

macro_rules! parse_setting_enum {
    ($ty:ty) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                serde_json::from_value(Value::String(s.trim().to_string()))
                    .map_err(|_| format!("invalid value '{}'", s))
            }
        }
    };
}

parse_setting_enum!(VersionFormat);
parse_setting_enum!(VersionOrdering);
parse_setting_enum!(CopyFailureMode);

/// Settings read by the shell and the bootstrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootSettings {
    pub jail_working: String,
    pub fileread_jailed: bool,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub log_threshold: u8,
    pub index_file: String,
    pub version_format: VersionFormat,
    pub version_ordering: VersionOrdering,
    pub copy_failure: CopyFailureMode,
    pub navigate_delay_ms: u64,
    pub forward_debug: bool,
}

impl Default for BootSettings {
    fn default() -> Self {
        Self {
            jail_working: default_working_path().unwrap_or_else(|| "./files/".to_string()),
            fileread_jailed: true,
            log_to_file: false,
            log_to_stdout: false,
            log_threshold: 0,
            index_file: String::new(),
            version_format: VersionFormat::default(),
            version_ordering: VersionOrdering::default(),
            copy_failure: CopyFailureMode::default(),
            navigate_delay_ms: 3000,
            forward_debug: true,
        }
    }
}

impl BootSettings {
    /// Look up a setting by key, rendered as the host would hand it out
    ///
    /// Booleans become `"true"`/`"false"`, enums their snake_case name.
    pub fn value(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Error type for settings operations
#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings I/O error: {}", e),
            SettingsError::Parse(e) => write!(f, "Settings parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Read settings, fill in missing keys and persist the result
///
/// The working path is normalized to end with `/`.
pub fn load_or_init(path: &Path) -> Result<BootSettings, SettingsError> {
    let mut stored: Map<String, Value> = if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("read {}: {}", path.display(), e)))?;
        if content.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&content)
                .map_err(|e| SettingsError::Parse(format!("{}: {}", path.display(), e)))?
        }
    } else {
        Map::new()
    };

    let mut settings: BootSettings = serde_json::from_value(Value::Object(stored.clone()))
        .map_err(|e| SettingsError::Parse(format!("{}: {}", path.display(), e)))?;
    settings.jail_working = with_trailing_slash(&settings.jail_working);

    let full = match serde_json::to_value(&settings) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(SettingsError::Parse("settings did not serialize to an object".into())),
        Err(e) => return Err(SettingsError::Parse(e.to_string())),
    };

    let mut changed = !path.exists();
    for (key, value) in full {
        if stored.get(&key) != Some(&value) {
            stored.insert(key, value);
            changed = true;
        }
    }

    if changed {
        write_settings(path, &stored)?;
        tracing::info!(
            op = "settings.write",
            path = %path.display(),
            "Settings written with defaults"
        );
    }

    Ok(settings)
}

fn write_settings(path: &Path, map: &Map<String, Value>) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::Io(format!("create {}: {}", parent.display(), e)))?;
        }
    }

    let json = serde_json::to_string_pretty(map)
        .map_err(|e| SettingsError::Parse(e.to_string()))?;

    // tmp file -> rename
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)
        .map_err(|e| SettingsError::Io(format!("write {}: {}", temp_path.display(), e)))?;
    fs::rename(&temp_path, path)
        .map_err(|e| SettingsError::Io(format!("rename {}: {}", path.display(), e)))?;
    Ok(())
}
