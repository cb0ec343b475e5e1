//! Version markers
//!
//! Asset and plugin trees carry a small generated file naming their version,
//! e.g. `assets_version = "1.2.3"`. Markers are ordered either by the legacy
//! digit concatenation (`"1.2.3"` -> `123`) or component-wise.

use crate::settings::{VersionFormat, VersionOrdering};
use regex::Regex;
use std::cmp::Ordering;

/// Relative path of the asset tree marker in either root
pub const ASSETS_VERSION_FILE: &str = "assets/js/version.js";

lazy_static::lazy_static! {
    static ref ASSETS_MARKER_RE: Regex =
        Regex::new(r#"assets_version = ['"](.+)["']"#).unwrap();
}

/// A parsed version marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMarker {
    raw: String,
    value: u64,
}

/// Why a marker could not be turned into a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file does not contain the expected assignment
    MarkerNotFound,
    /// No leading digits once the dots are removed
    NotNumeric(String),
    /// Digits do not fit in a u64
    Overflow(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MarkerNotFound => write!(f, "version marker not found"),
            ParseError::NotNumeric(raw) => write!(f, "version '{}' is not numeric", raw),
            ParseError::Overflow(raw) => write!(f, "version '{}' is out of range", raw),
        }
    }
}

impl std::error::Error for ParseError {}

impl VersionMarker {
    /// Parse a bare dotted version string
    ///
    /// Dots are removed and the leading run of digits is the value, so
    /// `"1.2.3-beta"` parses as `123`.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let raw = raw.trim();
        let stripped: String = raw.chars().filter(|c| *c != '.').collect();
        let digits: String = stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(ParseError::NotNumeric(raw.to_string()));
        }
        let value = digits
            .parse::<u64>()
            .map_err(|_| ParseError::Overflow(raw.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    /// The dotted string as written in the marker file
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Dots-stripped integer used by the legacy ordering
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn compare(&self, other: &Self, ordering: VersionOrdering) -> Ordering {
        match ordering {
            VersionOrdering::DigitConcat => self.value.cmp(&other.value),
            VersionOrdering::Numeric => compare_components(&self.raw, &other.raw),
        }
    }
}

fn leading_number(part: &str) -> u64 {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Component-wise numeric comparison; missing components count as zero
fn compare_components(a: &str, b: &str) -> Ordering {
    let left: Vec<u64> = a.split('.').map(leading_number).collect();
    let right: Vec<u64> = b.split('.').map(leading_number).collect();
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Extract the asset tree version from `assets/js/version.js` contents
pub fn parse_assets_marker(contents: &str) -> Result<VersionMarker, ParseError> {
    let caps = ASSETS_MARKER_RE
        .captures(contents)
        .ok_or(ParseError::MarkerNotFound)?;
    VersionMarker::parse(&caps[1])
}

/// Relative path of a plugin's marker file in either root
pub fn plugin_version_file(plugin: &str, format: VersionFormat) -> String {
    match format {
        VersionFormat::Script => format!("plugins/{}/js/version.js", plugin),
        VersionFormat::PlainText => format!("plugins/{}/version.txt", plugin),
    }
}

/// Extract a plugin version from its marker file contents
pub fn parse_plugin_marker(
    plugin: &str,
    contents: &str,
    format: VersionFormat,
) -> Result<VersionMarker, ParseError> {
    match format {
        VersionFormat::Script => {
            let pattern = format!(
                r#"plugin_{}_version = ['"](.+)["']"#,
                regex::escape(plugin)
            );
            let re = Regex::new(&pattern).map_err(|_| ParseError::MarkerNotFound)?;
            let caps = re.captures(contents).ok_or(ParseError::MarkerNotFound)?;
            VersionMarker::parse(&caps[1])
        }
        VersionFormat::PlainText => {
            let line = contents
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .ok_or(ParseError::MarkerNotFound)?;
            VersionMarker::parse(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> VersionMarker {
        VersionMarker::parse(raw).unwrap()
    }

    #[test]
    fn test_digit_concat_values() {
        assert_eq!(v("1.2.3").value(), 123);
        assert_eq!(v("2.0").value(), 20);
        assert_eq!(v(" 1.2.3-beta ").value(), 123);
        assert_eq!(v("1.2.3-beta ").raw(), "1.2.3-beta");
    }

    #[test]
    fn test_digit_concat_ordering() {
        let ord = VersionOrdering::DigitConcat;
        assert_eq!(v("2.0").compare(&v("1.9"), ord), Ordering::Greater);
        // Legacy ordering collapses these two
        assert_eq!(v("1.10").compare(&v("11.0"), ord), Ordering::Equal);
        // and ranks 1.10 above 1.9 only by accident of digit count
        assert_eq!(v("1.9").compare(&v("1.10"), ord), Ordering::Less);
        assert_eq!(v("1.9.9").compare(&v("2.0"), ord), Ordering::Greater);
    }

    #[test]
    fn test_numeric_ordering() {
        let ord = VersionOrdering::Numeric;
        assert_eq!(v("1.10").compare(&v("11.0"), ord), Ordering::Less);
        assert_eq!(v("1.10").compare(&v("1.9"), ord), Ordering::Greater);
        assert_eq!(v("1.9.9").compare(&v("2.0"), ord), Ordering::Less);
        assert_eq!(v("1.0").compare(&v("1.0.0"), ord), Ordering::Equal);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            VersionMarker::parse("beta"),
            Err(ParseError::NotNumeric("beta".to_string()))
        );
        assert!(matches!(VersionMarker::parse(""), Err(ParseError::NotNumeric(_))));
        assert!(matches!(
            VersionMarker::parse("99999999999.99999999999"),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_assets_marker() {
        let marker = parse_assets_marker("var assets_version = \"1.4.2\";\n").unwrap();
        assert_eq!(marker.value(), 142);
        let marker = parse_assets_marker("assets_version = '0.9'").unwrap();
        assert_eq!(marker.raw(), "0.9");
        assert_eq!(
            parse_assets_marker("var version = \"1.0\";"),
            Err(ParseError::MarkerNotFound)
        );
    }

    #[test]
    fn test_plugin_marker_script() {
        let contents = "var plugin_chat_version = \"2.1\";";
        let marker = parse_plugin_marker("chat", contents, VersionFormat::Script).unwrap();
        assert_eq!(marker.value(), 21);
        assert_eq!(
            parse_plugin_marker("video", contents, VersionFormat::Script),
            Err(ParseError::MarkerNotFound)
        );
    }

    #[test]
    fn test_plugin_marker_plain_text() {
        let marker = parse_plugin_marker("chat", "\n 3.0.1\n", VersionFormat::PlainText).unwrap();
        assert_eq!(marker.value(), 301);
        assert_eq!(
            parse_plugin_marker("chat", "  \n", VersionFormat::PlainText),
            Err(ParseError::MarkerNotFound)
        );
    }

    #[test]
    fn test_plugin_version_file() {
        assert_eq!(
            plugin_version_file("chat", VersionFormat::Script),
            "plugins/chat/js/version.js"
        );
        assert_eq!(
            plugin_version_file("chat", VersionFormat::PlainText),
            "plugins/chat/version.txt"
        );
    }
}
