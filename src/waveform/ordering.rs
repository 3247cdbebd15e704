//! Capture file enumeration and ordering policies.
//!
//! Ordering only affects display, surveys and waveform tables. Summation is
//! commutative and never depends on it.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extension of capture files written by the digitizer.
pub const CAPTURE_EXTENSION: &str = ".data32";

/// How capture files in a folder are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileOrdering {
    /// Directory listing order, whatever the filesystem returns.
    #[default]
    Listing,
    /// By the shot number after a `Ch<n>_` tag (`AP240 Ch1_10.data32` → 10).
    /// Names without the tag sort as 0.
    NumericSuffix,
    /// Digit runs compared numerically, other text case-insensitively.
    Natural,
}

impl FileOrdering {
    /// Returns all available policy names.
    pub fn variants() -> &'static [&'static str] {
        &["listing", "numeric-suffix", "natural"]
    }

    /// Sort file names in place according to this policy.
    pub fn sort(&self, names: &mut [String]) {
        match self {
            FileOrdering::Listing => {}
            FileOrdering::NumericSuffix => names.sort_by_key(|n| shot_number(n)),
            FileOrdering::Natural => names.sort_by(|a, b| natural_cmp(a, b)),
        }
    }
}

impl fmt::Display for FileOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrdering::Listing => write!(f, "listing"),
            FileOrdering::NumericSuffix => write!(f, "numeric-suffix"),
            FileOrdering::Natural => write!(f, "natural"),
        }
    }
}

impl FromStr for FileOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listing" | "none" => Ok(FileOrdering::Listing),
            "numeric-suffix" | "numeric" => Ok(FileOrdering::NumericSuffix),
            "natural" => Ok(FileOrdering::Natural),
            _ => Err(format!(
                "Unknown file ordering '{}'. Valid options: {}",
                s,
                FileOrdering::variants().join(", ")
            )),
        }
    }
}

fn shot_regex() -> &'static Regex {
    static SHOT: OnceLock<Regex> = OnceLock::new();
    SHOT.get_or_init(|| Regex::new(r"Ch\d+_(\d+)").expect("static regex is valid"))
}

/// Shot number after the `Ch<n>_` tag, or 0 when absent.
pub fn shot_number(name: &str) -> u64 {
    shot_regex()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPart {
    Text(String),
    Number(u128),
}

fn natural_key(name: &str) -> Vec<NaturalPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in name.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            parts.push(finish_part(&current, in_digits));
            current.clear();
        }
        in_digits = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(finish_part(&current, in_digits));
    }
    parts
}

fn finish_part(run: &str, digits: bool) -> NaturalPart {
    if digits {
        // Overlong digit runs fall back to text comparison.
        run.parse()
            .map(NaturalPart::Number)
            .unwrap_or_else(|_| NaturalPart::Text(run.to_string()))
    } else {
        NaturalPart::Text(run.to_lowercase())
    }
}

/// Natural ("human") ordering of two file names.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// List file names in `dir` ending in `extension`, ordered by `ordering`.
pub fn list_files_with_extension<P: AsRef<Path>>(
    dir: P,
    extension: &str,
    ordering: FileOrdering,
) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(extension) {
            names.push(name);
        }
    }
    ordering.sort(&mut names);
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_number() {
        assert_eq!(shot_number("AP240 Ch1_10.data32"), 10);
        assert_eq!(shot_number("AP240 Ch2_7.data32"), 7);
        assert_eq!(shot_number("shot.data32"), 0);
    }

    #[test]
    fn test_numeric_suffix_ordering() {
        let mut names = vec![
            "AP240 Ch1_10.data32".to_string(),
            "AP240 Ch1_2.data32".to_string(),
            "AP240 Ch1_1.data32".to_string(),
        ];
        FileOrdering::NumericSuffix.sort(&mut names);
        assert_eq!(
            names,
            vec!["AP240 Ch1_1.data32", "AP240 Ch1_2.data32", "AP240 Ch1_10.data32"]
        );
    }

    #[test]
    fn test_natural_ordering() {
        let mut names = vec![
            "run10.data32".to_string(),
            "Run2.data32".to_string(),
            "run1.data32".to_string(),
        ];
        FileOrdering::Natural.sort(&mut names);
        assert_eq!(names, vec!["run1.data32", "Run2.data32", "run10.data32"]);
    }

    #[test]
    fn test_ordering_from_str() {
        assert_eq!(FileOrdering::from_str("natural").unwrap(), FileOrdering::Natural);
        assert_eq!(
            FileOrdering::from_str("Numeric-Suffix").unwrap(),
            FileOrdering::NumericSuffix
        );
        assert!(FileOrdering::from_str("alphabetic").is_err());
    }
}
