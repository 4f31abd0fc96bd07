//! Package versions, including the `HEAD` sentinel and URL-based detection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const HEAD: &str = "HEAD";

/// Archive suffixes stripped before looking for a version in a filename
const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.bz2", ".tar.xz", ".tar.lz", ".tar.lzma", ".tar.Z", ".tgz", ".tbz", ".tbz2",
    ".txz", ".tar", ".zip", ".7z", ".rar", ".gem", ".jar", ".dmg", ".pkg",
];

/// Suffixes that some projects append after the version (`foo-1.0-src.tar.gz`)
const TRAILING_JUNK: &[&str] = &["-src", "-source", ".src", ".orig", "-stable", "-release"];

/// A package version as declared in a formula or detected from its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Sentinel version for specs built from the tip of a repository
    pub fn head() -> Self {
        Self(HEAD.to_string())
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Detect a version from a download URL.
    ///
    /// Looks at the last path segment, strips archive extensions, then takes
    /// everything after the first `-`/`_` that is followed by a digit. GitHub
    /// style `archive/v1.2.tar.gz` URLs yield `1.2`.
    ///
    /// ```
    /// use brewspec::version::Version;
    ///
    /// let v = Version::parse_url("https://example.com/pkg-config-0.28.tar.gz").unwrap();
    /// assert_eq!(v.as_str(), "0.28");
    /// ```
    pub fn parse_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next()?;
        let basename = path.trim_end_matches('/').rsplit('/').next()?;
        let mut stem = strip_archive_extension(basename);

        for junk in TRAILING_JUNK {
            if let Some(stripped) = stem.strip_suffix(junk) {
                stem = stripped;
            }
        }

        if let Some(v) = bare_version(stem) {
            return Some(Self::new(v));
        }

        let bytes = stem.as_bytes();
        let start = (1..bytes.len()).find(|&i| {
            matches!(bytes[i - 1], b'-' | b'_') && bare_version(&stem[i..]).is_some()
        })?;
        let candidate = bare_version(&stem[start..])?;

        // boost_1_55_0 style: underscores stand in for dots
        if !candidate.contains('.') && candidate.contains('_') {
            Some(Self::new(candidate.replace('_', ".")))
        } else {
            Some(Self::new(candidate))
        }
    }

    /// Version components split on `.`, `-` and `_`
    fn components(&self) -> Vec<&str> {
        self.0
            .split(['.', '-', '_'])
            .filter(|part| !part.is_empty())
            .collect()
    }
}

fn strip_archive_extension(name: &str) -> &str {
    ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
}

/// Accepts `1.2.3`, `v1.2.3`, `20140101`; rejects anything not led by a digit.
fn bare_version(s: &str) -> Option<&str> {
    let s = s
        .strip_prefix('v')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(s);
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        Some(s)
    } else {
        None
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_head(), other.is_head()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let a_parts = self.components();
        let b_parts = other.components();

        for i in 0..a_parts.len().max(b_parts.len()) {
            let ord = match (a_parts.get(i), b_parts.get(i)) {
                (Some(a), Some(b)) => compare_component(a, b),
                // 1.0 < 1.0.1, but missing numeric parts count as zero
                (Some(a), None) => compare_component(a, "0"),
                (None, Some(b)) => compare_component("0", b),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }

        // Fall back to lexicographic
        self.0.cmp(&other.0)
    }
}

fn compare_component(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}
