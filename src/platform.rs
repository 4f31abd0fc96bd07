//! Platform tags for selecting bottle checksums.
//!
//! A bottle block declares one checksum per platform; only the entry whose
//! tag matches the running system governs integrity verification. The tag is
//! an opaque identifier combining CPU architecture and OS (and, on macOS, the
//! OS release name):
//! - `<arch>_<os_version>`
//! - Examples: `arm64_sequoia`, `x86_64_ventura`, `arm64_linux`
//!
//! Specs never detect the tag themselves; callers detect it once (or take
//! it from configuration) and pass a [`BottleTag`] in.
//!
//! # Examples
//!
//! ```no_run
//! use brewspec::platform;
//!
//! fn main() -> anyhow::Result<()> {
//!     let bottle_tag = platform::detect_bottle_tag()?;
//!     println!("This system needs: {}", bottle_tag);
//!     Ok(())
//! }
//! ```

#[cfg(target_os = "macos")]
use anyhow::Context;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(target_os = "macos")]
use std::process::Command;

/// Opaque OS + architecture identifier used as a bottle checksum key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BottleTag(String);

impl BottleTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BottleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BottleTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Detect the bottle tag of the running system.
///
/// # Platform Tags
///
/// - `arm64_sequoia` - Apple Silicon (M1+) on macOS 15
/// - `x86_64_ventura` - Intel on macOS 13
/// - `arm64_linux` - ARM64 Linux
/// - `x86_64_linux` - x86_64 Linux
///
/// # Errors
///
/// Returns an error if:
/// - On macOS: `sw_vers` command is unavailable
/// - On unsupported platforms: Not macOS or Linux
pub fn detect_bottle_tag() -> Result<BottleTag> {
    #[cfg(target_os = "macos")]
    {
        let os_version = macos_version()?;
        let os_name = macos_name(&os_version);

        Ok(BottleTag(format!("{}_{}", homebrew_arch(), os_name)))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(BottleTag(format!("{}_linux", homebrew_arch())))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        anyhow::bail!("Unsupported platform")
    }
}

/// Homebrew uses "arm64" not "aarch64"
fn homebrew_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        other => other,
    }
}

#[cfg(target_os = "macos")]
fn macos_version() -> Result<String> {
    let output = Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .context("Failed to run sw_vers")?;

    let version = String::from_utf8(output.stdout)
        .context("Invalid UTF-8 in sw_vers output")?
        .trim()
        .to_string();

    Ok(version)
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn macos_name(version: &str) -> &'static str {
    let major: u32 = version
        .split('.')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    match major {
        26 | 16 => "tahoe",
        15 => "sequoia",
        14 => "sonoma",
        13 => "ventura",
        12 => "monterey",
        11 => "big_sur",
        _ => "sonoma",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_bottle_tag() {
        let tag = detect_bottle_tag().unwrap();
        assert!(!tag.as_str().is_empty());
        #[cfg(target_arch = "aarch64")]
        assert!(tag.as_str().starts_with("arm64_"));
        #[cfg(target_arch = "x86_64")]
        assert!(tag.as_str().starts_with("x86_64_"));
    }

    #[test]
    fn test_macos_names() {
        assert_eq!(macos_name("15.1"), "sequoia");
        assert_eq!(macos_name("14.0"), "sonoma");
        assert_eq!(macos_name("13.0"), "ventura");
        assert_eq!(macos_name("12.0"), "monterey");
    }

    #[test]
    fn test_bottle_tag_equality_is_by_value() {
        assert_eq!(BottleTag::new("arm64_sonoma"), BottleTag::from("arm64_sonoma"));
        assert_ne!(BottleTag::new("arm64_sonoma"), BottleTag::new("x86_64_sonoma"));
    }
}
