//! Checksums attached to resources and bottles.
//!
//! The set of supported algorithms is closed: every place that stores a
//! checksum per algorithm (resources, bottle platform maps) iterates
//! [`ChecksumType::ALL`] instead of accepting arbitrary algorithm names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Hash algorithms a formula may declare a checksum with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    Sha1,
    Sha256,
}

impl ChecksumType {
    pub const ALL: [ChecksumType; 2] = [ChecksumType::Sha1, ChecksumType::Sha256];

    /// Lowercase DSL name (`sha1`, `sha256`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }

    /// Hash a file's contents, returning the lowercase hex digest.
    pub fn digest_file(&self, path: &Path) -> std::io::Result<String> {
        use sha2::Digest;

        let mut file = File::open(path)?;
        let digest = match self {
            Self::Sha1 => {
                let mut hasher = sha1::Sha1::new();
                read_chunks(&mut file, |chunk| hasher.update(chunk))?;
                format!("{:x}", hasher.finalize())
            }
            Self::Sha256 => {
                let mut hasher = sha2::Sha256::new();
                read_chunks(&mut file, |chunk| hasher.update(chunk))?;
                format!("{:x}", hasher.finalize())
            }
        };
        Ok(digest)
    }
}

fn read_chunks(reader: &mut impl Read, mut consume: impl FnMut(&[u8])) -> std::io::Result<()> {
    let mut buffer = vec![0; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        consume(&buffer[..n]);
    }

    Ok(())
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for ChecksumType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown checksum type: {other}")),
        }
    }
}

/// A declared checksum: algorithm plus expected hex digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    pub ty: ChecksumType,
    pub hexdigest: String,
}

impl Checksum {
    pub fn new(ty: ChecksumType, hexdigest: impl Into<String>) -> Self {
        Self {
            ty,
            hexdigest: hexdigest.into().trim().to_ascii_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hexdigest.is_empty()
    }

    /// Whether a computed digest matches this checksum
    pub fn matches(&self, actual: &str) -> bool {
        self.hexdigest.eq_ignore_ascii_case(actual)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ty.as_str(), self.hexdigest)
    }
}
