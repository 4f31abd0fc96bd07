//! Fetchable resources.
//!
//! A [`Resource`] is one downloadable artifact of a formula: the main source
//! tarball (the spec's `default` resource) or an auxiliary download such as a
//! patch set or documentation bundle. Resources describe what to fetch and
//! how to check it; the actual transfer and extraction happen behind the
//! [`Downloader`] trait.

use crate::checksum::{Checksum, ChecksumType};
use crate::error::{Result, SpecError};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the resource every spec is built around
pub const DEFAULT_RESOURCE: &str = "default";

/// Identity of the formula a spec or resource belongs to.
///
/// Cheap to clone; all clones made from one `Owner::new` share the same
/// allocation, so [`Owner::same`] can tell a propagated owner apart from an
/// equal-named one.
#[derive(Debug, Clone)]
pub struct Owner {
    name: Arc<str>,
}

impl Owner {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when both handles come from the same `Owner::new` call
    pub fn same(&self, other: &Owner) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Owner {}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How a resource's URL is retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStrategy {
    Curl,
    Git,
    #[serde(alias = "svn")]
    Subversion,
    #[serde(alias = "hg")]
    Mercurial,
    #[serde(alias = "bzr")]
    Bazaar,
    Cvs,
    Fossil,
}

impl DownloadStrategy {
    /// Pick a strategy from the shape of a URL. Anything not recognised as
    /// a version control URL is downloaded with curl.
    pub fn detect(url: &str) -> Self {
        let is_http = url.starts_with("http://") || url.starts_with("https://");

        if url.starts_with("git://") || (is_http && url.ends_with(".git")) {
            Self::Git
        } else if url.starts_with("svn://")
            || url.starts_with("svn+http://")
            || url.starts_with("http://svn.apache.org/repos/")
            || (is_http && (url.contains("googlecode.com/svn") || url.contains("/svnroot/")))
        {
            Self::Subversion
        } else if url.starts_with("hg://") || (is_http && url.contains("googlecode.com/hg")) {
            Self::Mercurial
        } else if url.starts_with("bzr://") {
            Self::Bazaar
        } else if url.starts_with("cvs://") {
            Self::Cvs
        } else if url.starts_with("fossil://") {
            Self::Fossil
        } else {
            Self::Curl
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curl => "curl",
            Self::Git => "git",
            Self::Subversion => "svn",
            Self::Mercurial => "hg",
            Self::Bazaar => "bzr",
            Self::Cvs => "cvs",
            Self::Fossil => "fossil",
        }
    }

    /// Version-control checkouts have no fixed content to hash
    pub fn is_vcs(&self) -> bool {
        !matches!(self, Self::Curl)
    }
}

impl fmt::Display for DownloadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches(':') {
            "curl" => Ok(Self::Curl),
            "git" => Ok(Self::Git),
            "svn" | "subversion" => Ok(Self::Subversion),
            "hg" | "mercurial" => Ok(Self::Mercurial),
            "bzr" | "bazaar" => Ok(Self::Bazaar),
            "cvs" => Ok(Self::Cvs),
            "fossil" => Ok(Self::Fossil),
            other => Err(format!("unknown download strategy: {other}")),
        }
    }
}

/// A resource bound to the strategy and cache name used to fetch it
#[derive(Debug, Clone)]
pub struct Download<'a> {
    pub resource: &'a Resource,
    pub strategy: DownloadStrategy,
    pub name: String,
}

/// Transfers and unpacks resources.
///
/// Implemented outside this crate by whatever owns the network and the
/// download cache.
pub trait Downloader {
    /// Download (or reuse a cached copy of) a resource, returning the local path.
    fn fetch(&self, download: &Download<'_>) -> Result<PathBuf>;

    /// Unpack a fetched file into `target`.
    fn stage(&self, fetched: &Path, target: &Path) -> Result<()>;
}

/// One fetchable artifact: URL, version, mirrors and checksum
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    url: Option<String>,
    specs: BTreeMap<String, String>,
    version: Option<Version>,
    mirrors: Vec<String>,
    checksum: Option<Checksum>,
    using: Option<DownloadStrategy>,
    owner: Option<Owner>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            specs: BTreeMap::new(),
            version: None,
            mirrors: Vec::new(),
            checksum: None,
            using: None,
            owner: None,
        }
    }

    /// A resource with an optional URL and version, as specs create their default
    pub fn with_source(
        name: impl Into<String>,
        url: Option<String>,
        version: Option<Version>,
    ) -> Self {
        let mut resource = Self::new(name);
        resource.url = url;
        resource.version = version;
        resource
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self
    }

    /// Set the URL along with strategy-specific specs such as `tag`,
    /// `branch` or `revision`. A `using` spec selects the download strategy.
    pub fn set_url_with_specs<I, K, V>(&mut self, url: impl Into<String>, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.url = Some(url.into());
        for (key, value) in specs {
            let key = key.into();
            let value = value.into();
            if key == "using" {
                match value.parse() {
                    Ok(strategy) => self.using = Some(strategy),
                    Err(e) => warn!("Ignoring {} for resource {}", e, self.name),
                }
            } else {
                self.specs.insert(key, value);
            }
        }
        self
    }

    /// Strategy-specific URL options (`tag`, `branch`, `revision`, ...)
    pub fn specs(&self) -> &BTreeMap<String, String> {
        &self.specs
    }

    /// The declared version, or one detected from the URL.
    pub fn version(&self) -> Option<Version> {
        self.version
            .clone()
            .or_else(|| self.url.as_deref().and_then(Version::parse_url))
    }

    pub fn set_version(&mut self, version: impl Into<Version>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    pub fn mirror(&mut self, url: impl Into<String>) -> &mut Self {
        self.mirrors.push(url.into());
        self
    }

    /// The checksum downloads are verified against
    pub fn checksum(&self) -> Option<&Checksum> {
        self.checksum.as_ref()
    }

    pub fn set_checksum(&mut self, checksum: Checksum) -> &mut Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn sha1(&mut self, hexdigest: impl Into<String>) -> &mut Self {
        self.set_checksum(Checksum::new(ChecksumType::Sha1, hexdigest))
    }

    pub fn sha256(&mut self, hexdigest: impl Into<String>) -> &mut Self {
        self.set_checksum(Checksum::new(ChecksumType::Sha256, hexdigest))
    }

    /// Force a download strategy instead of detecting one from the URL
    pub fn using(&mut self, strategy: DownloadStrategy) -> &mut Self {
        self.using = Some(strategy);
        self
    }

    pub fn download_strategy(&self) -> DownloadStrategy {
        self.using
            .or_else(|| self.url.as_deref().map(DownloadStrategy::detect))
            .unwrap_or(DownloadStrategy::Curl)
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn set_owner(&mut self, owner: Owner) {
        self.owner = Some(owner);
    }

    /// Name used for the cached download: the formula name for the default
    /// resource, `<formula>--<resource>` for auxiliary ones.
    pub fn download_name(&self) -> String {
        match &self.owner {
            Some(owner) if self.name == DEFAULT_RESOURCE => owner.name().to_string(),
            Some(owner) => format!("{}--{}", owner.name(), self.name),
            None => self.name.clone(),
        }
    }

    /// Bind this resource to its strategy and cache name
    pub fn downloader(&self) -> Download<'_> {
        Download {
            resource: self,
            strategy: self.download_strategy(),
            name: self.download_name(),
        }
    }

    pub fn fetch(&self, downloader: &dyn Downloader) -> Result<PathBuf> {
        debug!(
            "Fetching {} via {}",
            self.download_name(),
            self.download_strategy()
        );
        downloader.fetch(&self.downloader())
    }

    /// Fetch, verify and unpack into `target`
    pub fn stage(&self, downloader: &dyn Downloader, target: &Path) -> Result<PathBuf> {
        let fetched = self.fetch(downloader)?;
        self.verify_download_integrity(&fetched)?;
        downloader.stage(&fetched, target)?;
        Ok(fetched)
    }

    /// Check a downloaded file against the active checksum.
    ///
    /// A resource without a checksum only logs a warning; an empty checksum
    /// or a digest mismatch is an error.
    pub fn verify_download_integrity(&self, path: &Path) -> Result<()> {
        let Some(checksum) = &self.checksum else {
            warn!(
                "Cannot verify integrity of {}: a checksum was not provided",
                path.display()
            );
            return Ok(());
        };

        if checksum.is_empty() {
            return Err(SpecError::ChecksumMissing(path.to_path_buf()));
        }

        let actual = checksum.ty.digest_file(path)?;
        if !checksum.matches(&actual) {
            return Err(SpecError::ChecksumMismatch {
                ty: checksum.ty,
                expected: checksum.hexdigest.clone(),
                actual,
                path: path.to_path_buf(),
            });
        }

        debug!("Verified {} ({})", path.display(), checksum.ty);
        Ok(())
    }
}
