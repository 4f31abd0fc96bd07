//! Bottles: precompiled builds of a spec, one per platform.
//!
//! A bottle block lists a checksum for every platform a binary was built on.
//! Only the entry for the platform we are running on matters for the
//! download we are about to verify, so each declaration is compared with
//! the runtime [`BottleTag`] as it is made. A match becomes the default
//! resource's checksum immediately; entries for other platforms are stored
//! but never touch it.
//!
//! # Examples
//!
//! ```
//! use brewspec::{Bottle, BottleTag, BuildFlags};
//!
//! let mut bottle = Bottle::new(BottleTag::new("arm64_sonoma"), &BuildFlags::default());
//! bottle
//!     .sha256("arm64_sonoma", "aaaa")
//!     .sha256("x86_64_sonoma", "bbbb");
//!
//! assert_eq!(bottle.spec().checksum().unwrap().hexdigest, "aaaa");
//! assert_eq!(bottle.sha256s().unwrap().len(), 2);
//! ```

use crate::checksum::{Checksum, ChecksumType};
use crate::options::BuildFlags;
use crate::platform::BottleTag;
use crate::resource::Owner;
use crate::software_spec::SoftwareSpec;
use crate::version::Version;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_PREFIX: &str = "/usr/local";
pub const DEFAULT_CELLAR: &str = "/usr/local/Cellar";

/// Platform tag → checksum, for one algorithm
pub type PlatformChecksums = BTreeMap<BottleTag, Checksum>;

/// A spec for a precompiled artifact plus its deployment metadata
#[derive(Debug, Clone)]
pub struct Bottle {
    spec: SoftwareSpec,
    current_tag: BottleTag,
    root_url: Option<String>,
    prefix: String,
    cellar: String,
    revision: u32,
    checksums: BTreeMap<ChecksumType, PlatformChecksums>,
}

impl Bottle {
    /// An empty bottle for a system identified by `current_tag`
    pub fn new(current_tag: BottleTag, flags: &BuildFlags) -> Self {
        Self {
            spec: SoftwareSpec::new(None, None, flags),
            current_tag,
            root_url: None,
            prefix: DEFAULT_PREFIX.to_string(),
            cellar: DEFAULT_CELLAR.to_string(),
            revision: 0,
            checksums: BTreeMap::new(),
        }
    }

    pub fn spec(&self) -> &SoftwareSpec {
        &self.spec
    }

    /// Name the formula the bottle belongs to. The spec itself is only
    /// reachable read-only so its checksum stays tied to the platform map.
    pub fn set_owner(&mut self, owner: Owner) -> &mut Self {
        self.spec.set_owner(owner);
        self
    }

    /// The platform this bottle resolves checksums for
    pub fn current_tag(&self) -> &BottleTag {
        &self.current_tag
    }

    /// All platform checksums declared with `ty`, or `None` if none were
    pub fn checksums(&self, ty: ChecksumType) -> Option<&PlatformChecksums> {
        self.checksums.get(&ty)
    }

    pub fn sha1s(&self) -> Option<&PlatformChecksums> {
        self.checksums(ChecksumType::Sha1)
    }

    pub fn sha256s(&self) -> Option<&PlatformChecksums> {
        self.checksums(ChecksumType::Sha256)
    }

    /// Declare the `ty` checksum of the bottle built for `tag`.
    ///
    /// Re-declaring a tag replaces its previous digest. When `tag` is the
    /// running platform the default resource's checksum is updated too.
    pub fn set_checksum_for(
        &mut self,
        ty: ChecksumType,
        tag: impl Into<BottleTag>,
        hexdigest: impl Into<String>,
    ) -> &mut Self {
        let tag = tag.into();
        let checksum = Checksum::new(ty, hexdigest);

        if tag == self.current_tag {
            debug!("Bottle {} {} matches this platform", tag, ty);
            self.spec.set_checksum(checksum.clone());
        }

        self.checksums.entry(ty).or_default().insert(tag, checksum);
        self
    }

    pub fn sha1(&mut self, tag: impl Into<BottleTag>, hexdigest: impl Into<String>) -> &mut Self {
        self.set_checksum_for(ChecksumType::Sha1, tag, hexdigest)
    }

    pub fn sha256(&mut self, tag: impl Into<BottleTag>, hexdigest: impl Into<String>) -> &mut Self {
        self.set_checksum_for(ChecksumType::Sha256, tag, hexdigest)
    }

    /// Whether any algorithm has a checksum for the running platform
    pub fn is_compatible(&self) -> bool {
        self.checksums
            .values()
            .any(|by_tag| by_tag.contains_key(&self.current_tag))
    }

    pub fn root_url(&self) -> Option<&str> {
        self.root_url.as_deref()
    }

    pub fn set_root_url(&mut self, root_url: impl Into<String>) -> &mut Self {
        self.root_url = Some(root_url.into());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    pub fn cellar(&self) -> &str {
        &self.cellar
    }

    pub fn set_cellar(&mut self, cellar: impl Into<String>) -> &mut Self {
        self.cellar = cellar.into();
        self
    }

    /// Rebuild counter for the same upstream version
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn set_revision(&mut self, revision: u32) -> &mut Self {
        self.revision = revision;
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.spec.url()
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.spec.set_url(url);
        self
    }

    /// Bottle file name for this platform:
    /// `<name>-<version>.<tag>.bottle[.<revision>].tar.gz`.
    /// `None` until the spec has an owner to take the name from.
    pub fn filename(&self, version: &Version) -> Option<String> {
        let name = self.spec.owner()?.name();
        let revision = if self.revision > 0 {
            format!(".{}", self.revision)
        } else {
            String::new()
        };
        Some(format!(
            "{}-{}.{}.bottle{}.tar.gz",
            name, version, self.current_tag, revision
        ))
    }

    /// Download URL under `root_url` for this platform's bottle
    pub fn url_for(&self, version: &Version) -> Option<String> {
        let root = self.root_url.as_deref()?.trim_end_matches('/');
        Some(format!("{}/{}", root, self.filename(version)?))
    }

    /// Point the default resource at this platform's bottle and record its
    /// version. Returns the URL, or `None` if it cannot be formed yet.
    pub fn resolve_url(&mut self, version: &Version) -> Option<String> {
        let url = self.url_for(version)?;
        let resource = self.spec.default_resource_mut();
        resource.set_url(url.clone());
        resource.set_version(version.clone());
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: &str = "arm64_sonoma";
    const Q: &str = "x86_64_ventura";

    fn bottle() -> Bottle {
        Bottle::new(BottleTag::new(P), &BuildFlags::default())
    }

    #[test]
    fn test_defaults() {
        let bottle = bottle();
        assert_eq!(bottle.revision(), 0);
        assert_eq!(bottle.prefix(), "/usr/local");
        assert_eq!(bottle.cellar(), "/usr/local/Cellar");
        assert_eq!(bottle.root_url(), None);
        assert!(bottle.sha1s().is_none());
        assert!(bottle.sha256s().is_none());
        assert!(bottle.spec().checksum().is_none());
    }

    #[test]
    fn test_current_platform_sets_active_checksum() {
        let mut bottle = bottle();
        bottle.sha256(P, "digest-a");
        assert_eq!(
            bottle.spec().checksum(),
            Some(&Checksum::new(ChecksumType::Sha256, "digest-a"))
        );

        bottle.sha256(Q, "digest-b");
        assert_eq!(
            bottle.spec().checksum(),
            Some(&Checksum::new(ChecksumType::Sha256, "digest-a"))
        );
        assert_eq!(bottle.sha256s().unwrap().len(), 2);
    }

    #[test]
    fn test_other_platforms_never_set_checksum() {
        let mut bottle = bottle();
        bottle.sha1(Q, "digest-q").sha256("x86_64_linux", "digest-l");
        assert!(bottle.spec().checksum().is_none());
        assert!(!bottle.is_compatible());
    }

    #[test]
    fn test_redeclaring_tag_is_last_write_wins() {
        let mut bottle = bottle();
        bottle.sha256(P, "first");
        bottle.sha256(P, "second");

        let by_tag = bottle.sha256s().unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[&BottleTag::new(P)].hexdigest, "second");
        assert_eq!(bottle.spec().checksum().unwrap().hexdigest, "second");
    }

    #[test]
    fn test_algorithms_are_kept_apart() {
        let mut bottle = bottle();
        bottle.sha1(P, "sha1-digest");
        bottle.sha256(Q, "sha256-digest");

        assert_eq!(bottle.sha1s().unwrap().len(), 1);
        assert_eq!(bottle.sha256s().unwrap().len(), 1);
        assert_eq!(bottle.spec().checksum().unwrap().ty, ChecksumType::Sha1);
        assert!(bottle.is_compatible());
    }

    #[test]
    fn test_active_checksum_only_from_platform_map() {
        let mut bottle = bottle();
        bottle.sha256(Q, "digest-q");
        bottle
            .set_owner(Owner::new("wget"))
            .set_url("https://example.com/bottles/wget.tar.gz");
        assert!(bottle.spec().checksum().is_none());
        assert!(bottle.sha256s().unwrap().get(&BottleTag::new(P)).is_none());

        bottle.sha256(P, "digest-p");
        let active = bottle.spec().checksum().cloned();
        assert_eq!(active.as_ref(), bottle.sha256s().unwrap().get(&BottleTag::new(P)));
    }

    #[test]
    fn test_metadata_setters() {
        let mut bottle = bottle();
        bottle
            .set_root_url("https://example.com/bottles")
            .set_prefix("/opt/homebrew")
            .set_cellar("/opt/homebrew/Cellar")
            .set_revision(2);
        assert_eq!(bottle.root_url(), Some("https://example.com/bottles"));
        assert_eq!(bottle.prefix(), "/opt/homebrew");
        assert_eq!(bottle.cellar(), "/opt/homebrew/Cellar");
        assert_eq!(bottle.revision(), 2);
    }

    #[test]
    fn test_filename_and_url() {
        let mut bottle = bottle();
        let version = Version::new("1.15");
        assert_eq!(bottle.filename(&version), None);

        bottle.set_owner(Owner::new("wget"));
        assert_eq!(
            bottle.filename(&version).as_deref(),
            Some("wget-1.15.arm64_sonoma.bottle.tar.gz")
        );

        bottle.set_revision(1).set_root_url("https://example.com/bottles/");
        assert_eq!(
            bottle.resolve_url(&version).as_deref(),
            Some("https://example.com/bottles/wget-1.15.arm64_sonoma.bottle.1.tar.gz")
        );
        assert_eq!(
            bottle.url(),
            Some("https://example.com/bottles/wget-1.15.arm64_sonoma.bottle.1.tar.gz")
        );
        assert_eq!(bottle.spec().version(), Some(version));
    }
}
