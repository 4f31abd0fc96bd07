//! Software specs: one buildable variant of a formula.
//!
//! A [`SoftwareSpec`] wraps the `default` [`Resource`] (the main download)
//! and adds what a formula declares around it: named auxiliary resources,
//! build options, and dependencies. Everything URL/version/checksum shaped
//! is read straight through to the default resource; the spec keeps no copy.
//!
//! Variants are composition, not subclasses. A HEAD spec is a plain spec
//! with a `HEAD` version and [`IntegrityPolicy::Skip`]; a bottle is a spec
//! plus platform checksum metadata (see [`crate::bottle`]).
//!
//! # Examples
//!
//! ```
//! use brewspec::{BuildFlags, SoftwareSpec};
//!
//! fn main() -> brewspec::Result<()> {
//!     let flags = BuildFlags::default();
//!     let mut stable = SoftwareSpec::new(Some("http://x/pkg-1.0.tar.gz"), None, &flags);
//!     stable.sha256("5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03");
//!     stable.declare_resource("docs", |r| {
//!         r.set_url("http://x/pkg-docs-1.0.tar.gz");
//!     })?;
//!     stable.option("with-tests", Some("Build tests"))?;
//!     stable.depends_on("pkg-config")?;
//!
//!     assert_eq!(stable.version().unwrap().as_str(), "1.0");
//!     assert!(stable.has_resource("docs"));
//!     Ok(())
//! }
//! ```

use crate::checksum::Checksum;
use crate::dependency::{
    Dependency, DependencyCollector, DependencyHandle, DependencySpec, Requirement,
};
use crate::error::{Result, SpecError};
use crate::options::{BuildFlags, BuildOptions};
use crate::resource::{
    DEFAULT_RESOURCE, Download, DownloadStrategy, Downloader, Owner, Resource,
};
use crate::version::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a spec checks what it downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityPolicy {
    /// Hash the download and compare with the active checksum
    #[default]
    Verify,
    /// Accept any download; used for HEAD checkouts, which have no fixed
    /// content to compare against
    Skip,
}

impl IntegrityPolicy {
    pub fn verify(&self, resource: &Resource, path: &Path) -> Result<()> {
        match self {
            Self::Verify => resource.verify_download_integrity(path),
            Self::Skip => {
                debug!("Skipping integrity check for {}", path.display());
                Ok(())
            }
        }
    }
}

/// A declarative description of one variant of a package
#[derive(Debug, Clone)]
pub struct SoftwareSpec {
    resource: Resource,
    resources: Vec<Resource>,
    build: BuildOptions,
    dependency_collector: DependencyCollector,
    owner: Option<Owner>,
    integrity: IntegrityPolicy,
}

impl SoftwareSpec {
    /// Create a spec around a default resource with an optional URL and
    /// version. `flags` seeds the build options with the option flags the
    /// build was requested with.
    pub fn new(url: Option<&str>, version: Option<&str>, flags: &BuildFlags) -> Self {
        Self {
            resource: Resource::with_source(
                DEFAULT_RESOURCE,
                url.map(str::to_string),
                version.map(Version::from),
            ),
            resources: Vec::new(),
            build: BuildOptions::new(flags),
            dependency_collector: DependencyCollector::new(),
            owner: None,
            integrity: IntegrityPolicy::Verify,
        }
    }

    /// A spec that builds from the tip of a repository. The version
    /// defaults to `HEAD` and downloads are never checksummed.
    pub fn head(url: Option<&str>, version: Option<&str>, flags: &BuildFlags) -> Self {
        let mut spec = Self::new(url, version, flags);
        if version.is_none() {
            spec.resource.set_version(Version::head());
        }
        spec.integrity = IntegrityPolicy::Skip;
        spec
    }

    pub fn integrity_policy(&self) -> IntegrityPolicy {
        self.integrity
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Set the owning formula on the spec, its default resource, and every
    /// resource declared so far. Resources declared afterwards are not
    /// updated until this is called again.
    pub fn set_owner(&mut self, owner: Owner) {
        debug!(
            "Setting owner {} on {} resource(s)",
            owner,
            self.resources.len() + 1
        );
        self.resource.set_owner(owner.clone());
        for resource in &mut self.resources {
            resource.set_owner(owner.clone());
        }
        self.owner = Some(owner);
    }

    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.iter().any(|r| r.name() == name)
    }

    /// Declare a named auxiliary resource, configured by `configure`.
    ///
    /// # Errors
    ///
    /// [`SpecError::DuplicateResource`] if `name` is already declared.
    pub fn declare_resource<F>(&mut self, name: &str, configure: F) -> Result<&Resource>
    where
        F: FnOnce(&mut Resource),
    {
        if self.has_resource(name) {
            return Err(SpecError::DuplicateResource(name.to_string()));
        }

        let mut resource = Resource::new(name);
        configure(&mut resource);
        debug!("Declared resource {}", name);

        self.resources.push(resource);
        Ok(&self.resources[self.resources.len() - 1])
    }

    /// Look up a declared resource.
    ///
    /// # Errors
    ///
    /// [`SpecError::ResourceMissing`] naming the owner and the requested name.
    pub fn resource(&self, name: &str) -> Result<&Resource> {
        self.resources
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| SpecError::ResourceMissing {
                owner: self.owner.clone(),
                name: name.to_string(),
            })
    }

    /// Named resources in declaration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Declare a build option. Names are bare: `with-tests`, not `--with-tests`.
    pub fn option(&mut self, name: impl AsRef<str>, description: Option<&str>) -> Result<()> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(SpecError::OptionNameRequired);
        }
        if name.starts_with('-') {
            return Err(SpecError::OptionStartsWithDash(name.to_string()));
        }
        self.build.add(name, description);
        Ok(())
    }

    /// Declare a dependency. Optional and recommended dependencies also
    /// register their implicit `with-`/`without-` option.
    pub fn depends_on(
        &mut self,
        spec: impl Into<DependencySpec>,
    ) -> Result<Option<DependencyHandle>> {
        let dep = self.dependency_collector.add(spec)?;
        if let Some(dep) = &dep {
            self.build.add_dep_option(dep);
        }
        Ok(dep)
    }

    pub fn deps(&self) -> &[Dependency] {
        self.dependency_collector.deps()
    }

    pub fn requirements(&self) -> &[Requirement] {
        self.dependency_collector.requirements()
    }

    pub fn build(&self) -> &BuildOptions {
        &self.build
    }

    pub fn dependency_collector(&self) -> &DependencyCollector {
        &self.dependency_collector
    }

    /// The resource the spec's URL, version and checksum belong to
    pub fn default_resource(&self) -> &Resource {
        &self.resource
    }

    pub(crate) fn default_resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    // Default resource delegation

    pub fn url(&self) -> Option<&str> {
        self.resource.url()
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.resource.set_url(url);
        self
    }

    pub fn set_url_with_specs<I, K, V>(&mut self, url: impl Into<String>, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.resource.set_url_with_specs(url, specs);
        self
    }

    pub fn specs(&self) -> &BTreeMap<String, String> {
        self.resource.specs()
    }

    pub fn version(&self) -> Option<Version> {
        self.resource.version()
    }

    pub fn set_version(&mut self, version: impl Into<Version>) -> &mut Self {
        self.resource.set_version(version);
        self
    }

    pub fn mirrors(&self) -> &[String] {
        self.resource.mirrors()
    }

    pub fn mirror(&mut self, url: impl Into<String>) -> &mut Self {
        self.resource.mirror(url);
        self
    }

    pub fn checksum(&self) -> Option<&Checksum> {
        self.resource.checksum()
    }

    pub fn set_checksum(&mut self, checksum: Checksum) -> &mut Self {
        self.resource.set_checksum(checksum);
        self
    }

    pub fn sha1(&mut self, hexdigest: impl Into<String>) -> &mut Self {
        self.resource.sha1(hexdigest);
        self
    }

    pub fn sha256(&mut self, hexdigest: impl Into<String>) -> &mut Self {
        self.resource.sha256(hexdigest);
        self
    }

    pub fn using(&mut self, strategy: DownloadStrategy) -> &mut Self {
        self.resource.using(strategy);
        self
    }

    pub fn download_strategy(&self) -> DownloadStrategy {
        self.resource.download_strategy()
    }

    pub fn download_name(&self) -> String {
        self.resource.download_name()
    }

    pub fn downloader(&self) -> Download<'_> {
        self.resource.downloader()
    }

    pub fn fetch(&self, downloader: &dyn Downloader) -> Result<PathBuf> {
        self.resource.fetch(downloader)
    }

    /// Fetch, check under this spec's integrity policy, and unpack into `target`
    pub fn stage(&self, downloader: &dyn Downloader, target: &Path) -> Result<PathBuf> {
        let fetched = self.fetch(downloader)?;
        self.verify_download_integrity(&fetched)?;
        downloader.stage(&fetched, target)?;
        Ok(fetched)
    }

    pub fn verify_download_integrity(&self, path: &Path) -> Result<()> {
        self.integrity.verify(&self.resource, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumType;
    use crate::dependency::DepTag;
    use std::io::Write;

    fn flags() -> BuildFlags {
        BuildFlags::default()
    }

    fn spec() -> SoftwareSpec {
        SoftwareSpec::new(Some("http://x/pkg-1.0.tar.gz"), Some("1.0"), &flags())
    }

    #[test]
    fn test_construction_scenario() {
        let mut spec = spec();
        assert_eq!(spec.url(), Some("http://x/pkg-1.0.tar.gz"));
        assert_eq!(spec.version(), Some(Version::new("1.0")));
        assert!(spec.resources().is_empty());

        spec.declare_resource("patch", |r| {
            r.set_url("http://x/pkg-1.0.patch");
        })
        .unwrap();
        assert!(spec.has_resource("patch"));

        spec.option("with-tests", Some("Build tests")).unwrap();
        let matching: Vec<_> = spec
            .build()
            .iter()
            .filter(|o| o.name == "with-tests")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].description, "Build tests");
    }

    #[test]
    fn test_spec_without_url() {
        let spec = SoftwareSpec::new(None, None, &flags());
        assert_eq!(spec.url(), None);
        assert_eq!(spec.version(), None);
        assert_eq!(spec.default_resource().name(), DEFAULT_RESOURCE);
    }

    #[test]
    fn test_declared_resource_is_same_instance() {
        let mut spec = spec();
        let declared: *const Resource = spec
            .declare_resource("docs", |r| {
                r.set_url("http://x/docs.tar.gz");
            })
            .unwrap();
        let fetched = spec.resource("docs").unwrap();
        assert!(std::ptr::eq(declared, fetched));
        assert_eq!(fetched.url(), Some("http://x/docs.tar.gz"));
    }

    #[test]
    fn test_duplicate_resource() {
        let mut spec = spec();
        spec.declare_resource("docs", |_| {}).unwrap();
        match spec.declare_resource("docs", |r| {
            r.set_url("http://elsewhere/docs.tar.gz");
        }) {
            Err(SpecError::DuplicateResource(name)) => assert_eq!(name, "docs"),
            other => panic!("expected DuplicateResource, got {:?}", other),
        }
        assert_eq!(spec.resources().len(), 1);
        assert_eq!(spec.resource("docs").unwrap().url(), None);
    }

    #[test]
    fn test_missing_resource_carries_owner_and_name() {
        let mut spec = spec();
        spec.set_owner(Owner::new("pkg"));
        match spec.resource("nope") {
            Err(SpecError::ResourceMissing { owner, name }) => {
                assert_eq!(owner.unwrap().name(), "pkg");
                assert_eq!(name, "nope");
            }
            other => panic!("expected ResourceMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_option_name_validation() {
        let mut spec = spec();
        assert!(matches!(
            spec.option("", None),
            Err(SpecError::OptionNameRequired)
        ));
        assert!(matches!(
            spec.option("-x", None),
            Err(SpecError::OptionStartsWithDash(_))
        ));
        assert!(matches!(
            spec.option("--x", None),
            Err(SpecError::OptionStartsWithDash(_))
        ));
        assert!(spec.option("x", None).is_ok());
        assert!(spec.build().has_option("x"));
        assert_eq!(spec.build().len(), 1);
    }

    #[test]
    fn test_owner_propagation() {
        let mut spec = spec();
        spec.declare_resource("a", |_| {}).unwrap();
        spec.declare_resource("b", |_| {}).unwrap();

        let owner = Owner::new("pkg");
        spec.set_owner(owner.clone());
        assert!(spec.default_resource().owner().unwrap().same(&owner));
        for resource in spec.resources() {
            assert!(resource.owner().unwrap().same(&owner));
        }

        spec.declare_resource("late", |_| {}).unwrap();
        assert!(spec.resource("late").unwrap().owner().is_none());

        spec.set_owner(owner.clone());
        assert!(spec.resource("late").unwrap().owner().unwrap().same(&owner));
    }

    #[test]
    fn test_depends_on_registers_dep_options() {
        let mut spec = spec();
        spec.depends_on(("libiconv", DepTag::Optional)).unwrap();
        spec.depends_on(("openssl", DepTag::Recommended)).unwrap();
        spec.depends_on(("pkg-config", DepTag::Build)).unwrap();
        spec.depends_on(":x11").unwrap();

        assert_eq!(spec.deps().len(), 3);
        assert_eq!(spec.requirements().len(), 1);
        assert_eq!(
            spec.build().as_flags(),
            vec!["--with-libiconv", "--without-openssl"]
        );
    }

    #[test]
    fn test_checksum_delegation() {
        let mut spec = spec();
        spec.sha1("abc");
        assert_eq!(spec.checksum(), Some(&Checksum::new(ChecksumType::Sha1, "abc")));
        assert_eq!(spec.default_resource().checksum(), spec.checksum());
    }

    #[test]
    fn test_head_spec() {
        let head = SoftwareSpec::head(Some("https://github.com/foo/bar.git"), None, &flags());
        assert!(head.version().unwrap().is_head());
        assert_eq!(head.integrity_policy(), IntegrityPolicy::Skip);
        assert_eq!(head.download_strategy(), DownloadStrategy::Git);
    }

    #[test]
    fn test_head_spec_never_fails_verification() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"anything").unwrap();

        let mut head = SoftwareSpec::head(Some("https://github.com/foo/bar.git"), None, &flags());
        head.sha256("0".repeat(64));
        assert!(head.verify_download_integrity(file.path()).is_ok());
        assert!(head
            .verify_download_integrity(Path::new("/nonexistent/file"))
            .is_ok());
    }

    #[test]
    fn test_stable_spec_verifies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"anything").unwrap();

        let mut stable = spec();
        stable.sha256("0".repeat(64));
        assert!(matches!(
            stable.verify_download_integrity(file.path()),
            Err(SpecError::ChecksumMismatch { .. })
        ));
    }
}
