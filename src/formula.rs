//! Formula definitions and the specs built from them.
//!
//! A formula is the owner of its specs. It is loaded from a JSON
//! definition that mirrors the formula DSL:
//!
//! ```text
//! {
//!   "name": "wget",
//!   "homepage": "https://www.gnu.org/software/wget/",
//!   "stable": { "url": "https://ftp.gnu.org/gnu/wget/wget-1.15.tar.xz", "sha256": "..." },
//!   "head":   { "url": "git://git.savannah.gnu.org/wget.git" },
//!   "bottle": { "root_url": "https://example.com/bottles",
//!               "sha256": { "arm64_sonoma": "...", "x86_64_linux": "..." } },
//!   "options":    ["with-debug", { "name": "with-iri", "description": "Enable IRI support" }],
//!   "depends_on": ["pkg-config", { "name": "openssl", "tags": ["recommended"] }]
//! }
//! ```
//!
//! Formula-level `options` and `depends_on` apply to the stable, devel and
//! HEAD specs. Each spec's owner is set after all of its resources are
//! declared so it reaches every one of them.

use crate::bottle::Bottle;
use crate::checksum::ChecksumType;
use crate::dependency::{DepTag, DependencySpec};
use crate::error::Result;
use crate::options::BuildFlags;
use crate::platform::BottleTag;
use crate::resource::{DownloadStrategy, Owner, Resource};
use crate::software_spec::SoftwareSpec;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulaDefinition {
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub stable: Option<SpecDefinition>,
    #[serde(default)]
    pub devel: Option<SpecDefinition>,
    #[serde(default)]
    pub head: Option<SpecDefinition>,
    #[serde(default)]
    pub bottle: Option<BottleDefinition>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub depends_on: Vec<DependencyDefinition>,
}

/// Where and how to download something, shared by specs and resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDefinition {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub mirrors: Vec<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub using: Option<DownloadStrategy>,
    /// Strategy options such as `tag`, `branch` or `revision`
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
}

impl SourceDefinition {
    fn apply(&self, resource: &mut Resource) {
        if let Some(url) = &self.url {
            resource.set_url_with_specs(url.clone(), self.specs.clone());
        }
        if let Some(version) = &self.version {
            resource.set_version(version.as_str());
        }
        for mirror in &self.mirrors {
            resource.mirror(mirror.clone());
        }
        if let Some(sha1) = &self.sha1 {
            resource.sha1(sha1.clone());
        }
        if let Some(sha256) = &self.sha256 {
            resource.sha256(sha256.clone());
        }
        if let Some(strategy) = self.using {
            resource.using(strategy);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecDefinition {
    #[serde(flatten)]
    pub source: SourceDefinition,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub depends_on: Vec<DependencyDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(flatten)]
    pub source: SourceDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionDefinition {
    Name(String),
    Described {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl OptionDefinition {
    fn parts(&self) -> (&str, Option<&str>) {
        match self {
            Self::Name(name) => (name, None),
            Self::Described { name, description } => (name, description.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDefinition {
    Name(String),
    Tagged {
        name: String,
        #[serde(default)]
        tags: Vec<DepTag>,
    },
}

impl From<&DependencyDefinition> for DependencySpec {
    fn from(def: &DependencyDefinition) -> Self {
        match def {
            DependencyDefinition::Name(name) => DependencySpec::new(name.clone()),
            DependencyDefinition::Tagged { name, tags } => DependencySpec {
                expr: name.clone(),
                tags: tags.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BottleDefinition {
    #[serde(default)]
    pub root_url: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub cellar: Option<String>,
    #[serde(default)]
    pub revision: u32,
    /// Platform tag → digest
    #[serde(default)]
    pub sha1: BTreeMap<String, String>,
    #[serde(default)]
    pub sha256: BTreeMap<String, String>,
}

impl BottleDefinition {
    fn digests(&self, ty: ChecksumType) -> &BTreeMap<String, String> {
        match ty {
            ChecksumType::Sha1 => &self.sha1,
            ChecksumType::Sha256 => &self.sha256,
        }
    }
}

/// Which of a formula's specs to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    Stable,
    Devel,
    Head,
    Bottle,
}

impl SpecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Devel => "devel",
            Self::Head => "head",
            Self::Bottle => "bottle",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "devel" => Ok(Self::Devel),
            "head" => Ok(Self::Head),
            "bottle" => Ok(Self::Bottle),
            other => Err(format!("unknown spec: {other}")),
        }
    }
}

/// A loaded formula: metadata plus its specs
#[derive(Debug, Clone)]
pub struct Formula {
    owner: Owner,
    desc: Option<String>,
    homepage: Option<String>,
    flags: BuildFlags,
    stable: Option<SoftwareSpec>,
    devel: Option<SoftwareSpec>,
    head: Option<SoftwareSpec>,
    bottle: Option<Bottle>,
}

impl Formula {
    /// Read and build a formula from a JSON definition file
    pub fn load(path: &Path, flags: &BuildFlags, tag: &BottleTag) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents, flags, tag)
    }

    pub fn from_json(json: &str, flags: &BuildFlags, tag: &BottleTag) -> Result<Self> {
        let def: FormulaDefinition = serde_json::from_str(json)?;
        Self::from_definition(&def, flags, tag)
    }

    /// Build every spec the definition declares.
    ///
    /// Fails on the first invalid declaration (duplicate resource, bad
    /// option name, unsupported dependency); no partial formula is returned.
    pub fn from_definition(
        def: &FormulaDefinition,
        flags: &BuildFlags,
        tag: &BottleTag,
    ) -> Result<Self> {
        let owner = Owner::new(def.name.as_str());

        let build_spec = |spec_def: &SpecDefinition, head: bool| -> Result<SoftwareSpec> {
            let mut spec = if head {
                SoftwareSpec::head(None, None, flags)
            } else {
                SoftwareSpec::new(None, None, flags)
            };
            spec_def.source.apply(spec.default_resource_mut());

            for resource in &spec_def.resources {
                spec.declare_resource(&resource.name, |r| resource.source.apply(r))?;
            }
            for option in def.options.iter().chain(&spec_def.options) {
                let (name, description) = option.parts();
                spec.option(name, description)?;
            }
            for dep in def.depends_on.iter().chain(&spec_def.depends_on) {
                spec.depends_on(dep)?;
            }

            spec.set_owner(owner.clone());
            Ok(spec)
        };

        let stable = def.stable.as_ref().map(|d| build_spec(d, false)).transpose()?;
        let devel = def.devel.as_ref().map(|d| build_spec(d, false)).transpose()?;
        let head = def.head.as_ref().map(|d| build_spec(d, true)).transpose()?;

        let bottle = match &def.bottle {
            Some(bottle_def) => {
                let version = stable.as_ref().and_then(SoftwareSpec::version);
                Some(Self::build_bottle(bottle_def, &owner, version, flags, tag))
            }
            None => None,
        };

        debug!(
            "Loaded formula {} (stable: {}, devel: {}, head: {}, bottle: {})",
            owner,
            stable.is_some(),
            devel.is_some(),
            head.is_some(),
            bottle.is_some()
        );

        Ok(Self {
            owner,
            desc: def.desc.clone(),
            homepage: def.homepage.clone(),
            flags: flags.clone(),
            stable,
            devel,
            head,
            bottle,
        })
    }

    fn build_bottle(
        def: &BottleDefinition,
        owner: &Owner,
        version: Option<Version>,
        flags: &BuildFlags,
        tag: &BottleTag,
    ) -> Bottle {
        let mut bottle = Bottle::new(tag.clone(), flags);
        if let Some(root_url) = &def.root_url {
            bottle.set_root_url(root_url.clone());
        }
        if let Some(prefix) = &def.prefix {
            bottle.set_prefix(prefix.clone());
        }
        if let Some(cellar) = &def.cellar {
            bottle.set_cellar(cellar.clone());
        }
        bottle.set_revision(def.revision);

        for ty in ChecksumType::ALL {
            for (platform, digest) in def.digests(ty) {
                bottle.set_checksum_for(ty, platform.as_str(), digest.clone());
            }
        }

        bottle.set_owner(owner.clone());

        if !bottle.is_compatible() {
            warn!("No bottle for {} on {}", owner, tag);
        } else if let Some(version) = version {
            bottle.resolve_url(&version);
        }

        bottle
    }

    pub fn name(&self) -> &str {
        self.owner.name()
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn stable(&self) -> Option<&SoftwareSpec> {
        self.stable.as_ref()
    }

    pub fn devel(&self) -> Option<&SoftwareSpec> {
        self.devel.as_ref()
    }

    pub fn head(&self) -> Option<&SoftwareSpec> {
        self.head.as_ref()
    }

    pub fn bottle(&self) -> Option<&Bottle> {
        self.bottle.as_ref()
    }

    pub fn spec(&self, kind: SpecKind) -> Option<&SoftwareSpec> {
        match kind {
            SpecKind::Stable => self.stable(),
            SpecKind::Devel => self.devel(),
            SpecKind::Head => self.head(),
            SpecKind::Bottle => self.bottle().map(Bottle::spec),
        }
    }

    /// The spec a build would use: HEAD or devel when requested with
    /// `--HEAD`/`--devel` and declared, otherwise stable, falling back to
    /// devel then HEAD for formulae without a stable release.
    pub fn active_spec_kind(&self) -> Option<SpecKind> {
        if self.head.is_some() && self.flags.include("--HEAD") {
            Some(SpecKind::Head)
        } else if self.devel.is_some() && self.flags.include("--devel") {
            Some(SpecKind::Devel)
        } else if self.stable.is_some() {
            Some(SpecKind::Stable)
        } else if self.devel.is_some() {
            Some(SpecKind::Devel)
        } else if self.head.is_some() {
            Some(SpecKind::Head)
        } else {
            None
        }
    }

    pub fn active_spec(&self) -> Option<&SoftwareSpec> {
        self.active_spec_kind().and_then(|kind| self.spec(kind))
    }

    /// Specs in stable, devel, head, bottle order
    pub fn specs(&self) -> Vec<(SpecKind, &SoftwareSpec)> {
        [SpecKind::Stable, SpecKind::Devel, SpecKind::Head, SpecKind::Bottle]
            .into_iter()
            .filter_map(|kind| self.spec(kind).map(|spec| (kind, spec)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecError;

    const WGET: &str = r#"{
        "name": "wget",
        "homepage": "https://www.gnu.org/software/wget/",
        "stable": {
            "url": "https://ftp.gnu.org/gnu/wget/wget-1.15.tar.xz",
            "sha256": "52126be8cf1bddd7536886e74c053ad7d0ed2aa89b4b630f76785bac21695fcd",
            "resources": [
                { "name": "docs", "url": "https://ftp.gnu.org/gnu/wget/wget-docs-1.15.tar.gz" }
            ]
        },
        "head": {
            "url": "git://git.savannah.gnu.org/wget.git",
            "depends_on": [{ "name": ":autoconf" }]
        },
        "bottle": {
            "root_url": "https://example.com/bottles",
            "revision": 1,
            "sha256": {
                "arm64_sonoma": "aaaa",
                "x86_64_linux": "bbbb"
            }
        },
        "options": ["with-debug", { "name": "with-iri", "description": "Enable IRI support" }],
        "depends_on": ["pkg-config", { "name": "openssl", "tags": ["recommended"] }]
    }"#;

    fn load(flags: &[&str], tag: &str) -> Formula {
        Formula::from_json(WGET, &BuildFlags::new(flags.iter().copied()), &BottleTag::new(tag))
            .unwrap()
    }

    #[test]
    fn test_loads_every_spec() {
        let formula = load(&[], "arm64_sonoma");
        assert_eq!(formula.name(), "wget");
        assert!(formula.stable().is_some());
        assert!(formula.devel().is_none());
        assert!(formula.head().is_some());
        assert!(formula.bottle().is_some());
        assert_eq!(formula.specs().len(), 3);
    }

    #[test]
    fn test_owner_reaches_every_resource() {
        let formula = load(&[], "arm64_sonoma");
        let stable = formula.stable().unwrap();
        assert!(stable.owner().unwrap().same(formula.owner()));
        assert!(stable.default_resource().owner().unwrap().same(formula.owner()));
        assert!(stable.resource("docs").unwrap().owner().unwrap().same(formula.owner()));
        assert_eq!(stable.resource("docs").unwrap().download_name(), "wget--docs");
    }

    #[test]
    fn test_formula_level_declarations_apply_to_each_spec() {
        let formula = load(&[], "arm64_sonoma");
        for kind in [SpecKind::Stable, SpecKind::Head] {
            let spec = formula.spec(kind).unwrap();
            assert!(spec.build().has_option("with-debug"));
            assert!(spec.build().has_option("without-openssl"));
            assert_eq!(
                spec.build().get("with-iri").unwrap().description,
                "Enable IRI support"
            );
        }
        assert_eq!(formula.stable().unwrap().deps().len(), 2);
        assert_eq!(formula.head().unwrap().deps().len(), 3);
    }

    #[test]
    fn test_bottle_resolves_for_runtime_tag() {
        let formula = load(&[], "arm64_sonoma");
        let bottle = formula.bottle().unwrap();
        assert_eq!(bottle.spec().checksum().unwrap().hexdigest, "aaaa");
        assert_eq!(
            bottle.url(),
            Some("https://example.com/bottles/wget-1.15.arm64_sonoma.bottle.1.tar.gz")
        );

        let formula = load(&[], "x86_64_linux");
        assert_eq!(formula.bottle().unwrap().spec().checksum().unwrap().hexdigest, "bbbb");
    }

    #[test]
    fn test_bottle_for_unknown_platform() {
        let formula = load(&[], "ppc_tiger");
        let bottle = formula.bottle().unwrap();
        assert!(!bottle.is_compatible());
        assert!(bottle.spec().checksum().is_none());
        assert_eq!(bottle.url(), None);
    }

    #[test]
    fn test_active_spec_follows_flags() {
        assert_eq!(load(&[], "arm64_sonoma").active_spec_kind(), Some(SpecKind::Stable));
        assert_eq!(
            load(&["--HEAD"], "arm64_sonoma").active_spec_kind(),
            Some(SpecKind::Head)
        );
        // no devel spec declared
        assert_eq!(
            load(&["--devel"], "arm64_sonoma").active_spec_kind(),
            Some(SpecKind::Stable)
        );
    }

    #[test]
    fn test_head_only_formula() {
        let json = r#"{ "name": "tip", "head": { "url": "https://github.com/foo/tip.git" } }"#;
        let formula =
            Formula::from_json(json, &BuildFlags::default(), &BottleTag::new("x86_64_linux"))
                .unwrap();
        assert_eq!(formula.active_spec_kind(), Some(SpecKind::Head));
        assert!(formula.active_spec().unwrap().version().unwrap().is_head());
    }

    #[test]
    fn test_duplicate_resource_fails_whole_formula() {
        let json = r#"{
            "name": "dup",
            "stable": {
                "url": "http://x/dup-1.0.tar.gz",
                "resources": [{ "name": "a" }, { "name": "a" }]
            }
        }"#;
        let result =
            Formula::from_json(json, &BuildFlags::default(), &BottleTag::new("x86_64_linux"));
        assert!(matches!(result, Err(SpecError::DuplicateResource(name)) if name == "a"));
    }

    #[test]
    fn test_invalid_option_fails_whole_formula() {
        let json = r#"{ "name": "bad", "stable": { "url": "http://x/bad-1.0.tar.gz" }, "options": ["--oops"] }"#;
        let result =
            Formula::from_json(json, &BuildFlags::default(), &BottleTag::new("x86_64_linux"));
        assert!(matches!(result, Err(SpecError::OptionStartsWithDash(_))));
    }

    #[test]
    fn test_spec_kind_parse() {
        assert_eq!("HEAD".parse::<SpecKind>(), Ok(SpecKind::Head));
        assert_eq!("bottle".parse::<SpecKind>(), Ok(SpecKind::Bottle));
        assert!("nightly".parse::<SpecKind>().is_err());
    }
}
