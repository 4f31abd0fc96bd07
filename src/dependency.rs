//! Dependency declarations.
//!
//! A spec declares what it needs with `depends_on`; the
//! [`DependencyCollector`] sorts each declaration into either a formula
//! [`Dependency`] (something that can itself be installed) or a
//! [`Requirement`] (something the system has to provide, like X11 or a
//! compiler toolchain). Resolving the graph is somebody else's job.

use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Qualifier on a dependency declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DepTag {
    Build,
    Optional,
    Recommended,
    Run,
    Other(String),
}

impl DepTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Optional => "optional",
            Self::Recommended => "recommended",
            Self::Run => "run",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for DepTag {
    fn from(tag: String) -> Self {
        match tag.trim_start_matches(':') {
            "build" => Self::Build,
            "optional" => Self::Optional,
            "recommended" => Self::Recommended,
            "run" => Self::Run,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<DepTag> for String {
    fn from(tag: DepTag) -> Self {
        tag.as_str().to_string()
    }
}

impl FromStr for DepTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for DepTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag predicates shared by dependencies and requirements
pub trait Tagged {
    fn tags(&self) -> &[DepTag];

    fn is_build(&self) -> bool {
        self.tags().contains(&DepTag::Build)
    }

    fn is_optional(&self) -> bool {
        self.tags().contains(&DepTag::Optional)
    }

    fn is_recommended(&self) -> bool {
        self.tags().contains(&DepTag::Recommended)
    }

    /// Neither optional nor recommended
    fn is_required(&self) -> bool {
        !self.is_optional() && !self.is_recommended()
    }
}

/// A formula this spec needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    name: String,
    tags: Vec<DepTag>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, tags: Vec<DepTag>) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }

    /// Full name, possibly tap-qualified (`homebrew/dupes/libiconv`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in `with-`/`without-` options: the last path component
    pub fn option_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

impl Tagged for Dependency {
    fn tags(&self) -> &[DepTag] {
        &self.tags
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Something the system must provide rather than a formula to install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    X11,
    Mysql,
    Postgresql,
    Python,
    Python3,
    Tex,
    Fortran,
    Clt,
    Xcode,
    Java,
    Mpi,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X11 => "x11",
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::Python => "python",
            Self::Python3 => "python3",
            Self::Tex => "tex",
            Self::Fortran => "fortran",
            Self::Clt => "clt",
            Self::Xcode => "xcode",
            Self::Java => "java",
            Self::Mpi => "mpi",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        let kind = match symbol {
            "x11" => Self::X11,
            "mysql" => Self::Mysql,
            "postgresql" => Self::Postgresql,
            "python" => Self::Python,
            "python3" => Self::Python3,
            "tex" => Self::Tex,
            "fortran" => Self::Fortran,
            "clt" => Self::Clt,
            "xcode" => Self::Xcode,
            "java" => Self::Java,
            "mpi" => Self::Mpi,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    kind: RequirementKind,
    tags: Vec<DepTag>,
}

impl Requirement {
    pub fn new(kind: RequirementKind, tags: Vec<DepTag>) -> Self {
        Self { kind, tags }
    }

    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn option_name(&self) -> &'static str {
        self.name()
    }
}

impl Tagged for Requirement {
    fn tags(&self) -> &[DepTag] {
        &self.tags
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the collector recorded for one `depends_on`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyHandle {
    Dependency(Dependency),
    Requirement(Requirement),
}

impl DependencyHandle {
    pub fn option_name(&self) -> &str {
        match self {
            Self::Dependency(dep) => dep.option_name(),
            Self::Requirement(req) => req.option_name(),
        }
    }
}

impl Tagged for DependencyHandle {
    fn tags(&self) -> &[DepTag] {
        match self {
            Self::Dependency(dep) => dep.tags(),
            Self::Requirement(req) => req.tags(),
        }
    }
}

/// A `depends_on` argument: a formula name or a `:symbol`, plus tags.
///
/// ```
/// use brewspec::dependency::{DependencySpec, DepTag};
///
/// let spec = DependencySpec::new("pkg-config").tag(DepTag::Build);
/// let x11 = DependencySpec::from(":x11");
/// assert!(x11.is_symbol());
/// # let _ = spec;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub expr: String,
    #[serde(default)]
    pub tags: Vec<DepTag>,
}

impl DependencySpec {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: DepTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn is_symbol(&self) -> bool {
        self.expr.starts_with(':')
    }
}

impl From<&str> for DependencySpec {
    fn from(expr: &str) -> Self {
        Self::new(expr)
    }
}

impl From<String> for DependencySpec {
    fn from(expr: String) -> Self {
        Self::new(expr)
    }
}

impl<S: Into<String>> From<(S, DepTag)> for DependencySpec {
    fn from((expr, tag): (S, DepTag)) -> Self {
        Self::new(expr).tag(tag)
    }
}

/// Accumulates the dependencies and requirements a spec declares
#[derive(Debug, Clone, Default)]
pub struct DependencyCollector {
    deps: Vec<Dependency>,
    requirements: Vec<Requirement>,
}

impl DependencyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration.
    ///
    /// Returns the recorded dependency or requirement, or `None` when the
    /// declaration is satisfied by every supported system (`:ld64`).
    /// Repeated declarations of the same name are recorded once.
    pub fn add(&mut self, spec: impl Into<DependencySpec>) -> Result<Option<DependencyHandle>> {
        let spec = spec.into();
        let Some(handle) = Self::build(spec)? else {
            return Ok(None);
        };

        match &handle {
            DependencyHandle::Dependency(dep) => {
                if !self.deps.iter().any(|d| d.name == dep.name) {
                    debug!("Declared dependency {}", dep);
                    self.deps.push(dep.clone());
                }
            }
            DependencyHandle::Requirement(req) => {
                if !self.requirements.iter().any(|r| r.kind == req.kind) {
                    debug!("Declared requirement {}", req);
                    self.requirements.push(req.clone());
                }
            }
        }

        Ok(Some(handle))
    }

    fn build(spec: DependencySpec) -> Result<Option<DependencyHandle>> {
        let DependencySpec { expr, mut tags } = spec;

        let Some(symbol) = expr.strip_prefix(':') else {
            if expr.trim().is_empty() {
                return Err(SpecError::UnsupportedDependency(expr));
            }
            return Ok(Some(DependencyHandle::Dependency(Dependency::new(
                expr, tags,
            ))));
        };

        let handle = match symbol {
            "autoconf" | "automake" | "bsdmake" | "libtool" => {
                autotools_tags(&mut tags);
                DependencyHandle::Dependency(Dependency::new(symbol, tags))
            }
            "libltdl" => {
                tags.push(DepTag::Run);
                autotools_tags(&mut tags);
                DependencyHandle::Dependency(Dependency::new("libtool", tags))
            }
            "ld64" => return Ok(None),
            other => match RequirementKind::from_symbol(other) {
                Some(kind) => DependencyHandle::Requirement(Requirement::new(kind, tags)),
                None => return Err(SpecError::UnsupportedDependency(expr)),
            },
        };

        Ok(Some(handle))
    }

    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

/// Autotools are build-time only unless something needs them at runtime
fn autotools_tags(tags: &mut Vec<DepTag>) {
    if !tags.contains(&DepTag::Run) && !tags.contains(&DepTag::Build) {
        tags.push(DepTag::Build);
    }
}
