//! Software spec object model for Homebrew-compatible formulae.
//!
//! A formula describes how to obtain, verify and build a package through a
//! handful of specs: stable, devel, HEAD, and a precompiled bottle. Each spec
//! aggregates a default fetchable [`Resource`], named auxiliary resources,
//! build options and dependency declarations. Bottles add per-platform
//! checksums, resolved against the running platform's [`BottleTag`].
//!
//! Downloading, unpacking and dependency resolution live outside this crate;
//! the [`Downloader`] trait is the seam for the first two.

pub mod bottle;
pub mod checksum;
pub mod dependency;
pub mod error;
pub mod formula;
pub mod options;
pub mod platform;
pub mod resource;
pub mod software_spec;
pub mod version;

// Re-export commonly used types
pub use bottle::Bottle;
pub use checksum::{Checksum, ChecksumType};
pub use dependency::{DepTag, Dependency, DependencyCollector, DependencySpec, Requirement};
pub use error::{Result, SpecError};
pub use formula::{Formula, SpecKind};
pub use options::{BuildFlags, BuildOption, BuildOptions};
pub use platform::BottleTag;
pub use resource::{Download, DownloadStrategy, Downloader, Owner, Resource};
pub use software_spec::{IntegrityPolicy, SoftwareSpec};
pub use version::Version;
