//! Build options declared by a spec and the flags a build was requested with.

use crate::dependency::{DependencyHandle, Tagged};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Externally supplied arguments, e.g. the command line after the formula
/// name. Only entries starting with `--` are build option flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    args: Vec<String>,
}

impl BuildFlags {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Every dash-prefixed entry; bare arguments such as formula names are
    /// dropped
    pub fn options_only(&self) -> Vec<String> {
        self.args
            .iter()
            .filter(|arg| arg.starts_with('-'))
            .cloned()
            .collect()
    }

    pub fn include(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

/// A named build toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOption {
    pub name: String,
    pub description: String,
}

impl BuildOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Command line form, `--<name>`
    pub fn flag(&self) -> String {
        format!("--{}", self.name)
    }
}

impl fmt::Display for BuildOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag())
    }
}

/// Options a spec declares, plus the option flags a build was invoked with
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    args: Vec<String>,
    options: Vec<BuildOption>,
}

impl BuildOptions {
    pub fn new(flags: &BuildFlags) -> Self {
        Self {
            args: flags.options_only(),
            options: Vec::new(),
        }
    }

    /// Declare an option. A name that is already declared keeps its first
    /// description.
    pub fn add(&mut self, name: &str, description: Option<&str>) {
        if self.has_option(name) {
            return;
        }
        let description = match description {
            Some(description) => description.to_string(),
            None => default_description(name).to_string(),
        };
        debug!("Declared option --{}", name);
        self.options.push(BuildOption::new(name, description));
    }

    /// Register the implicit `with-`/`without-` option for an optional or
    /// recommended dependency. Other dependencies add nothing.
    pub fn add_dep_option(&mut self, dep: &DependencyHandle) {
        let name = dep.option_name();
        if dep.is_optional() {
            let option = format!("with-{name}");
            if !self.has_option(&option) {
                self.add(&option, Some(&format!("Build with {name} support")));
            }
        } else if dep.is_recommended() {
            let option = format!("without-{name}");
            if !self.has_option(&option) {
                self.add(&option, Some(&format!("Build without {name} support")));
            }
        }
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|opt| opt.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildOption> {
        self.options.iter()
    }

    pub fn get(&self, name: &str) -> Option<&BuildOption> {
        self.options.iter().find(|opt| opt.name == name)
    }

    pub fn as_flags(&self) -> Vec<String> {
        self.options.iter().map(BuildOption::flag).collect()
    }

    /// Whether `--<name>` was passed
    pub fn include(&self, name: &str) -> bool {
        let flag = format!("--{name}");
        self.args.iter().any(|arg| *arg == flag)
    }

    /// Whether the build should use `name`: true for a `with-` option that
    /// was passed, or a `without-` option that was not.
    pub fn with(&self, name: &str) -> bool {
        let with = format!("with-{name}");
        let without = format!("without-{name}");
        if self.has_option(&with) {
            self.include(&with)
        } else if self.has_option(&without) {
            !self.include(&without)
        } else {
            false
        }
    }

    pub fn without(&self, name: &str) -> bool {
        !self.with(name)
    }

    pub fn head(&self) -> bool {
        self.args.iter().any(|arg| arg == "--HEAD")
    }

    pub fn devel(&self) -> bool {
        self.args.iter().any(|arg| arg == "--devel")
    }

    pub fn stable(&self) -> bool {
        !(self.head() || self.devel())
    }

    pub fn universal(&self) -> bool {
        self.include("universal") && self.has_option("universal")
    }

    pub fn build_32_bit(&self) -> bool {
        self.include("32-bit") && self.has_option("32-bit")
    }

    /// Declared options that were passed
    pub fn used_options(&self) -> Vec<String> {
        self.as_flags()
            .into_iter()
            .filter(|flag| self.args.contains(flag))
            .collect()
    }

    /// Declared options that were not passed
    pub fn unused_options(&self) -> Vec<String> {
        self.as_flags()
            .into_iter()
            .filter(|flag| !self.args.contains(flag))
            .collect()
    }
}

fn default_description(name: &str) -> &'static str {
    match name {
        "universal" => "Build a universal binary",
        "32-bit" => "Build 32-bit only",
        _ => "",
    }
}
