//! Command implementations for the brewspec CLI
//!
//! - **info**: Spec summary (URLs, versions, resources, bottle status)
//! - **options**: Declared build options
//! - **deps**: Declared dependencies and requirements
//! - **verify**: Check a downloaded file against a spec's checksum

pub mod deps;
pub mod info;
pub mod options;
pub mod verify;

pub use deps::deps;
pub use info::info;
pub use options::options;
pub use verify::verify;

use anyhow::{Result, bail};
use brewspec::{Formula, SoftwareSpec, SpecKind};
use colored::Colorize;

/// The requested spec, or the formula's active one when none was named
pub(crate) fn select_spec(
    formula: &Formula,
    kind: Option<SpecKind>,
) -> Result<Option<&SoftwareSpec>> {
    match kind {
        Some(kind) => match formula.spec(kind) {
            Some(spec) => Ok(Some(spec)),
            None => bail!("{} has no {} spec", formula.name(), kind),
        },
        None => {
            let spec = formula.active_spec();
            if spec.is_none() {
                println!("{} {} declares no specs", "✗".red(), formula.name());
            }
            Ok(spec)
        }
    }
}
