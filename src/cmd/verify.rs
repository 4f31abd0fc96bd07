use anyhow::{Context, Result};
use brewspec::{Formula, IntegrityPolicy, SoftwareSpec, SpecKind};
use colored::Colorize;
use std::path::Path;

pub fn verify(formula: &Formula, file: &Path, kind: Option<SpecKind>) -> Result<()> {
    let Some(spec) = super::select_spec(formula, kind)? else {
        return Ok(());
    };

    spec.verify_download_integrity(file)
        .with_context(|| format!("Failed to verify {}", file.display()))?;

    if spec.integrity_policy() == IntegrityPolicy::Skip {
        println!("{} {} ({})", "⚠".yellow(), file.display(), skip_reason(spec));
        return Ok(());
    }

    match spec.checksum() {
        Some(checksum) => println!("{} {} ({})", "✓".green(), file.display(), checksum.ty),
        None => println!("{} {} (no checksum to verify against)", "⚠".yellow(), file.display()),
    }

    Ok(())
}

fn skip_reason(spec: &SoftwareSpec) -> String {
    let strategy = spec.download_strategy();
    if strategy.is_vcs() {
        format!("{} checkouts are not checksummed", strategy)
    } else {
        "HEAD downloads are not checksummed".to_string()
    }
}
