use anyhow::Result;
use brewspec::{Formula, SoftwareSpec, SpecKind};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SpecInfo {
    spec: SpecKind,
    url: Option<String>,
    version: Option<String>,
    checksum: Option<String>,
    strategy: String,
    mirrors: Vec<String>,
    resources: Vec<ResourceInfo>,
}

#[derive(Debug, Serialize)]
struct ResourceInfo {
    name: String,
    url: Option<String>,
    checksum: Option<String>,
}

#[derive(Debug, Serialize)]
struct BottleInfo {
    tag: String,
    compatible: bool,
    url: Option<String>,
    prefix: String,
    cellar: String,
    revision: u32,
    platforms: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FormulaInfo {
    name: String,
    desc: Option<String>,
    homepage: Option<String>,
    active: Option<SpecKind>,
    specs: Vec<SpecInfo>,
    bottle: Option<BottleInfo>,
}

fn spec_info(kind: SpecKind, spec: &SoftwareSpec) -> SpecInfo {
    SpecInfo {
        spec: kind,
        url: spec.url().map(str::to_string),
        version: spec.version().map(|v| v.to_string()),
        checksum: spec.checksum().map(|c| c.to_string()),
        strategy: spec.download_strategy().to_string(),
        mirrors: spec.mirrors().to_vec(),
        resources: spec
            .resources()
            .iter()
            .map(|r| ResourceInfo {
                name: r.name().to_string(),
                url: r.url().map(str::to_string),
                checksum: r.checksum().map(|c| c.to_string()),
            })
            .collect(),
    }
}

fn formula_info(formula: &Formula) -> FormulaInfo {
    let bottle = formula.bottle().map(|bottle| {
        let mut platforms: Vec<String> = bottle
            .sha1s()
            .into_iter()
            .chain(bottle.sha256s())
            .flat_map(|by_tag| by_tag.keys().map(|tag| tag.to_string()))
            .collect();
        platforms.sort();
        platforms.dedup();

        BottleInfo {
            tag: bottle.current_tag().to_string(),
            compatible: bottle.is_compatible(),
            url: bottle.url().map(str::to_string),
            prefix: bottle.prefix().to_string(),
            cellar: bottle.cellar().to_string(),
            revision: bottle.revision(),
            platforms,
        }
    });

    FormulaInfo {
        name: formula.name().to_string(),
        desc: formula.desc().map(str::to_string),
        homepage: formula.homepage().map(str::to_string),
        active: formula.active_spec_kind(),
        specs: formula
            .specs()
            .into_iter()
            .filter(|(kind, _)| *kind != SpecKind::Bottle)
            .map(|(kind, spec)| spec_info(kind, spec))
            .collect(),
        bottle,
    }
}

pub fn info(formula: &Formula, json: bool) -> Result<()> {
    let info = formula_info(formula);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", format!("==> {}", info.name).bold().green());
    if let Some(desc) = &info.desc {
        println!("{}", desc);
    }
    if let Some(homepage) = &info.homepage {
        println!("{}: {}", "Homepage".bold(), homepage);
    }

    for spec in &info.specs {
        let marker = if info.active == Some(spec.spec) { " *" } else { "" };
        println!();
        println!(
            "{}: {}{}",
            spec.spec.to_string().bold(),
            spec.version.as_deref().unwrap_or("(unknown version)"),
            marker
        );
        if let Some(url) = &spec.url {
            println!("  {} ({})", url, spec.strategy.dimmed());
        }
        for mirror in &spec.mirrors {
            println!("  {} {}", "mirror".dimmed(), mirror);
        }
        if let Some(checksum) = &spec.checksum {
            println!("  {}", checksum.dimmed());
        }
        for resource in &spec.resources {
            let line = format!("{} {}", resource.name, resource.url.as_deref().unwrap_or(""));
            println!("  {} {}", "resource".cyan(), line.trim_end());
        }
    }

    if let Some(bottle) = &info.bottle {
        println!();
        if bottle.compatible {
            println!("{}: {} {}", "Bottle".bold(), bottle.tag, "✓".green());
            if let Some(url) = &bottle.url {
                println!("  {}", url);
            }
        } else {
            println!(
                "{}: {} {} (available: {})",
                "Bottle".bold(),
                bottle.tag,
                "✗".red(),
                bottle.platforms.join(", ")
            );
        }
        println!(
            "  {} {}  {} {}",
            "prefix".dimmed(),
            bottle.prefix,
            "cellar".dimmed(),
            bottle.cellar
        );
    }

    Ok(())
}
