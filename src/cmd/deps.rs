use anyhow::Result;
use brewspec::dependency::Tagged;
use brewspec::{Formula, SpecKind};
use colored::Colorize;

fn describe_tags(tags: &[brewspec::DepTag]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        let tags: Vec<_> = tags.iter().map(|t| t.as_str()).collect();
        format!(" ({})", tags.join(", "))
    }
}

pub fn deps(formula: &Formula, kind: Option<SpecKind>, include_build: bool) -> Result<()> {
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let Some(spec) = super::select_spec(formula, kind)? else {
        return Ok(());
    };

    let deps: Vec<_> = spec
        .deps()
        .iter()
        .filter(|dep| include_build || !dep.is_build())
        .collect();

    if deps.is_empty() && spec.requirements().is_empty() {
        if is_tty {
            println!("{} No dependencies", "✓".green());
        }
        return Ok(());
    }

    if !deps.is_empty() {
        if is_tty {
            println!("{}", "Dependencies:".bold().green());
        }
        for dep in deps {
            if is_tty {
                println!("  {}{}", dep.name().cyan(), describe_tags(dep.tags()).dimmed());
            } else {
                println!("{}", dep.name());
            }
        }
    }

    if !spec.requirements().is_empty() {
        if is_tty {
            println!("{}", "Requirements:".bold().green());
        }
        for req in spec.requirements() {
            if is_tty {
                println!("  {}{}", req.name().yellow(), describe_tags(req.tags()).dimmed());
            } else {
                println!(":{}", req.name());
            }
        }
    }

    Ok(())
}
