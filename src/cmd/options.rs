use anyhow::Result;
use brewspec::{Formula, SpecKind};
use colored::Colorize;

pub fn options(formula: &Formula, kind: Option<SpecKind>) -> Result<()> {
    println!("{}", format!("==> {}", formula.name()).bold().green());
    if let Some(desc) = formula.desc() {
        println!("{}", desc);
    }
    println!();

    let Some(spec) = super::select_spec(formula, kind)? else {
        return Ok(());
    };

    if spec.build().is_empty() {
        println!("No options available");
        return Ok(());
    }

    for option in spec.build().iter() {
        println!("{}", option.flag().cyan());
        if !option.description.is_empty() {
            println!("\t{}", option.description);
        }
    }

    let used = spec.build().used_options();
    if !used.is_empty() {
        println!();
        println!("{}: {}", "Requested".bold(), used.join(" "));
    }

    Ok(())
}
