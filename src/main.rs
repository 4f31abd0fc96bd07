mod cmd;

use anyhow::{Context, Result};
use brewspec::{BottleTag, BuildFlags, Formula, SpecKind, platform};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brewspec")]
#[command(author, version, about = "Inspect and verify formula software specs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Platform tag used to pick bottle checksums (detected when unset)
    #[arg(long, global = true, env = "HOMEBREW_BOTTLE_TAG")]
    bottle_tag: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct FormulaArgs {
    /// Formula definition (JSON)
    formula: PathBuf,

    /// Build options to evaluate the formula with, e.g. `-- --HEAD --with-iri`
    #[arg(last = true, allow_hyphen_values = true)]
    flags: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the specs, resources and bottle of a formula
    Info {
        #[command(flatten)]
        args: FormulaArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the build options a formula declares
    Options {
        #[command(flatten)]
        args: FormulaArgs,

        /// Spec to inspect (stable, devel, head, bottle)
        #[arg(long)]
        spec: Option<SpecKind>,
    },

    /// Show declared dependencies and requirements
    Deps {
        #[command(flatten)]
        args: FormulaArgs,

        /// Spec to inspect (stable, devel, head, bottle)
        #[arg(long)]
        spec: Option<SpecKind>,

        /// Include build-time dependencies
        #[arg(long)]
        include_build: bool,
    },

    /// Verify a downloaded file against a spec's checksum
    Verify {
        #[command(flatten)]
        args: FormulaArgs,

        /// Downloaded file to check
        #[arg(long)]
        file: PathBuf,

        /// Spec to verify against (stable, devel, head, bottle)
        #[arg(long)]
        spec: Option<SpecKind>,
    },
}

fn load_formula(args: &FormulaArgs, tag: &BottleTag) -> Result<Formula> {
    let flags = BuildFlags::new(args.flags.iter().cloned());
    Formula::load(&args.formula, &flags, tag)
        .with_context(|| format!("Failed to load formula: {}", args.formula.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let tag = match &cli.bottle_tag {
        Some(tag) => BottleTag::new(tag.as_str()),
        None => platform::detect_bottle_tag()?,
    };
    tracing::debug!("Using bottle tag {}", tag);

    match cli.command {
        Some(Commands::Info { args, json }) => {
            cmd::info(&load_formula(&args, &tag)?, json)?;
        }
        Some(Commands::Options { args, spec }) => {
            cmd::options(&load_formula(&args, &tag)?, spec)?;
        }
        Some(Commands::Deps {
            args,
            spec,
            include_build,
        }) => {
            cmd::deps(&load_formula(&args, &tag)?, spec, include_build)?;
        }
        Some(Commands::Verify { args, file, spec }) => {
            cmd::verify(&load_formula(&args, &tag)?, &file, spec)?;
        }
        None => {
            println!("{} brewspec - formula software spec inspector", "==>".bold().green());
            println!("\nRun {} to see available commands.", "brewspec --help".cyan());
            println!("Bottle tag for this system: {}", tag.to_string().cyan());
        }
    }

    Ok(())
}
