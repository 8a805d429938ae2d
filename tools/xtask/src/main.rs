//! Workspace automation tasks.
//!
//! Run with: `cargo xtask <command>`

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use apim_core::ScopeType;
use apim_params::{KeyRegistry, ValueKind};
use clap::{Parser, Subcommand};

const REQUIRED_ATTRIBUTES: &[&str] = &["#![forbid(unsafe_code)]", "#![deny(missing_docs)]"];

#[derive(Parser)]
#[command(name = "xtask", about = "apim workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks locally
    Ci,
    /// Validate workspace conventions
    Lint,
    /// Generate coverage report
    Coverage,
    /// Write the built-in parameter key reference
    Keys {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Lint => run_lint(),
        Commands::Coverage => run_coverage(),
        Commands::Keys { out } => run_keys(out.as_deref()),
    }
}

fn run_ci() -> Result<()> {
    println!("Running CI checks...\n");

    run_cmd("cargo", &["fmt", "--check"])?;
    run_cmd("cargo", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    run_cmd("cargo", &["test", "--workspace"])?;
    run_cmd("cargo", &["doc", "--workspace", "--no-deps"])?;
    run_lint()?;

    println!("\nAll CI checks passed!");
    Ok(())
}

fn run_lint() -> Result<()> {
    println!("Validating workspace conventions...\n");

    for entry in std::fs::read_dir("crates")? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("apim-") {
            anyhow::bail!("Crate '{name}' does not follow apim-* naming");
        }
        check_crate_attributes(&entry.path().join("src/lib.rs"))?;
    }

    // the built-in table must stay loadable: unique ids, unique names, non-empty scopes
    let registry = KeyRegistry::builtin();
    KeyRegistry::from_keys(registry.iter().copied())
        .context("built-in parameter keys are inconsistent")?;
    println!("{} built-in parameter keys", registry.len());

    println!("All conventions validated!");
    Ok(())
}

fn check_crate_attributes(lib: &Path) -> Result<()> {
    let source = std::fs::read_to_string(lib)
        .with_context(|| format!("Failed to read {}", lib.display()))?;
    for attribute in REQUIRED_ATTRIBUTES {
        if !source.contains(attribute) {
            anyhow::bail!("{} is missing {attribute}", lib.display());
        }
    }
    Ok(())
}

fn run_coverage() -> Result<()> {
    run_cmd("cargo", &["llvm-cov", "--workspace", "--html"])?;
    println!("\nCoverage report: target/llvm-cov/html/index.html");
    Ok(())
}

fn run_keys(out: Option<&Path>) -> Result<()> {
    let mut doc = String::from(
        "# Parameter keys\n\n| Name | Default | Scopes | Kind | Overridable |\n|------|---------|--------|------|-------------|\n",
    );
    for key in KeyRegistry::builtin().iter() {
        let scopes = key
            .scopes()
            .iter()
            .map(ScopeType::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let kind = match key.kind() {
            ValueKind::Scalar => "scalar",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        writeln!(
            doc,
            "| `{}` | `{}` | {scopes} | {kind} | {} |",
            key.name(),
            key.default_value(),
            if key.is_overridable() { "yes" } else { "no" },
        )?;
    }

    match out {
        Some(path) => {
            std::fs::write(path, doc).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{doc}"),
    }
    Ok(())
}

fn run_cmd(cmd: &str, args: &[&str]) -> Result<()> {
    println!("$ {} {}", cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run: {} {}", cmd, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "));
    }
    Ok(())
}
