//! Report command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use gamedata::{GameConfig, ModuleRegistry, Resolver, SignatureKind};
use owo_colors::OwoColorize;
use tracing::info;

/// Run the report command
pub fn run(config: &GameConfig, modules: &ModuleRegistry, json: Option<&Path>) -> Result<()> {
    let report = Resolver::new(config, modules).report();

    println!("=== Report for {} ({}) ===", report.target.bold(), report.platform);
    println!("Offsets:    {}", report.offsets.len());
    println!("Signatures: {}", report.signatures.len());
    println!("Patches:    {}", report.patches.len());
    println!();

    for outcome in &report.signatures {
        let kind = match outcome.kind {
            SignatureKind::Symbol => "symbol",
            SignatureKind::Pattern => "pattern",
            SignatureKind::Missing => "missing",
        };
        match (&outcome.address, &outcome.error) {
            (Some(address), _) => println!(
                "  {} {:<40} {:<10} {:<8} {}",
                "ok".green(),
                outcome.name,
                outcome.library,
                kind,
                address
            ),
            (None, error) => println!(
                "  {} {:<40} {:<10} {:<8} {}",
                "!!".red(),
                outcome.name,
                outcome.library,
                kind,
                error.as_deref().unwrap_or_default().red()
            ),
        }
    }

    for outcome in &report.patches {
        if let Some(error) = &outcome.error {
            println!("  {} {:<40} {}", "!!".red(), outcome.name, error.red());
        }
    }

    println!();
    if report.is_complete() {
        println!("{}", "All entries resolved".green());
    } else {
        println!("{} failing entries", report.failure_count().to_string().red());
    }

    if let Some(path) = json {
        report
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
