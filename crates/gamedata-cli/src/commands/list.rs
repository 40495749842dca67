//! Offsets, signatures and patches listings.

use anyhow::Result;
use gamedata::{GameConfig, OFFSET_UNSET, hex_to_bytes};
use owo_colors::OwoColorize;

fn print_header(config: &GameConfig, table: &str, count: usize) {
    println!(
        "=== {} for {} ({}) ===",
        table,
        config.target_id().bold(),
        config.platform()
    );
    println!("{} entries", count);
    println!();
}

/// Run the offsets command
pub fn run_offsets(config: &GameConfig) -> Result<()> {
    let mut offsets: Vec<(&str, i32)> = config.offsets().collect();
    offsets.sort_unstable_by_key(|(name, _)| *name);

    print_header(config, "Offsets", offsets.len());
    for (name, value) in offsets {
        if value == OFFSET_UNSET {
            println!("  {:<40} {}", name, "unset".dimmed());
        } else {
            println!("  {:<40} {} (0x{:X})", name, value, value);
        }
    }

    Ok(())
}

/// Run the signatures command
pub fn run_signatures(config: &GameConfig) -> Result<()> {
    let mut signatures: Vec<(&str, &str)> = config.signatures().collect();
    signatures.sort_unstable_by_key(|(name, _)| *name);

    print_header(config, "Signatures", signatures.len());
    for (name, raw) in signatures {
        let library = config.library(name).unwrap_or("?");
        let form = match config.is_symbol(name) {
            Ok(true) => "symbol".cyan().to_string(),
            Ok(false) => "pattern".yellow().to_string(),
            Err(_) => "missing".red().to_string(),
        };
        println!("  {:<40} {:<10} {:<8} {}", name, library, form, raw);
    }

    Ok(())
}

/// Run the patches command
pub fn run_patches(config: &GameConfig) -> Result<()> {
    let mut patches: Vec<(&str, &str)> = config.patches().collect();
    patches.sort_unstable_by_key(|(name, _)| *name);

    print_header(config, "Patches", patches.len());
    for (name, raw) in patches {
        match hex_to_bytes(raw) {
            Ok(bytes) => println!("  {:<40} {} ({} bytes)", name, bytes.to_hex(), bytes.len()),
            Err(e) => println!("  {:<40} {}", name, e.red()),
        }
    }

    Ok(())
}
