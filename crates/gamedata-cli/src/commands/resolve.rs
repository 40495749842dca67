//! Resolve command implementation.

use anyhow::{Result, bail};
use gamedata::{GameConfig, ModuleRegistry, Resolver};
use owo_colors::OwoColorize;

use crate::hex_utils::format_hex_address;

/// Run the resolve command
pub fn run(config: &GameConfig, modules: &ModuleRegistry, names: &[String]) -> Result<()> {
    let resolver = Resolver::new(config, modules);

    let mut failed = 0;
    for name in names {
        match resolver.resolve(name) {
            Ok(address) => {
                println!("{:<40} {}", name, format_hex_address(address).green());
            }
            Err(e) => {
                failed += 1;
                println!("{:<40} {}", name, e.red());
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} entries failed to resolve", failed, names.len());
    }
    Ok(())
}
