//! Hex address and LIBRARY=VALUE argument parsing.

use anyhow::{Context, Result, anyhow};
use gamedata::ModuleTag;

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow!("Invalid hex address: {}", e))
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}

/// Split a `LIBRARY=VALUE` argument
pub fn parse_library_pair(arg: &str) -> Result<(ModuleTag, &str)> {
    let (library, value) = arg
        .split_once('=')
        .with_context(|| format!("Expected LIBRARY=VALUE, got '{}'", arg))?;
    let tag = ModuleTag::from_library(library.trim())
        .with_context(|| format!("Unknown library '{}'", library))?;
    Ok((tag, value.trim()))
}
