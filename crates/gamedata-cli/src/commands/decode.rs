//! Decode command implementation.

use anyhow::{Context, Result};
use gamedata::{decode_pattern, hex_to_bytes};

/// Run the decode command
pub fn run(pattern: &str, max_bytes: Option<usize>) -> Result<()> {
    let decoded = match max_bytes {
        Some(max_bytes) => decode_pattern(pattern, max_bytes),
        None => hex_to_bytes(pattern),
    }
    .with_context(|| format!("Failed to decode '{}'", pattern))?;

    println!("Bytes:     {}", decoded);
    println!("Length:    {}", decoded.len());
    println!("Wildcards: {}", decoded.wildcard_count());

    Ok(())
}
