use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::Resolver;
use crate::error::Result;
use crate::platform::Platform;

/// How a signature entry is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Symbol,
    Pattern,
    /// Missing or empty for this platform
    Missing,
}

/// Result of resolving one signature entry
#[derive(Debug, Clone, Serialize)]
pub struct SignatureOutcome {
    pub name: String,
    pub library: String,
    pub kind: SignatureKind,
    /// Resolved address in hex, when resolution succeeded
    pub address: Option<String>,
    pub error: Option<String>,
}

/// Result of decoding one patch entry
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub name: String,
    /// Decoded bytes, space separated hex
    pub bytes: Option<String>,
    pub error: Option<String>,
}

/// Every entry of a gamedata target with its resolution outcome.
///
/// Unlike [`Resolver::resolve_all`] a failing entry does not stop the report;
/// it is meant for checking a gamedata file against a build of the game.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub target: String,
    pub platform: Platform,
    pub offsets: BTreeMap<String, i32>,
    pub signatures: Vec<SignatureOutcome>,
    pub patches: Vec<PatchOutcome>,
}

impl ResolutionReport {
    pub(super) fn build(resolver: &Resolver<'_>) -> Self {
        let config = resolver.config();

        let offsets = config
            .offsets()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        let mut names: Vec<&str> = config.signatures().map(|(name, _)| name).collect();
        names.sort_unstable();
        let signatures = names
            .into_iter()
            .map(|name| {
                let kind = match config.is_symbol(name) {
                    Ok(true) => SignatureKind::Symbol,
                    Ok(false) => SignatureKind::Pattern,
                    Err(_) => SignatureKind::Missing,
                };
                let (address, error) = match resolver.resolve(name) {
                    Ok(address) => (Some(format!("0x{:X}", address)), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                SignatureOutcome {
                    name: name.to_string(),
                    library: config.library(name).unwrap_or_default().to_string(),
                    kind,
                    address,
                    error,
                }
            })
            .collect();

        let mut names: Vec<&str> = config.patches().map(|(name, _)| name).collect();
        names.sort_unstable();
        let patches = names
            .into_iter()
            .map(|name| match resolver.patch_bytes(name) {
                Ok(bytes) => PatchOutcome {
                    name: name.to_string(),
                    bytes: Some(bytes.to_hex()),
                    error: None,
                },
                Err(e) => PatchOutcome {
                    name: name.to_string(),
                    bytes: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self {
            target: config.target_id().to_string(),
            platform: config.platform(),
            offsets,
            signatures,
            patches,
        }
    }

    /// Number of signatures and patches that failed
    pub fn failure_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.error.is_some()).count()
            + self.patches.iter().filter(|p| p.error.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save report to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.to_json()?)?;
        info!("Saved resolution report to {}", path.as_ref().display());
        Ok(())
    }
}
