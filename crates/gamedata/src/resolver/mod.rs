//! Address resolution for gamedata entries
//!
//! A signature entry is either a symbol reference (`@Name`), resolved through
//! the owning module's dynamic symbol table, or an escaped-hex byte pattern,
//! resolved by scanning the owning module's image. Nothing is cached: every
//! call resolves from scratch.

mod report;

use std::collections::BTreeMap;

use tracing::{debug, error};

use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::module::{Address, Module, ModuleRegistry};
use crate::pattern::{BytePattern, WILDCARD, hex_to_bytes};

pub use report::{PatchOutcome, ResolutionReport, SignatureKind, SignatureOutcome};

pub struct Resolver<'a> {
    config: &'a GameConfig,
    modules: &'a ModuleRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a GameConfig, modules: &'a ModuleRegistry) -> Self {
        if config.platform() != modules.platform() {
            debug!(
                "Gamedata platform {} differs from module registry platform {}",
                config.platform(),
                modules.platform()
            );
        }
        Self { config, modules }
    }

    pub fn config(&self) -> &'a GameConfig {
        self.config
    }

    /// Loaded module hosting `name`
    fn module_for(&self, name: &str) -> Result<&'a dyn Module> {
        self.modules
            .slot_for(self.config, name)
            .and_then(|slot| slot.module())
            .ok_or_else(|| Error::ModuleNotLoaded(name.to_string()))
    }

    /// Resolve the signature entry `name` to an address.
    ///
    /// Fails with the first error encountered: the owning module is unknown or
    /// not loaded, the entry has no signature, the symbol is empty or not
    /// exported, the pattern is malformed, or the pattern does not occur.
    pub fn resolve(&self, name: &str) -> Result<Address> {
        let module = self.module_for(name)?;

        let address = if self.config.is_symbol(name)? {
            let symbol = self.config.symbol(name)?;
            module
                .resolve_symbol(symbol)
                .ok_or_else(|| Error::SymbolNotFound {
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                })?
        } else {
            let signature = self
                .config
                .signature(name)
                .ok_or_else(|| Error::MissingSignature(name.to_string()))?;
            let pattern = hex_to_bytes(signature)?;
            module
                .find_pattern(pattern.as_bytes(), WILDCARD)
                .ok_or_else(|| Error::PatternNotFound(name.to_string()))?
        };

        debug!("Resolved {} to 0x{:X}", name, address);
        Ok(address)
    }

    /// Resolve `name`, logging the failure and returning `None` on error
    pub fn resolve_signature(&self, name: &str) -> Option<Address> {
        match self.resolve(name) {
            Ok(address) => Some(address),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Resolve every name in `names`, stopping at the first failure
    pub fn resolve_all<I, S>(&self, names: I) -> Result<BTreeMap<String, Address>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolved = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let address = self.resolve(name).inspect_err(|e| error!("{}", e))?;
            resolved.insert(name.to_string(), address);
        }
        Ok(resolved)
    }

    /// Decoded bytes of the patch entry `name`
    pub fn patch_bytes(&self, name: &str) -> Result<BytePattern> {
        let raw = self
            .config
            .patch(name)
            .ok_or_else(|| Error::MissingPatch(name.to_string()))?;
        hex_to_bytes(raw)
    }

    /// Resolve every signature and decode every patch, recording each outcome
    pub fn report(&self) -> ResolutionReport {
        ResolutionReport::build(self)
    }
}
