use std::collections::HashMap;

use tracing::debug;

use super::{Address, Module};
use crate::pattern::find_pattern;

/// A module backed by an in-memory copy of its image.
///
/// Addresses are `base + offset into image`. Symbols are a plain name to
/// address table supplied by whoever built the image.
#[derive(Debug, Clone)]
pub struct ImageModule {
    name: String,
    base: Address,
    image: Vec<u8>,
    symbols: HashMap<String, Address>,
    loaded: bool,
}

impl ImageModule {
    pub fn new(name: impl Into<String>, base: Address, image: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            base,
            image,
            symbols: HashMap::new(),
            loaded: true,
        }
    }

    /// A placeholder for a module that has not been mapped yet
    pub fn unloaded(name: impl Into<String>) -> Self {
        Self {
            loaded: false,
            ..Self::new(name, 0, Vec::new())
        }
    }

    /// Add a symbol at an absolute address
    pub fn with_symbol(mut self, name: impl Into<String>, address: Address) -> Self {
        self.symbols.insert(name.into(), address);
        self
    }
}

impl Module for ImageModule {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn find_pattern(&self, pattern: &[u8], wildcard: u8) -> Option<Address> {
        let offset = find_pattern(&self.image, pattern, wildcard)?;
        let address = self.base.checked_add(offset as Address)?;
        debug!(
            "{}: pattern of {} bytes found at 0x{:X} (+0x{:X})",
            self.name,
            pattern.len(),
            address,
            offset
        );
        Some(address)
    }

    fn resolve_symbol(&self, name: &str) -> Option<Address> {
        self.symbols.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::WILDCARD;

    #[test]
    fn test_find_pattern_is_relative_to_base() {
        let mut image = vec![0u8; 32];
        image[16..20].copy_from_slice(&[0x48, 0x89, 0xFF, 0x01]);
        let module = ImageModule::new("engine", 0x7000_0000, image);

        assert_eq!(
            module.find_pattern(&[0x48, 0x89, WILDCARD, 0x01], WILDCARD),
            Some(0x7000_0010)
        );
        assert_eq!(module.find_pattern(&[0x48, 0x89, 0x00, 0x01], WILDCARD), None);
    }

    #[test]
    fn test_resolve_symbol() {
        let module = ImageModule::new("server", 0, vec![]).with_symbol("MySymbol", 0x1000);
        assert_eq!(module.resolve_symbol("MySymbol"), Some(0x1000));
        assert_eq!(module.resolve_symbol("mysymbol"), None);
    }

    #[test]
    fn test_find_pattern_address_overflow() {
        let module = ImageModule::new("engine", u64::MAX, vec![0x01, 0x02]);
        assert_eq!(module.find_pattern(&[0x01], WILDCARD), Some(u64::MAX));
        assert_eq!(module.find_pattern(&[0x02], WILDCARD), None);
    }

    #[test]
    fn test_unloaded() {
        let module = ImageModule::unloaded("client");
        assert!(!module.is_loaded());
        assert!(module.find_pattern(&[0x00], WILDCARD).is_none());
    }
}
