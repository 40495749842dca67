//! Loaded modules and the registry the resolver looks them up in
//!
//! Loading and mapping binaries is the host's job. This module only defines
//! the capability the resolver needs from a loaded module ([`Module`]) and the
//! fixed set of library roles a gamedata entry can name ([`ModuleTag`]).

mod image;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::{debug, warn};

use crate::config::GameConfig;
use crate::platform::Platform;

pub use image::ImageModule;

/// Absolute address inside the process
pub type Address = u64;

/// A module mapped into the process
pub trait Module {
    /// Whether the module is resident and can be queried
    fn is_loaded(&self) -> bool;

    /// Address of the lowest occurrence of `pattern` in the module image.
    ///
    /// Pattern bytes equal to `wildcard` match any byte.
    fn find_pattern(&self, pattern: &[u8], wildcard: u8) -> Option<Address>;

    /// Address of the dynamic symbol or export `name`
    fn resolve_symbol(&self, name: &str) -> Option<Address>;
}

/// Library role a gamedata entry can be hosted in.
///
/// The string form is the `"library"` value used in gamedata files.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModuleTag {
    Engine,
    Server,
    Client,
    Vscript,
    /// Low-level runtime library
    Tier0,
    /// Map editor, shipped on Windows only
    Hammer,
}

impl ModuleTag {
    /// Parse a `"library"` value; matching is exact, as in gamedata files
    pub fn from_library(library: &str) -> Option<Self> {
        library.parse().ok()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Whether this library exists on `platform`
    pub fn is_available_on(&self, platform: Platform) -> bool {
        match self {
            Self::Hammer => platform == Platform::Windows,
            _ => true,
        }
    }

    /// All tags available on `platform`
    pub fn available_on(platform: Platform) -> impl Iterator<Item = ModuleTag> {
        Self::iter().filter(move |tag| tag.is_available_on(platform))
    }
}

/// A registry slot for one library role.
///
/// The slot exists for every tag the platform knows about; the module in it
/// may be missing or not yet loaded.
#[derive(Clone, Copy)]
pub struct ModuleSlot<'a> {
    tag: ModuleTag,
    module: Option<&'a dyn Module>,
}

impl<'a> ModuleSlot<'a> {
    pub fn tag(&self) -> ModuleTag {
        self.tag
    }

    /// The module in this slot if it is present and loaded
    pub fn module(&self) -> Option<&'a dyn Module> {
        self.module.filter(|module| module.is_loaded())
    }

    pub fn is_loaded(&self) -> bool {
        self.module().is_some()
    }
}

impl std::fmt::Debug for ModuleSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSlot")
            .field("tag", &self.tag)
            .field("present", &self.module.is_some())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Named set of loaded modules for one platform
pub struct ModuleRegistry {
    platform: Platform,
    modules: HashMap<ModuleTag, Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            modules: HashMap::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Place `module` in the slot for `tag`, returning the module it replaces
    pub fn insert(&mut self, tag: ModuleTag, module: Box<dyn Module>) -> Option<Box<dyn Module>> {
        if !tag.is_available_on(self.platform) {
            warn!(
                "Module '{}' is not available on {}, it will never be resolved",
                tag, self.platform
            );
        }
        debug!("Registered module '{}'", tag);
        self.modules.insert(tag, module)
    }

    pub fn remove(&mut self, tag: ModuleTag) -> Option<Box<dyn Module>> {
        self.modules.remove(&tag)
    }

    /// Slot for `tag`, or `None` when the tag does not exist on this platform
    pub fn slot(&self, tag: ModuleTag) -> Option<ModuleSlot<'_>> {
        if !tag.is_available_on(self.platform) {
            return None;
        }
        Some(ModuleSlot {
            tag,
            module: self.modules.get(&tag).map(|m| m.as_ref()),
        })
    }

    /// Loaded module for `tag`
    pub fn get(&self, tag: ModuleTag) -> Option<&dyn Module> {
        self.slot(tag)?.module()
    }

    /// Slot hosting the gamedata entry `name`.
    ///
    /// `None` when the entry has no library, the library is unknown, or the
    /// library does not exist on this platform.
    pub fn slot_for(&self, config: &GameConfig, name: &str) -> Option<ModuleSlot<'_>> {
        let tag = config.module_tag(name)?;
        self.slot(tag)
    }

    /// Tags whose slot currently holds a loaded module
    pub fn loaded_tags(&self) -> Vec<ModuleTag> {
        let mut tags: Vec<ModuleTag> = ModuleTag::available_on(self.platform)
            .filter(|tag| self.get(*tag).is_some())
            .collect();
        tags.sort();
        tags
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("platform", &self.platform)
            .field("loaded", &self.loaded_tags())
            .finish()
    }
}
