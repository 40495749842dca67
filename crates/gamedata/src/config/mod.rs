//! Gamedata store
//!
//! Holds the offsets, signatures, patches and owning libraries declared for
//! one game target on one platform. Tables are filled once by
//! [`GameConfig::init`] and only read afterwards.

mod fs;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::keyvalues::KeyValues;
use crate::module::ModuleTag;
use crate::platform::{Platform, directory_name};

pub use fs::{FileSystem, StdFileSystem};

/// Value returned by [`GameConfig::offset`] for missing or unset offsets
pub const OFFSET_UNSET: i32 = -1;

/// First character of a signature that names a symbol instead of a byte pattern
pub const SYMBOL_PREFIX: char = '@';

const OFFSETS_SECTION: &str = "Offsets";
const SIGNATURES_SECTION: &str = "Signatures";
const PATCHES_SECTION: &str = "Patches";
const LIBRARY_KEY: &str = "library";

#[derive(Debug, Clone)]
pub struct GameConfig {
    target_id: String,
    path: PathBuf,
    platform: Platform,
    document: Option<KeyValues>,
    offsets: HashMap<String, i32>,
    signatures: HashMap<String, String>,
    libraries: HashMap<String, String>,
    patches: HashMap<String, String>,
}

/// Tables read out of a target section
#[derive(Default)]
struct Tables {
    offsets: HashMap<String, i32>,
    signatures: HashMap<String, String>,
    libraries: HashMap<String, String>,
    patches: HashMap<String, String>,
}

impl GameConfig {
    /// Create an empty store for `target_id` on the host platform
    pub fn new(target_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_platform(target_id, path, Platform::current())
    }

    pub fn with_platform(
        target_id: impl Into<String>,
        path: impl Into<PathBuf>,
        platform: Platform,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            path: path.into(),
            platform,
            document: None,
            offsets: HashMap::new(),
            signatures: HashMap::new(),
            libraries: HashMap::new(),
            patches: HashMap::new(),
        }
    }

    /// Create a store whose target is the last component of `game_dir`
    pub fn from_game_dir(game_dir: &str, path: impl Into<PathBuf>) -> Self {
        Self::new(directory_name(game_dir), path)
    }

    /// Read and load the gamedata document through `fs`.
    ///
    /// Unreadable or syntactically broken files fail with
    /// [`Error::DocumentLoadFailed`]; a document without a section for the
    /// target fails with [`Error::TargetNotFound`].
    pub fn init<F: FileSystem>(&mut self, fs: &F) -> Result<()> {
        let text = fs
            .read_to_string(&self.path)
            .map_err(|e| self.load_failed(e.to_string()))?;
        let document = KeyValues::parse(&text).map_err(|e| self.load_failed(e.to_string()))?;
        self.load_document(document)
    }

    /// Populate the tables from an already parsed document.
    ///
    /// Replaces every table wholesale; on failure the previous tables are
    /// left untouched.
    pub fn load_document(&mut self, document: KeyValues) -> Result<()> {
        let Some(game) = document.find_key(&self.target_id) else {
            error!("Failed to find game: {}", self.target_id);
            return Err(Error::TargetNotFound(self.target_id.clone()));
        };

        let tables = read_tables(game, self.platform);
        info!(
            "Loaded gamedata for {} ({}): {} offsets, {} signatures, {} patches",
            self.target_id,
            self.platform,
            tables.offsets.len(),
            tables.signatures.len(),
            tables.patches.len()
        );

        self.offsets = tables.offsets;
        self.signatures = tables.signatures;
        self.libraries = tables.libraries;
        self.patches = tables.patches;
        self.document = Some(document);
        Ok(())
    }

    fn load_failed(&self, message: String) -> Error {
        error!("Failed to load gamedata file {}: {}", self.path.display(), message);
        Error::DocumentLoadFailed {
            path: self.path.clone(),
            message,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The loaded document, if `init` has succeeded
    pub fn document(&self) -> Option<&KeyValues> {
        self.document.as_ref()
    }

    /// Offset for `name`, or [`OFFSET_UNSET`] when missing or unset for this platform
    pub fn offset(&self, name: &str) -> i32 {
        self.offsets.get(name).copied().unwrap_or(OFFSET_UNSET)
    }

    /// Offset for `name`, `None` when missing or unset for this platform
    pub fn try_offset(&self, name: &str) -> Option<i32> {
        self.offsets
            .get(name)
            .copied()
            .filter(|&value| value != OFFSET_UNSET)
    }

    pub fn signature(&self, name: &str) -> Option<&str> {
        self.signatures.get(name).map(String::as_str)
    }

    pub fn patch(&self, name: &str) -> Option<&str> {
        self.patches.get(name).map(String::as_str)
    }

    pub fn library(&self, name: &str) -> Option<&str> {
        self.libraries.get(name).map(String::as_str)
    }

    /// Library of `name` parsed as a module tag
    pub fn module_tag(&self, name: &str) -> Option<ModuleTag> {
        let library = self.library(name)?;
        let tag = ModuleTag::from_library(library);
        if tag.is_none() {
            debug!("Unknown library '{}' for {}", library, name);
        }
        tag
    }

    /// Whether the signature for `name` is a symbol reference.
    ///
    /// A missing or empty signature is an error, not `false`.
    pub fn is_symbol(&self, name: &str) -> Result<bool> {
        match self.signature(name) {
            Some(sig) if !sig.is_empty() => Ok(sig.starts_with(SYMBOL_PREFIX)),
            _ => {
                debug!("Missing signature or symbol for {}", name);
                Err(Error::MissingSignature(name.to_string()))
            }
        }
    }

    /// Symbol name referenced by `name`, without the prefix.
    ///
    /// Fails with [`Error::MissingSymbol`] if the entry is missing, is not a
    /// symbol reference, or names nothing after the prefix.
    pub fn symbol(&self, name: &str) -> Result<&str> {
        match self
            .signature(name)
            .and_then(|sig| sig.strip_prefix(SYMBOL_PREFIX))
        {
            Some(symbol) if !symbol.is_empty() => Ok(symbol),
            _ => {
                debug!("Missing symbol for {}", name);
                Err(Error::MissingSymbol(name.to_string()))
            }
        }
    }

    /// Offsets in arbitrary order
    pub fn offsets(&self) -> impl Iterator<Item = (&str, i32)> {
        self.offsets.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Signature names with their raw text, in arbitrary order
    pub fn signatures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.signatures
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Patch names with their raw text, in arbitrary order
    pub fn patches(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patches.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn read_tables(game: &KeyValues, platform: Platform) -> Tables {
    let key = platform.key();
    let mut tables = Tables::default();

    if let Some(offsets) = game.find_key(OFFSETS_SECTION) {
        for entry in offsets.children() {
            tables
                .offsets
                .insert(entry.name().to_string(), entry.get_int(key, OFFSET_UNSET));
        }
    }

    if let Some(signatures) = game.find_key(SIGNATURES_SECTION) {
        for entry in signatures.children() {
            let name = entry.name().to_string();
            tables.libraries.insert(
                name.clone(),
                entry.get_string(LIBRARY_KEY).unwrap_or_default().to_string(),
            );
            tables
                .signatures
                .insert(name, entry.get_string(key).unwrap_or_default().to_string());
        }
    }

    if let Some(patches) = game.find_key(PATCHES_SECTION) {
        for entry in patches.children() {
            tables.patches.insert(
                entry.name().to_string(),
                entry.get_string(key).unwrap_or_default().to_string(),
            );
        }
    }

    tables
}
