//! # gamedata
//!
//! Data-driven address resolution for plugins hosted inside a game process.
//!
//! This crate provides:
//! - A KeyValues document parser for gamedata files
//! - A per-target, per-platform store of offsets, signatures and patches
//! - Escaped-hex pattern decoding and wildcard pattern scanning
//! - Symbol and signature resolution against the loaded modules
//!
//! ## Example
//!
//! ```ignore
//! use gamedata::{GameConfig, ModuleRegistry, Platform, Resolver, StdFileSystem};
//!
//! let mut config = GameConfig::new("csgo", "gamedata/plugin.games.txt");
//! config.init(&StdFileSystem)?;
//!
//! let mut modules = ModuleRegistry::new(Platform::current());
//! // host registers its loaded modules here
//!
//! let resolver = Resolver::new(&config, &modules);
//! let client_print_all = resolver.resolve("UTIL_ClientPrintAll")?;
//! let teleport = config.offset("Teleport");
//! ```

pub mod config;
pub mod error;
pub mod keyvalues;
pub mod module;
pub mod pattern;
pub mod platform;
pub mod resolver;

pub use config::{FileSystem, GameConfig, OFFSET_UNSET, SYMBOL_PREFIX, StdFileSystem};
pub use error::{Error, Result};
pub use keyvalues::KeyValues;
pub use module::{Address, ImageModule, Module, ModuleRegistry, ModuleSlot, ModuleTag};
pub use pattern::{BytePattern, WILDCARD, decode_pattern, find_pattern, hex_to_bytes};
pub use platform::{Platform, directory_name};
pub use resolver::{
    PatchOutcome, ResolutionReport, Resolver, SignatureKind, SignatureOutcome,
};
