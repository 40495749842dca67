//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gamedata::Platform;

#[derive(Parser)]
#[command(name = "gamedata")]
#[command(about = "Inspect gamedata files and resolve their entries against module images")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List offsets for the target and platform
    Offsets {
        #[command(flatten)]
        gamedata: GamedataArgs,
    },
    /// List signatures with their library and form
    Signatures {
        #[command(flatten)]
        gamedata: GamedataArgs,
    },
    /// List patches with their decoded bytes
    Patches {
        #[command(flatten)]
        gamedata: GamedataArgs,
    },
    /// Resolve signature entries against module images
    Resolve {
        #[command(flatten)]
        gamedata: GamedataArgs,

        #[command(flatten)]
        modules: ModuleArgs,

        /// Entries to resolve
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Resolve every signature and decode every patch
    Report {
        #[command(flatten)]
        gamedata: GamedataArgs,

        #[command(flatten)]
        modules: ModuleArgs,

        /// Write the report as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Decode an escaped-hex pattern such as \x48\x89\x2A
    Decode {
        /// Pattern text
        pattern: String,

        /// Maximum number of decoded bytes
        #[arg(long)]
        max_bytes: Option<usize>,
    },
}

/// Which gamedata file, target and platform to load
#[derive(Args, Clone)]
pub struct GamedataArgs {
    /// Gamedata file
    #[arg(short, long)]
    pub gamedata: PathBuf,

    /// Target section (game directory name)
    #[arg(short, long, required_unless_present = "game_dir")]
    pub target: Option<String>,

    /// Game directory; its last component is used as the target
    #[arg(long, conflicts_with = "target")]
    pub game_dir: Option<String>,

    /// Platform whose values are read
    #[arg(short, long, default_value_t = Platform::current())]
    pub platform: Platform,
}

/// Module images to resolve against
#[derive(Args, Clone)]
pub struct ModuleArgs {
    /// Module image as LIBRARY=PATH (e.g. server=bin/libserver.so), repeatable
    #[arg(short, long = "module", value_name = "LIBRARY=PATH")]
    pub modules: Vec<String>,

    /// Load address as LIBRARY=ADDRESS (hex), repeatable
    #[arg(short, long = "base", value_name = "LIBRARY=ADDRESS")]
    pub bases: Vec<String>,
}
