//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod decode;
pub mod list;
pub mod report;
pub mod resolve;

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result, bail};
use gamedata::{
    GameConfig, ImageModule, ModuleRegistry, Platform, StdFileSystem, directory_name,
};
use tracing::{info, warn};

use crate::binary::BinaryModule;
use crate::cli::{GamedataArgs, ModuleArgs};
use crate::hex_utils::{parse_hex_address, parse_library_pair};

/// Load the gamedata file named by the arguments
pub fn load_config(args: &GamedataArgs) -> Result<GameConfig> {
    let target = match (&args.target, &args.game_dir) {
        (Some(target), _) => target.clone(),
        (None, Some(game_dir)) => {
            let target = directory_name(game_dir);
            if target.is_empty() {
                bail!("Cannot derive a target from game directory '{}'", game_dir);
            }
            target
        }
        (None, None) => bail!("Either --target or --game-dir is required"),
    };

    let mut config = GameConfig::with_platform(target, &args.gamedata, args.platform);
    config
        .init(&StdFileSystem)
        .with_context(|| format!("Failed to load {}", args.gamedata.display()))?;
    Ok(config)
}

/// Build a module registry from LIBRARY=PATH and LIBRARY=ADDRESS arguments.
///
/// ELF and PE files are mapped by their segments; anything else is treated
/// as a flat memory dump starting at the load address.
pub fn load_modules(args: &ModuleArgs, platform: Platform) -> Result<ModuleRegistry> {
    let mut bases = HashMap::new();
    for arg in &args.bases {
        let (tag, value) = parse_library_pair(arg)?;
        bases.insert(tag, parse_hex_address(value)?);
    }

    let mut registry = ModuleRegistry::new(platform);
    for arg in &args.modules {
        let (tag, path) = parse_library_pair(arg)?;
        let base = bases.get(&tag).copied().unwrap_or(0);
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path))?;

        if BinaryModule::is_supported(&data) {
            let module = BinaryModule::parse(path.to_string(), data, base)?;
            info!(
                "{}: {} ({} symbols) at 0x{:X}",
                tag,
                module.name(),
                module.symbol_count(),
                base
            );
            registry.insert(tag, Box::new(module));
        } else {
            warn!(
                "{}: {} is not an ELF or PE image, scanning it as a raw dump",
                tag, path
            );
            registry.insert(tag, Box::new(ImageModule::new(tag.as_str(), base, data)));
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamedata::{ModuleTag, Resolver};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const GAMEDATA: &str = r#""Games"
{
    "csgo"
    {
        "Offsets"
        {
            "Teleport" { "linux" "119" "windows" "118" }
        }
        "Signatures"
        {
            "Marker"
            {
                "library" "server"
                "linux" "\xDE\xAD\x2A\xEF"
            }
        }
    }
}
"#;

    fn gamedata_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(GAMEDATA.as_bytes()).unwrap();
        file
    }

    fn gamedata_args(path: PathBuf, target: Option<&str>, game_dir: Option<&str>) -> GamedataArgs {
        GamedataArgs {
            gamedata: path,
            target: target.map(str::to_string),
            game_dir: game_dir.map(str::to_string),
            platform: Platform::Linux,
        }
    }

    #[test]
    fn test_load_config_by_target() {
        let file = gamedata_file();
        let args = gamedata_args(file.path().to_path_buf(), Some("csgo"), None);
        let config = load_config(&args).unwrap();
        assert_eq!(config.offset("Teleport"), 119);
    }

    #[test]
    fn test_load_config_by_game_dir() {
        let file = gamedata_file();
        let args = gamedata_args(file.path().to_path_buf(), None, Some("/srv/game/csgo"));
        let config = load_config(&args).unwrap();
        assert_eq!(config.target_id(), "csgo");

        let args = gamedata_args(file.path().to_path_buf(), None, Some("csgo"));
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_load_config_unknown_target() {
        let file = gamedata_file();
        let args = gamedata_args(file.path().to_path_buf(), Some("dota"), None);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_load_modules_raw_dump() {
        let file = gamedata_file();
        let config = load_config(&gamedata_args(
            file.path().to_path_buf(),
            Some("csgo"),
            None,
        ))
        .unwrap();

        let mut dump = NamedTempFile::new().unwrap();
        dump.write_all(&[0x00, 0x00, 0xDE, 0xAD, 0x77, 0xEF]).unwrap();

        let args = ModuleArgs {
            modules: vec![format!("server={}", dump.path().display())],
            bases: vec!["server=0x10000".to_string()],
        };
        let registry = load_modules(&args, Platform::Linux).unwrap();
        assert_eq!(registry.loaded_tags(), vec![ModuleTag::Server]);

        let resolver = Resolver::new(&config, &registry);
        assert_eq!(resolver.resolve("Marker").unwrap(), 0x10002);
    }

    #[test]
    fn test_load_modules_missing_file() {
        let args = ModuleArgs {
            modules: vec!["server=/nonexistent/libserver.so".to_string()],
            bases: vec![],
        };
        assert!(load_modules(&args, Platform::Linux).is_err());
    }
}
