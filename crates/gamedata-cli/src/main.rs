mod binary;
mod cli;
mod commands;
mod hex_utils;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("gamedata={}", level).parse()?)
                .add_directive(format!("gamedata_cli={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Offsets { gamedata } => {
            let config = commands::load_config(&gamedata)?;
            commands::list::run_offsets(&config)
        }
        Command::Signatures { gamedata } => {
            let config = commands::load_config(&gamedata)?;
            commands::list::run_signatures(&config)
        }
        Command::Patches { gamedata } => {
            let config = commands::load_config(&gamedata)?;
            commands::list::run_patches(&config)
        }
        Command::Resolve {
            gamedata,
            modules,
            names,
        } => {
            let config = commands::load_config(&gamedata)?;
            let registry = commands::load_modules(&modules, config.platform())?;
            debug!("Loaded modules: {:?}", registry.loaded_tags());
            commands::resolve::run(&config, &registry, &names)
        }
        Command::Report {
            gamedata,
            modules,
            json,
        } => {
            let config = commands::load_config(&gamedata)?;
            let registry = commands::load_modules(&modules, config.platform())?;
            debug!("Loaded modules: {:?}", registry.loaded_tags());
            commands::report::run(&config, &registry, json.as_deref())
        }
        Command::Decode { pattern, max_bytes } => commands::decode::run(&pattern, max_bytes),
    }
}
