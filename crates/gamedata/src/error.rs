use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to find game: {0}")]
    TargetNotFound(String),

    #[error("Failed to load gamedata file {path}: {message}")]
    DocumentLoadFailed { path: PathBuf, message: String },

    #[error("Syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid module for {0}")]
    ModuleNotLoaded(String),

    #[error("Missing signature or symbol for {0}")]
    MissingSignature(String),

    #[error("Missing symbol for {0}")]
    MissingSymbol(String),

    #[error("Missing patch for {0}")]
    MissingPatch(String),

    #[error("Symbol '{symbol}' not exported by module for {name}")]
    SymbolNotFound { name: String, symbol: String },

    #[error("Invalid hex pattern: {0}")]
    MalformedPattern(String),

    #[error("Failed to find address for {0}")]
    PatternNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
