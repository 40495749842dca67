use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Operating-system family a gamedata entry is keyed by.
///
/// The string form is the literal key used inside gamedata entries
/// (`"linux"` / `"windows"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Platform this binary was compiled for
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Key used to select per-platform values in gamedata entries
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Return the final component of a directory path.
///
/// Used to derive the gamedata target from a game directory such as
/// `/srv/cs2/game/csgo`. Both separators are accepted regardless of the host
/// platform. A path without any separator yields an empty string.
pub fn directory_name(path: &str) -> String {
    match path.rfind(['/', '\\']) {
        Some(pos) => path[pos + 1..].to_string(),
        None => String::new(),
    }
}
