//! Run configuration: an optional TOML file overridden by command-line
//! options.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_MACHINE: &str = "apple2e";
pub const DEFAULT_CYCLES: u64 = 1_000_000;
pub const DEFAULT_SPEED: u32 = 100;
pub const DEFAULT_GRANULARITY: u64 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no ROM path given (use --rom or [machine] rom in the config file)")]
    MissingRom,
}

/// On-disk layout of `config.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub machine: MachineSection,
    pub run: RunSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MachineSection {
    pub name: Option<String>,
    pub rom: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Emulated CPU cycles; 0 runs until stopped.
    pub cycles: Option<u64>,
    /// Percent of real time; 0 disables pacing.
    pub speed: Option<u32>,
    pub granularity: Option<u64>,
}

impl ConfigFile {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// `<config_dir>/orchard/config.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orchard").join("config.toml"))
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub machine: String,
    pub rom: PathBuf,
    pub cycles: u64,
    pub speed: u32,
    pub granularity: u64,
}

impl Settings {
    /// Command-line values win over the file, the file over defaults.
    pub fn resolve(cli: &Cli, file: ConfigFile) -> Result<Self, ConfigError> {
        let rom = cli
            .rom
            .clone()
            .or(file.machine.rom)
            .ok_or(ConfigError::MissingRom)?;
        Ok(Self {
            machine: cli
                .machine
                .clone()
                .or(file.machine.name)
                .unwrap_or_else(|| DEFAULT_MACHINE.to_string()),
            rom,
            cycles: cli.cycles.or(file.run.cycles).unwrap_or(DEFAULT_CYCLES),
            speed: cli.speed.or(file.run.speed).unwrap_or(DEFAULT_SPEED),
            granularity: cli
                .granularity
                .or(file.run.granularity)
                .unwrap_or(DEFAULT_GRANULARITY),
        })
    }
}
