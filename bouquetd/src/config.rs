//! Configuration file format.
//!
//! ```toml
//! [database]
//! path = "bouquetd.db"
//!
//! [logging]
//! log_dir = "logs"
//! retention_days = 7
//! level = "info"
//!
//! [[bouquet.system]]
//! source = "iptv://auto"
//! name = "Automatic IPTV"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bouquetd.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub bouquet: BouquetSection,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct DatabaseSection {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct BouquetSection {
    /// Bouquets owned by the system; created shielded at startup.
    #[serde(default)]
    pub system: Vec<SystemBouquet>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SystemBouquet {
    pub source: String,
    pub name: String,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path first, then [`DEFAULT_CONFIG_FILE`] if it exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit.map(Path::to_path_buf).or_else(|| {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            default_path.exists().then_some(default_path)
        })
    }
}
