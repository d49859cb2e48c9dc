//! JSON configuration.
//!
//! ```json
//! {
//!   "version": "1.2.0",
//!   "chains": {
//!     "8453": { "rpc": "https://mainnet.base.org" }
//!   },
//!   "constants": {
//!     "1.2.0": { "smartSessions": "0x...", "...": "..." }
//!   }
//! }
//! ```
//!
//! Every section is optional. A missing file yields the default configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

use crate::constants::{ConstantsTable, ProtocolConstants};
use crate::version::ProtocolVersion;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Connection settings for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc: Url,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    version: ProtocolVersion,
    #[serde(default)]
    chains: HashMap<u64, ChainConfig>,
    #[serde(default)]
    constants: HashMap<ProtocolVersion, ProtocolConstants>,
}

impl Config {
    /// Reads the config from `path`. A file that does not exist is not an error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Self::from_json(&raw).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn chains(&self) -> &HashMap<u64, ChainConfig> {
        &self.chains
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// The built-in constants table with this config's overrides applied.
    pub fn constants_table(&self) -> ConstantsTable {
        ConstantsTable::builtin().with_overrides(self.constants.clone())
    }
}
