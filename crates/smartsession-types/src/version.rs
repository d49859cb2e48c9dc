//! Protocol versions of the deployed smart-session stack.
//!
//! Each version pins a set of contract addresses (see [`crate::constants`]).
//! Versions are totally ordered; migrating an account walks the versions
//! between its current one and the target in that order.
//!
//! # Examples
//!
//! ```
//! use smartsession_types::ProtocolVersion;
//!
//! let version: ProtocolVersion = "1.2.0".parse().unwrap();
//! assert_eq!(version, ProtocolVersion::V1_2_0);
//! assert_eq!(version.to_string(), "1.2.0");
//! assert_eq!(ProtocolVersion::default(), ProtocolVersion::V1_1_0);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

/// A released version of the smart-session contract set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ProtocolVersion {
    /// Initial release.
    V1_0_0,
    /// Default for new accounts.
    #[default]
    V1_1_0,
    /// Rhinestone v2 account implementation and redeployed smart-sessions module.
    V1_2_0,
}

impl ProtocolVersion {
    /// All known versions, oldest first.
    pub const ALL: [ProtocolVersion; 3] = [
        ProtocolVersion::V1_0_0,
        ProtocolVersion::V1_1_0,
        ProtocolVersion::V1_2_0,
    ];

    /// Returns the dotted version string, e.g. `"1.1.0"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V1_0_0 => "1.0.0",
            ProtocolVersion::V1_1_0 => "1.1.0",
            ProtocolVersion::V1_2_0 => "1.2.0",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ProtocolVersion::V1_0_0 => 0,
            ProtocolVersion::V1_1_0 => 1,
            ProtocolVersion::V1_2_0 => 2,
        }
    }

    /// Whether an account on `self` is behind `target`.
    pub fn needs_migration(self, target: ProtocolVersion) -> bool {
        self < target
    }

    /// Versions an account has to pass through to get from `self` to `target`,
    /// excluding `self` and including `target`. Empty when no migration is needed.
    pub fn migration_path(self, target: ProtocolVersion) -> Vec<ProtocolVersion> {
        Self::ALL
            .into_iter()
            .filter(|version| *version > self && *version <= target)
            .collect()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown protocol version string.
#[derive(Debug, thiserror::Error)]
#[error("Unknown protocol version {0}")]
pub struct VersionParseError(String);

impl FromStr for ProtocolVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('v') {
            "1.0.0" => Ok(ProtocolVersion::V1_0_0),
            "1.1.0" => Ok(ProtocolVersion::V1_1_0),
            "1.2.0" => Ok(ProtocolVersion::V1_2_0),
            _ => Err(VersionParseError(s.into())),
        }
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProtocolVersion::from_str(&s).map_err(de::Error::custom)
    }
}
