//! Version types for data-format compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// The string did not have two or three dot-separated parts.
    #[error("expected MAJOR.MINOR[.PATCH], got {0:?}")]
    Shape(String),
    /// One of the parts was not a number.
    #[error("invalid version component {0:?}")]
    Component(String),
}

/// Format version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current simulation scenario file format.
    pub const SCENARIO: Self = Self::new(1, 0, 0);

    /// Current JSON layout of effect snapshots handed to UI consumers.
    pub const EFFECT_SNAPSHOT: Self = Self::new(1, 0, 0);

    /// Current JSON layout of simulation reports.
    pub const SIM_REPORT: Self = Self::new(1, 0, 0);

    /// Whether a reader at this version can load data written at `data`.
    ///
    /// Same major version, and the data's minor version is not newer.
    #[must_use]
    pub const fn can_read(&self, data: &Self) -> bool {
        self.major == data.major && self.minor >= data.minor
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionParseError::Shape(s.to_string()));
        }

        let parse = |part: &str| {
            part.parse::<u16>()
                .map_err(|_| VersionParseError::Component(part.to_string()))
        };

        let major = parse(parts[0])?;
        let minor = parse(parts[1])?;
        let patch = match parts.get(2) {
            Some(p) => parse(p)?,
            None => 0,
        };
        Ok(Self::new(major, minor, patch))
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}
