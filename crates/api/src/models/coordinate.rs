use crate::error::{StubError, StubResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A Maven dependency coordinate: `group:artifact:version`.
///
/// Trailing segments after the version (classifier, packaging) are accepted
/// and kept in the raw string so it can be handed back to the resolver
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    raw: String,
    group: String,
    artifact: String,
    version: String,
}

impl Coordinate {
    pub fn parse(raw: &str) -> StubResult<Self> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() < 3 || parts.len() > 5 || parts.iter().any(|p| p.is_empty()) {
            return Err(StubError::InvalidCoordinate(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Relative path of the main jar inside a Maven repository layout.
    pub fn repository_path(&self) -> std::path::PathBuf {
        let mut path: std::path::PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        path.push(format!("{}-{}.jar", self.artifact, self.version));
        path
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Coordinate {
    type Err = StubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = StubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.raw
    }
}
