//! Identity types for projects and the entities they own
//!
//! Projects carry two identities: a stable numeric [`ProjectId`] and a
//! path-like [`ProjectHandle`] (`namespace/project`) used in cross-project
//! references. Milestones carry a global [`MilestoneId`] and a per-project
//! sequential [`Iid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable numeric project identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique milestone identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneId(pub i64);

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-project sequential identifier
///
/// Only unique within one project: `%5` in project A and `%5` in project B
/// are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iid(pub u32);

impl Iid {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Iid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Iid {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdParseError::InvalidIid(s.to_string()));
        }
        s.parse::<u32>()
            .map(Iid)
            .map_err(|_| IdParseError::IidOutOfRange(s.to_string()))
    }
}

/// Path-like project handle, e.g. `gitlab-org/gitlab` or `group/sub/project`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectHandle(String);

impl ProjectHandle {
    /// Parse a handle, validating the segment grammar
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part (everything before the last `/`)
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('/').map(|(ns, _)| ns).unwrap_or("")
    }

    /// The final path segment
    pub fn path(&self) -> &str {
        self.0.rsplit_once('/').map(|(_, p)| p).unwrap_or(&self.0)
    }

    fn is_valid_segment(segment: &str) -> bool {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl fmt::Display for ProjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectHandle {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() < 2 {
            return Err(IdParseError::MissingNamespace(s.to_string()));
        }
        if !segments.iter().all(|seg| Self::is_valid_segment(seg)) {
            return Err(IdParseError::InvalidHandle(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Serialize for ProjectHandle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("invalid project handle: '{0}' (segments may contain letters, digits, '_' and '-')")]
    InvalidHandle(String),

    #[error("project handle '{0}' needs a namespace (expected 'namespace/project')")]
    MissingNamespace(String),

    #[error("invalid local id: '{0}'")]
    InvalidIid(String),

    #[error("local id out of range: '{0}'")]
    IidOutOfRange(String),
}
