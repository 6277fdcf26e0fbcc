//! Projects that own referenceable entities

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::identity::{ProjectHandle, ProjectId};

/// A project as seen by the reference engine
///
/// Owned by the project store; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub handle: ProjectHandle,
    /// Display name (defaults to the last handle segment)
    #[serde(default)]
    pub name: String,
}

impl Project {
    pub fn new(id: ProjectId, handle: ProjectHandle) -> Self {
        let name = handle.path().to_string();
        Self { id, handle, name }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name to show in output, falling back to the handle path
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.handle.path()
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_from_handle() {
        let project = Project::new(ProjectId(3), ProjectHandle::parse("acme/rocket").unwrap());
        assert_eq!(project.name, "rocket");
        assert_eq!(project.display_name(), "rocket");
        assert_eq!(project.to_string(), "acme/rocket");
    }

    #[test]
    fn test_deserialize_without_name() {
        let project: Project = serde_yml::from_str("id: 1\nhandle: acme/rocket\n").unwrap();
        assert_eq!(project.name, "");
        assert_eq!(project.display_name(), "rocket");
    }
}
