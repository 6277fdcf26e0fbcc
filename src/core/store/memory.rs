//! In-process store, built in code or loaded from a YAML fixture
//!
//! Fixture shape:
//!
//! ```yaml
//! projects:
//!   - id: 1
//!     handle: acme/web
//!     name: Web
//!     milestones:
//!       - { id: 10, iid: 5, title: Beta, state: active, due_date: 2024-03-01 }
//! ```

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use super::{EntityStore, ProjectStore, StoreError};
use crate::core::identity::{Iid, MilestoneId, ProjectHandle, ProjectId};
use crate::core::project::Project;
use crate::entities::milestone::{Milestone, MilestoneState};
use crate::yaml::{load_yaml, parse_yaml, YamlError};

/// Store holding projects and milestones in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// Projects keyed by handle
    projects: BTreeMap<String, Project>,
    milestones: HashMap<(ProjectId, Iid), Milestone>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    projects: Vec<FixtureProject>,
}

#[derive(Debug, Deserialize)]
struct FixtureProject {
    id: ProjectId,
    handle: ProjectHandle,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    milestones: Vec<FixtureMilestone>,
}

#[derive(Debug, Deserialize)]
struct FixtureMilestone {
    id: MilestoneId,
    iid: Iid,
    title: String,
    #[serde(default)]
    state: MilestoneState,
    #[serde(default)]
    due_date: Option<NaiveDate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project, replacing any project with the same handle
    pub fn with_project(mut self, project: Project) -> Self {
        self.insert_project(project);
        self
    }

    /// Add a milestone, replacing any milestone with the same (project, iid)
    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.insert_milestone(milestone);
        self
    }

    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.handle.to_string(), project);
    }

    pub fn insert_milestone(&mut self, milestone: Milestone) {
        self.milestones
            .insert((milestone.project_id, milestone.iid), milestone);
    }

    /// All projects, ordered by handle
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Milestones of one project, ordered by iid
    pub fn milestones_for(&self, project_id: ProjectId) -> Vec<&Milestone> {
        let mut found: Vec<&Milestone> = self
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .collect();
        found.sort_by_key(|m| m.iid);
        found
    }

    pub fn milestone_count(&self) -> usize {
        self.milestones.len()
    }

    /// Parse a YAML fixture
    pub fn from_yaml_str(source: &str, filename: &str) -> Result<Self, YamlError> {
        let fixture: Fixture = parse_yaml(source, filename)?;
        Self::from_fixture(fixture)
    }

    /// Load a YAML fixture from disk
    pub fn load(path: &Path) -> Result<Self, YamlError> {
        let fixture: Fixture = load_yaml(path)?;
        Self::from_fixture(fixture)
    }

    fn from_fixture(fixture: Fixture) -> Result<Self, YamlError> {
        let mut store = Self::new();
        let mut seen_ids = HashSet::new();
        let mut seen_milestones = HashSet::new();

        for entry in fixture.projects {
            if !seen_ids.insert(entry.id) {
                return Err(YamlError::Invalid(format!(
                    "duplicate project id {} ({})",
                    entry.id, entry.handle
                )));
            }
            if store.projects.contains_key(entry.handle.as_str()) {
                return Err(YamlError::Invalid(format!(
                    "duplicate project handle '{}'",
                    entry.handle
                )));
            }

            let mut project = Project::new(entry.id, entry.handle);
            if let Some(name) = entry.name {
                project = project.with_name(name);
            }

            for m in entry.milestones {
                if !seen_milestones.insert(m.id) {
                    return Err(YamlError::Invalid(format!(
                        "duplicate milestone id {} (iid {} in '{}')",
                        m.id, m.iid, project.handle
                    )));
                }
                if store.milestones.contains_key(&(project.id, m.iid)) {
                    return Err(YamlError::Invalid(format!(
                        "duplicate milestone iid {} in '{}'",
                        m.iid, project.handle
                    )));
                }
                let mut milestone =
                    Milestone::new(m.id, project.id, m.iid, m.title).with_state(m.state);
                milestone.due_date = m.due_date;
                store.insert_milestone(milestone);
            }

            store.insert_project(project);
        }

        Ok(store)
    }
}

impl ProjectStore for MemoryStore {
    fn find_by_handle(&self, handle: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.get(handle).cloned())
    }
}

impl EntityStore for MemoryStore {
    type Entity = Milestone;

    fn find_by_local_id(&self, project: &Project, iid: Iid) -> Result<Option<Milestone>, StoreError> {
        Ok(self.milestones.get(&(project.id, iid)).cloned())
    }
}
