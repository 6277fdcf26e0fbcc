//! Milestone entity type

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::entity::Referable;
use crate::core::identity::{Iid, MilestoneId, ProjectId};

/// Milestone lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    #[default]
    Active,
    Closed,
}

impl fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneState::Active => write!(f, "active"),
            MilestoneState::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for MilestoneState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "open" => Ok(MilestoneState::Active),
            "closed" => Ok(MilestoneState::Closed),
            _ => Err(format!("Unknown milestone state: {}", s)),
        }
    }
}

/// A milestone scoped to exactly one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Global identifier
    pub id: MilestoneId,

    /// Owning project
    pub project_id: ProjectId,

    /// Per-project sequential identifier (the number after `%`)
    pub iid: Iid,

    pub title: String,

    #[serde(default)]
    pub state: MilestoneState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Milestone {
    pub fn new(id: MilestoneId, project_id: ProjectId, iid: Iid, title: impl Into<String>) -> Self {
        Self {
            id,
            project_id,
            iid,
            title: title.into(),
            state: MilestoneState::Active,
            due_date: None,
        }
    }

    pub fn with_state(mut self, state: MilestoneState) -> Self {
        self.state = state;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

impl Referable for Milestone {
    const KIND: &'static str = "milestone";

    type Key = MilestoneId;

    fn reference_key(&self) -> MilestoneId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parsing() {
        assert_eq!("active".parse::<MilestoneState>().unwrap(), MilestoneState::Active);
        assert_eq!("Open".parse::<MilestoneState>().unwrap(), MilestoneState::Active);
        assert_eq!("CLOSED".parse::<MilestoneState>().unwrap(), MilestoneState::Closed);
        assert!("archived".parse::<MilestoneState>().is_err());
    }

    #[test]
    fn test_milestone_yaml() {
        let yaml = "id: 10\nproject_id: 1\niid: 5\ntitle: Beta\ndue_date: 2024-03-01\n";
        let milestone: Milestone = serde_yml::from_str(yaml).unwrap();
        assert_eq!(milestone.iid, Iid(5));
        assert_eq!(milestone.state, MilestoneState::Active);
        assert_eq!(milestone.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(milestone.reference_key(), MilestoneId(10));
    }
}
