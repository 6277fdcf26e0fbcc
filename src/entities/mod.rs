//! Entity type definitions
//!
//! - [`Milestone`] - a project milestone, referenced as `%N`

pub mod milestone;

pub use milestone::{Milestone, MilestoneState};
