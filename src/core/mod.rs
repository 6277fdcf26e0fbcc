//! Core module - reference resolution engine

pub mod cache;
pub mod collector;
pub mod config;
pub mod entity;
pub mod filter;
pub mod identity;
pub mod pattern;
pub mod project;
pub mod resolver;
pub mod store;

pub use cache::ResolutionCache;
pub use collector::ReferenceCollector;
pub use config::Config;
pub use entity::Referable;
pub use filter::{FilterStats, ReferenceFilter, RenderContext, Rendered, Renderer};
pub use identity::{IdParseError, Iid, MilestoneId, ProjectHandle, ProjectId};
pub use pattern::{ReferencePattern, ReferenceScanner, ReferenceToken, MILESTONE_SIGIL};
pub use project::Project;
pub use resolver::ProjectResolver;
pub use store::{EntityStore, MemoryStore, ProjectStore, SqliteStore, StoreError, StoreStats};
