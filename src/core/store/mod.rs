//! Project and entity stores consulted during reference resolution
//!
//! The engine only reads from stores. "Not found" is reported as `Ok(None)`;
//! `Err` is reserved for infrastructure failures the host must see.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreStats};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::entity::Referable;
use crate::core::identity::Iid;
use crate::core::project::Project;

/// Lookup of projects by path-like handle
pub trait ProjectStore {
    /// Find the project with exactly this handle
    fn find_by_handle(&self, handle: &str) -> Result<Option<Project>, StoreError>;
}

/// Lookup of entities by per-project local id
pub trait EntityStore {
    type Entity: Referable;

    /// Find the entity with `iid` inside `project`
    fn find_by_local_id(&self, project: &Project, iid: Iid) -> Result<Option<Self::Entity>, StoreError>;
}

impl<T: ProjectStore + ?Sized> ProjectStore for &T {
    fn find_by_handle(&self, handle: &str) -> Result<Option<Project>, StoreError> {
        (**self).find_by_handle(handle)
    }
}

impl<T: EntityStore + ?Sized> EntityStore for &T {
    type Entity = T::Entity;

    fn find_by_local_id(&self, project: &Project, iid: Iid) -> Result<Option<Self::Entity>, StoreError> {
        (**self).find_by_local_id(project, iid)
    }
}

/// Infrastructure failures surfaced by a store
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("database error: {0}")]
    #[diagnostic(code(refmark::store::database))]
    Database(#[from] rusqlite::Error),

    #[error("store schema version {found} is not supported (expected {expected})")]
    #[diagnostic(code(refmark::store::schema))]
    SchemaVersion { found: i32, expected: i32 },

    #[error("corrupt store data: {0}")]
    #[diagnostic(code(refmark::store::corrupt))]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    #[diagnostic(code(refmark::store::unavailable))]
    Unavailable(String),
}
