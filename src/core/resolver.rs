//! Qualifier to project resolution

use tracing::debug;

use crate::core::project::Project;
use crate::core::store::{ProjectStore, StoreError};

/// Turns an optional qualifier into the project a reference points at
///
/// Depends only on `(qualifier, current)` and the store, which is what lets
/// [`ResolutionCache`](crate::core::cache::ResolutionCache) memoize it per
/// document by qualifier alone.
pub struct ProjectResolver<'s, P: ?Sized> {
    store: &'s P,
}

impl<'s, P: ProjectStore + ?Sized> ProjectResolver<'s, P> {
    pub fn new(store: &'s P) -> Self {
        Self { store }
    }

    /// Resolve `qualifier` relative to `current`
    ///
    /// - absent or empty qualifier: `current`
    /// - otherwise: the project with exactly that handle, or `None`
    ///
    /// An unknown handle never falls back to `current`.
    pub fn resolve(&self, qualifier: Option<&str>, current: &Project) -> Result<Option<Project>, StoreError> {
        match qualifier.filter(|q| !q.is_empty()) {
            None => Ok(Some(current.clone())),
            Some(handle) => {
                let found = self.store.find_by_handle(handle)?;
                if found.is_none() {
                    debug!(handle, "no project with handle");
                }
                Ok(found)
            }
        }
    }
}
