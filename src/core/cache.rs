//! Per-document memo of qualifier resolutions
//!
//! Lives for exactly one document pass and is never shared between
//! documents, so it needs no eviction and no locking.

use std::collections::HashMap;

use crate::core::project::Project;

/// Memo table from qualifier to resolved project
///
/// Stores `None` for "no project" so a failed lookup is not retried;
/// a missing entry means "not yet computed". An absent qualifier and an
/// empty one share the same slot.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, Option<Project>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(qualifier: Option<&str>) -> &str {
        qualifier.unwrap_or("")
    }

    /// Cached result: `None` if not computed, `Some(None)` if no project
    pub fn get(&self, qualifier: Option<&str>) -> Option<Option<&Project>> {
        self.entries
            .get(Self::key(qualifier))
            .map(|resolved| resolved.as_ref())
    }

    pub fn put(&mut self, qualifier: Option<&str>, resolved: Option<Project>) {
        self.entries
            .insert(Self::key(qualifier).to_string(), resolved);
    }

    /// Number of distinct qualifiers seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
