//! Entities mentioned by a document, for notification downstream

use std::collections::HashSet;

use crate::core::entity::Referable;

/// Ordered, de-duplicated list of resolved entities
///
/// Insertion order is the order of first successful resolution.
#[derive(Debug)]
pub struct ReferenceCollector<E: Referable> {
    seen: HashSet<E::Key>,
    entries: Vec<E>,
}

impl<E: Referable> Default for ReferenceCollector<E> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }
}

impl<E: Referable> ReferenceCollector<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entity` unless one with the same key was already recorded
    ///
    /// Returns `true` if the entity was new.
    pub fn record(&mut self, entity: E) -> bool {
        if !self.seen.insert(entity.reference_key()) {
            return false;
        }
        self.entries.push(entity);
        true
    }

    /// Take the collected entities, leaving the collector empty
    pub fn drain(&mut self) -> Vec<E> {
        self.seen.clear();
        std::mem::take(&mut self.entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{Iid, MilestoneId, ProjectId};
    use crate::entities::milestone::Milestone;

    fn milestone(id: i64, title: &str) -> Milestone {
        Milestone::new(MilestoneId(id), ProjectId(1), Iid(id as u32), title)
    }

    #[test]
    fn test_first_seen_order_without_duplicates() {
        let mut collector = ReferenceCollector::new();
        assert!(collector.record(milestone(2, "GA")));
        assert!(collector.record(milestone(1, "Beta")));
        assert!(!collector.record(milestone(2, "GA")));

        let titles: Vec<_> = collector.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["GA", "Beta"]);
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_drain_resets() {
        let mut collector = ReferenceCollector::new();
        collector.record(milestone(1, "Beta"));

        let drained = collector.drain();
        assert_eq!(drained.len(), 1);
        assert!(collector.is_empty());
        assert!(collector.record(milestone(1, "Beta")));
    }
}
