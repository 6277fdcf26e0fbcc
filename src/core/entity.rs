//! Referable trait - common interface for entities that documents can mention

use std::fmt::Debug;
use std::hash::Hash;

/// Common trait for entities resolvable from a textual reference
pub trait Referable {
    /// The reference kind (e.g., "milestone"), used in logs and output
    const KIND: &'static str;

    /// Identity used to de-duplicate collected references
    type Key: Clone + Debug + Eq + Hash;

    /// Get the entity's identity key
    fn reference_key(&self) -> Self::Key;

    /// Get the entity's title
    fn title(&self) -> &str;
}
