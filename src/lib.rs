//! Refmark: milestone reference filter
//!
//! Finds `%N` and `namespace/project%N` references in document text and
//! replaces the ones that resolve to a milestone with rendered links,
//! leaving all other text untouched.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
