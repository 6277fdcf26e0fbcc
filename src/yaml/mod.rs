//! YAML loading helpers

pub mod diagnostics;

pub use diagnostics::{load_yaml, parse_yaml, YamlError, YamlSyntaxError};
