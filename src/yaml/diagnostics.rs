//! YAML error diagnostics for store fixtures and config files

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("YAML error in {filename}: {message}")]
#[diagnostic(code(refmark::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    filename: String,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            filename: filename.to_string(),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

/// Errors from loading a YAML document
#[derive(Debug, Error)]
pub enum YamlError {
    #[error(transparent)]
    Syntax(#[from] Box<YamlSyntaxError>),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

// Written by hand: miette has no `Diagnostic` impl for `Box<T>`, so a derived
// transparent variant would resolve `help()` to the inherent accessor.
impl Diagnostic for YamlError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            YamlError::Syntax(e) => Diagnostic::code(&**e),
            YamlError::Io { .. } => Some(Box::new("refmark::yaml::io")),
            YamlError::Invalid(_) => Some(Box::new("refmark::yaml::invalid")),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            YamlError::Syntax(e) => Diagnostic::severity(&**e),
            _ => None,
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            YamlError::Syntax(e) => Diagnostic::help(&**e),
            _ => None,
        }
    }

    fn url<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            YamlError::Syntax(e) => Diagnostic::url(&**e),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            YamlError::Syntax(e) => Diagnostic::source_code(&**e),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match self {
            YamlError::Syntax(e) => Diagnostic::labels(&**e),
            _ => None,
        }
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        match self {
            YamlError::Syntax(e) => Diagnostic::related(&**e),
            _ => None,
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match self {
            YamlError::Syntax(e) => Diagnostic::diagnostic_source(&**e),
            _ => None,
        }
    }
}

/// Deserialize `source`, mapping failures to a located diagnostic
pub fn parse_yaml<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlError::Syntax(Box::new(YamlSyntaxError::from_serde_error(&e, source, filename))))
}

/// Read and deserialize a YAML file
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&source, &path.display().to_string())
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();

    let line_text = source[line_start.min(source.len())..]
        .split('\n')
        .next()
        .unwrap_or("");
    let col_offset = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_text.len());

    (line_start + col_offset).min(source.len().saturating_sub(1))
}

/// Generate helpful suggestions based on error message
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate key") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg_lower.contains("project handle") || msg_lower.contains("namespace") {
        return Some("Project handles look like 'namespace/project'.".to_string());
    }

    if msg_lower.contains("missing field") {
        return Some(
            "Projects need 'id' and 'handle'; milestones need 'id', 'iid' and 'title'.".to_string(),
        );
    }

    if msg_lower.contains("found unexpected ':'") || msg_lower.contains("mapping values are not allowed") {
        return Some("Colons in values need to be quoted: \"value:with:colons\"".to_string());
    }

    if msg_lower.contains('%') {
        return Some("Values starting with '%' need to be quoted: \"%5\"".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("duplicate key").is_some());
        assert!(generate_help("projects[0]: missing field `handle`").is_some());
        assert!(generate_help("some random error").is_none());
    }

    #[test]
    fn test_parse_yaml_reports_location() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Doc {
            id: u32,
        }

        let err = parse_yaml::<Doc>("id: [1\n", "doc.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
        assert!(err.to_string().contains("doc.yaml"));
    }

    #[test]
    fn test_load_yaml_missing_file() {
        let err = load_yaml::<serde_yml::Value>(Path::new("/nonexistent/refmark.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io { .. }));
    }
}
