//! Reference token grammar
//!
//! A reference is a sigil followed by a run of ASCII digits, optionally
//! preceded by a cross-project qualifier:
//!
//! ```text
//! %5                  milestone 5 in the current project
//! other-team/proj%7   milestone 7 in project `other-team/proj`
//! group/sub/app%12    nested namespaces are allowed
//! ```
//!
//! The qualifier grammar (segments of `[A-Za-z0-9_][A-Za-z0-9_-]*`
//! joined by `/`, at least two segments) is shared by every reference
//! kind; only the sigil differs. Qualifier characters never include a
//! sigil, so a qualified token is always consumed as one match.
//!
//! ```
//! use refmark::core::pattern::ReferencePattern;
//!
//! let tokens: Vec<_> = ReferencePattern::milestone()
//!     .scan("ship %3 before acme/web%4")
//!     .map(|t| (t.qualifier(), t.digits()))
//!     .collect();
//! assert_eq!(tokens, vec![(None, "3"), (Some("acme/web"), "4")]);
//! ```

use regex::{CaptureMatches, Regex};
use std::ops::Range;
use std::sync::LazyLock;

use crate::core::identity::{IdParseError, Iid};

/// Sigil for milestone references
pub const MILESTONE_SIGIL: char = '%';

/// Qualifier grammar shared across reference kinds
const PROJECT_PATH: &str = r"[A-Za-z0-9_][A-Za-z0-9_\-]*(?:/[A-Za-z0-9_][A-Za-z0-9_\-]*)+";

static MILESTONE_PATTERN: LazyLock<ReferencePattern> = LazyLock::new(|| {
    ReferencePattern::new("milestone", MILESTONE_SIGIL).expect("milestone pattern compiles")
});

/// Compiled grammar for one reference kind
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    kind: &'static str,
    sigil: char,
    regex: Regex,
}

impl ReferencePattern {
    /// Build the grammar for a reference kind with the given sigil
    pub fn new(kind: &'static str, sigil: char) -> Result<Self, regex::Error> {
        let source = format!(
            r"(?:(?P<project>{PROJECT_PATH}))?{}(?P<id>[0-9]+)\b",
            regex::escape(sigil.encode_utf8(&mut [0; 4]))
        );
        Ok(Self {
            kind,
            sigil,
            regex: Regex::new(&source)?,
        })
    }

    /// The shared milestone grammar (`%N`, `namespace/project%N`)
    pub fn milestone() -> &'static ReferencePattern {
        &MILESTONE_PATTERN
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn sigil(&self) -> char {
        self.sigil
    }

    /// The underlying regular expression, for hosts that pre-filter text
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Check whether `text` contains at least one token
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Lazily scan `text` for tokens, left to right, without overlap
    pub fn scan<'p, 't>(&'p self, text: &'t str) -> ReferenceScanner<'p, 't> {
        ReferenceScanner {
            inner: self.regex.captures_iter(text),
        }
    }

    /// Rebuild `text`, replacing each token with the callback's result
    ///
    /// `Ok(Some(s))` substitutes `s`, `Ok(None)` keeps the token verbatim,
    /// and `Err` aborts the rebuild. Text between tokens is copied as-is.
    pub fn replace<F, E>(&self, text: &str, mut f: F) -> Result<String, E>
    where
        F: FnMut(&ReferenceToken<'_>) -> Result<Option<String>, E>,
    {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for token in self.scan(text) {
            let range = token.range();
            output.push_str(&text[last..range.start]);
            match f(&token)? {
                Some(replacement) => output.push_str(&replacement),
                None => output.push_str(token.raw()),
            }
            last = range.end;
        }

        output.push_str(&text[last..]);
        Ok(output)
    }
}

/// A single matched reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken<'t> {
    raw: &'t str,
    range: Range<usize>,
    qualifier: Option<&'t str>,
    digits: &'t str,
}

impl<'t> ReferenceToken<'t> {
    /// The exact matched text
    pub fn raw(&self) -> &'t str {
        self.raw
    }

    /// Byte range of the match in the scanned text
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Cross-project qualifier, if any, exactly as written
    pub fn qualifier(&self) -> Option<&'t str> {
        self.qualifier
    }

    /// The digit run after the sigil
    pub fn digits(&self) -> &'t str {
        self.digits
    }

    /// Parse the digits into a local id
    pub fn iid(&self) -> Result<Iid, IdParseError> {
        self.digits.parse()
    }
}

/// Iterator over the tokens of one text
pub struct ReferenceScanner<'p, 't> {
    inner: CaptureMatches<'p, 't>,
}

impl<'p, 't> Iterator for ReferenceScanner<'p, 't> {
    type Item = ReferenceToken<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.inner.next()?;
        // Group 0 and `id` always participate in a match.
        let whole = caps.get(0)?;
        let digits = caps.name("id")?;
        Some(ReferenceToken {
            raw: whole.as_str(),
            range: whole.range(),
            qualifier: caps.name("project").map(|m| m.as_str()),
            digits: digits.as_str(),
        })
    }
}
