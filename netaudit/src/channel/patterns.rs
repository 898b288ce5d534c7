//! Pattern matching utilities for prompt detection.

use std::fmt;
use std::ops::Range;

use memchr::memmem;
use regex::bytes::Regex;

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Returns the byte span of the first match, or None if no match.
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_span(data).is_some()
    }
}

impl PromptMatcher for Regex {
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>> {
        self.find(data).map(|m| m.range())
    }
}

/// A pattern the channel can wait for: a literal substring or a regex.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches the exact byte sequence anywhere in the output.
    Literal(String),

    /// Matches a regular expression against the output bytes.
    Regex(Regex),
}

impl Pattern {
    /// A literal substring pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// A regex pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// The source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(text) => text,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }

    /// Check a whole string, e.g. a single configuration line.
    pub fn matches_str(&self, text: &str) -> bool {
        self.is_match(text.as_bytes())
    }
}

impl PromptMatcher for Pattern {
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>> {
        match self {
            Pattern::Literal(text) => {
                let needle = text.as_bytes();
                memmem::find(data, needle).map(|start| start..start + needle.len())
            }
            Pattern::Regex(regex) => regex.find_span(data),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the earliest match among `patterns` in `data`.
///
/// Returns the index of the winning pattern and its span. When two patterns
/// match at the same offset, the one listed first wins.
pub(crate) fn earliest_match<M: PromptMatcher>(
    patterns: &[M],
    data: &[u8],
) -> Option<(usize, Range<usize>)> {
    let mut best: Option<(usize, Range<usize>)> = None;
    for (index, pattern) in patterns.iter().enumerate() {
        if let Some(span) = pattern.find_span(data) {
            let better = best
                .as_ref()
                .is_none_or(|(_, current)| span.start < current.start);
            if better {
                best = Some((index, span));
            }
        }
    }
    best
}
