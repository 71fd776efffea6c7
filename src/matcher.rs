use crate::error::{CompressionError, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Patterns match a single path segment, case-sensitively.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Include/exclude glob filter applied to base file names.
///
/// Exclusion wins: a name matching any exclude pattern is rejected even if
/// it also matches an include pattern. An empty include set selects nothing.
///
/// Patterns use `glob` syntax: `*`, `?`, `[abc]`, `[a-z]` and the negated
/// class `[!abc]` (not `[^abc]`). Backslash is not an escape; wrap a
/// metacharacter in brackets instead, e.g. `[*]`.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathMatcher {
    /// Compiles both pattern sets, failing on the first malformed pattern.
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Ok(Self {
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        if self
            .exclude
            .iter()
            .any(|p| p.matches_with(file_name, MATCH_OPTIONS))
        {
            return false;
        }

        self.include
            .iter()
            .any(|p| p.matches_with(file_name, MATCH_OPTIONS))
    }

    /// Tests the base name of `path`; directory components are ignored.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matches_name(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

fn compile_patterns<P>(patterns: P) -> Result<Vec<Pattern>>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|raw| {
            let raw = raw.as_ref();
            Pattern::new(raw).map_err(|source| CompressionError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })
        })
        .collect()
}

/// Uncompiled form of [`PathMatcher::matches_name`].
///
/// Malformed patterns never match.
pub fn should_include<S: AsRef<str>>(file_name: &str, include: &[S], exclude: &[S]) -> bool {
    let matches = |raw: &S| {
        Pattern::new(raw.as_ref())
            .map(|p| p.matches_with(file_name, MATCH_OPTIONS))
            .unwrap_or(false)
    };

    if exclude.iter().any(matches) {
        return false;
    }
    include.iter().any(matches)
}
