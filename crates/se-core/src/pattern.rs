//! Case-insensitive wildcard matching for namespace and ID names.

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled name pattern (`*`, `?` and `[...]` wildcards).
///
/// Patterns that fail to compile as globs fall back to a case-insensitive
/// literal comparison.
#[derive(Debug, Clone)]
pub struct NamePattern {
    raw: String,
    glob: Option<Pattern>,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            glob: Pattern::new(pattern).ok(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.glob.as_ref().map_or_else(
            || self.raw.eq_ignore_ascii_case(name),
            |glob| glob.matches_with(name, MATCH_OPTIONS),
        )
    }
}

/// Builds a destination name by substituting `name` for every `*`.
pub fn substitute(template: &str, name: &str) -> String {
    template.replace('*', name)
}

/// Case-insensitive exact name comparison.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
