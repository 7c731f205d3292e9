//! Compiler configuration.
//!
//! [`CompileOptions`] is serde-deserializable so hosts can keep it next to
//! the rest of their configuration; every field has a default, so `{}` is a
//! valid options document.

use crate::{
    DEFAULT_REGEX_SIZE_LIMIT, MAX_CHILDREN, MAX_DEPTH, MAX_LITERAL_LENGTH,
    MAX_REGEX_PATTERN_LENGTH, MAX_RULES,
};
use serde::{Deserialize, Serialize};

/// Options controlling rule compilation.
///
/// # Example
///
/// ```
/// use reqban::CompileOptions;
///
/// let options: CompileOptions = serde_json::from_str(r#"{ "strict": true }"#).unwrap();
/// assert!(options.strict);
/// assert_eq!(options.max_depth, reqban::MAX_DEPTH);
///
/// let options = CompileOptions::default().strict().with_max_depth(8);
/// assert_eq!(options.max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Escalate warnings (empty `AND`/`OR`) to errors.
    pub strict: bool,
    /// Maximum nesting depth of a rule tree.
    pub max_depth: usize,
    /// Maximum number of children of one `AND`/`OR`.
    pub max_children: usize,
    /// Maximum number of top-level rules.
    pub max_rules: usize,
    /// Maximum length of a regex pattern, in bytes.
    pub max_pattern_len: usize,
    /// Maximum length of an `is` literal, in bytes.
    pub max_literal_len: usize,
    /// Maximum compiled size of one regex, in bytes.
    pub regex_size_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: MAX_DEPTH,
            max_children: MAX_CHILDREN,
            max_rules: MAX_RULES,
            max_pattern_len: MAX_REGEX_PATTERN_LENGTH,
            max_literal_len: MAX_LITERAL_LENGTH,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

impl CompileOptions {
    /// Enable strict mode.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of children per combinator.
    #[must_use]
    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children;
        self
    }

    /// Set the maximum number of top-level rules.
    #[must_use]
    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    /// Set the maximum regex pattern length.
    #[must_use]
    pub fn with_max_pattern_len(mut self, max_pattern_len: usize) -> Self {
        self.max_pattern_len = max_pattern_len;
        self
    }

    /// Set the maximum compiled regex size.
    #[must_use]
    pub fn with_regex_size_limit(mut self, regex_size_limit: usize) -> Self {
        self.regex_size_limit = regex_size_limit;
        self
    }
}
