//! reqban - request ban rule engine
//!
//! Compiles a declarative list of ban rules once, then decides for each
//! inbound request whether it should be blocked and which rule said so.
//!
//! # Architecture
//!
//! - [`RequestSnapshot`] — Immutable view of one request (path, host, port, protocol, headers, attributes)
//! - [`Field`] — Which part of the request a predicate reads, yielding a borrowed [`FieldValue`]
//! - [`ValueMatcher`] — Field-agnostic test: equality, regex, numeric comparison
//! - [`SinglePredicate`] — Combines `Field` + `ValueMatcher`
//! - [`Predicate`] — Boolean composition (And, Or, Unless)
//! - [`Ruleset`] — Ordered rules with first-match-wins semantics, producing a [`Verdict`]
//! - [`Compiler`] — Validates raw rule descriptions into a `Ruleset`
//! - [`RulesetStore`] — Atomically swappable active ruleset
//!
//! # Key Invariants
//!
//! 1. **Missing → false**: an absent header or unset attribute makes its
//!    predicate `false`. Evaluation never fails on malformed request data.
//!
//! 2. **Compile once**: rule shapes are resolved to sum types and regexes are
//!    compiled when the ruleset is built, never per request.
//!
//! 3. **First-match-wins**: rules are evaluated in declaration order and the
//!    first match is reported.
//!
//! # Example
//!
//! ```
//! use reqban::{Compiler, RequestSnapshot};
//! use serde_json::json;
//!
//! let rules = json!([
//!     { "attr": "path", "is": "/admin/login.php" },
//!     { "AND": [
//!         { "attr": "port", ">": 80 },
//!         { "UNLESS": { "attr": "protocol", "matches": "^https:?$", "caseInsensitive": true } }
//!     ] }
//! ]);
//!
//! let compiled = Compiler::default().compile(&rules).unwrap();
//! assert!(compiled.warnings.is_empty());
//! let ruleset = compiled.ruleset;
//!
//! let req = RequestSnapshot::builder().port(8080).protocol("http").build();
//! let verdict = ruleset.evaluate(&req);
//! assert!(verdict.matched);
//! assert_eq!(verdict.rule_index, Some(1));
//!
//! let req = RequestSnapshot::builder().port(8080).protocol("HTTPS").build();
//! assert!(!ruleset.evaluate(&req).matched);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod compiler;
mod config;
mod field;
mod field_value;
mod node_path;
mod predicate;
mod ruleset;
mod snapshot;
mod store;
mod trace;
mod value_matcher;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use field::Field;
pub use field_value::FieldValue;
pub use node_path::{NodePath, Segment};
pub use predicate::{Predicate, SinglePredicate};
pub use ruleset::{Rule, Ruleset, Verdict};
pub use snapshot::{AttrValue, RequestSnapshot, RequestSnapshotBuilder};

// Compilation
pub use compiler::{compile, Compiled, Compiler};
pub use config::CompileOptions;

// Hot swap
pub use store::RulesetStore;

// Trace types
pub use trace::{EvalStep, EvalTrace, PredicateTrace};

// Concrete matchers
pub use value_matcher::{
    CompareMatcher, CompareOp, EqualsMatcher, MatchValue, RegexMatcher, ValueMatcher,
    DEFAULT_REGEX_SIZE_LIMIT,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use reqban::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Compilation
        CompileError,
        CompileOptions,
        CompileWarning,
        Compiled,
        Compiler,
        // Core types
        Field,
        FieldValue,
        MatchValue,
        NodePath,
        Predicate,
        RequestSnapshot,
        Rule,
        Ruleset,
        RulesetStore,
        SinglePredicate,
        ValueMatcher,
        Verdict,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum allowed nesting depth of one rule tree.
///
/// Evaluation recurses once per level, so this bounds stack use.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of children in a single `AND` or `OR`.
pub const MAX_CHILDREN: usize = 256;

/// Maximum number of top-level rules in a ruleset.
///
/// Ban lists routinely carry hundreds of regex rules; this stops a runaway
/// generated file, not a real list.
pub const MAX_RULES: usize = 4096;

/// Maximum length for `is` literals.
pub const MAX_LITERAL_LENGTH: usize = 8192;

/// Maximum length for regex patterns.
///
/// Shorter than [`MAX_LITERAL_LENGTH`] because regex compile cost scales
/// faster than literal comparison.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// A ruleset failed to compile.
///
/// Raised at load time, never at evaluation time. The ruleset being compiled
/// must not become active; fix the rule at [`path`](Self::path) and reload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("at {path}: {kind}")]
pub struct CompileError {
    /// The offending node (or key) in the rule description.
    pub path: NodePath,
    /// What is wrong with it.
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Create a compile error at `path`.
    #[must_use]
    pub fn new(path: NodePath, kind: CompileErrorKind) -> Self {
        Self { path, kind }
    }
}

/// The specific reason a rule failed to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileErrorKind {
    /// The rule text could not be parsed as JSON/YAML.
    #[error("parse error: {message}")]
    Parse {
        /// The parser's message.
        message: String,
    },
    /// A list was required.
    #[error("expected a list, found {found}")]
    ExpectedList {
        /// The JSON type that was found.
        found: &'static str,
    },
    /// A rule object was required.
    #[error("expected a rule object, found {found}")]
    ExpectedObject {
        /// The JSON type that was found.
        found: &'static str,
    },
    /// A key is not part of the rule language.
    #[error("unknown key `{key}`{}", hint_suffix(.hint))]
    UnknownKey {
        /// The unrecognized key.
        key: String,
        /// A recognized key it likely meant.
        hint: Option<String>,
    },
    /// A comparison operator outside `>`, `<`, `>=`, `<=`, `==`, `!=`.
    #[error("unknown comparison operator `{op}` (allowed: >, <, >=, <=, ==, !=)")]
    UnknownOperator {
        /// The rejected operator.
        op: String,
    },
    /// A leaf has neither `attr` nor `header`.
    #[error("rule has no `attr` or `header` to test")]
    MissingField,
    /// A leaf has no `is`, `matches` or comparison operator.
    #[error("rule has no condition (`is`, `matches` or a comparison operator)")]
    MissingCondition,
    /// Two keys that exclude each other appear in one rule object.
    #[error("keys `{first}` and `{second}` cannot be combined in one rule")]
    ConflictingKeys {
        /// The first key.
        first: String,
        /// The key that conflicts with it.
        second: String,
    },
    /// A key holds a value of the wrong type.
    #[error("`{key}` must be {expected}, found {found}")]
    InvalidValue {
        /// The key whose value is wrong.
        key: String,
        /// What the key accepts.
        expected: &'static str,
        /// What was found.
        found: String,
    },
    /// A `matches` pattern is not a valid regular expression.
    #[error("invalid regex \"{pattern}\": {message}")]
    InvalidRegex {
        /// The pattern source.
        pattern: String,
        /// The regex engine's message.
        message: String,
    },
    /// A pattern or literal exceeds its length limit.
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// `UNLESS` wraps zero or several children.
    #[error("UNLESS must wrap exactly one rule, found {count}")]
    UnlessArity {
        /// Number of children found.
        count: usize,
    },
    /// Nesting exceeds the depth limit.
    #[error("rule nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Depth reached.
        depth: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Too many children in one `AND`/`OR`.
    #[error("combinator has {count} children, but maximum allowed is {max}")]
    TooManyChildren {
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Too many top-level rules.
    #[error("ruleset has {count} rules, but maximum allowed is {max}")]
    TooManyRules {
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A warning escalated by strict mode.
    #[error("{0} (strict mode)")]
    Strict(WarningKind),
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(" (did you mean `{h}`?)"))
        .unwrap_or_default()
}

/// A rule that compiles but probably does not mean what it says.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at {path}: {kind}")]
pub struct CompileWarning {
    /// The node the warning is about.
    pub path: NodePath,
    /// What is suspicious about it.
    pub kind: WarningKind,
}

/// The reason for a [`CompileWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WarningKind {
    /// `AND: []` matches every request.
    #[error("empty AND matches every request")]
    EmptyAnd,
    /// `OR: []` never matches.
    #[error("empty OR never matches")]
    EmptyOr,
}
