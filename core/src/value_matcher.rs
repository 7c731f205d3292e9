//! `ValueMatcher` — Field-agnostic value tests
//!
//! Matchers operate on a [`FieldValue`] and know nothing about where it came
//! from, so the same matcher works for paths, hosts, headers or extension
//! attributes.
//!
//! # Available Matchers
//!
//! - [`EqualsMatcher`] — Exact string/number equality (`is`)
//! - [`RegexMatcher`] — Regular expression search (`matches`)
//! - [`CompareMatcher`] — Numeric comparison (`>`, `<`, `>=`, `<=`, `==`, `!=`)

use crate::FieldValue;
use std::fmt;
use std::io::Write as _;

/// Tests a [`FieldValue`].
///
/// Implementations must return `false` for [`FieldValue::Missing`] and for
/// values of an incompatible type. They never fail.
pub trait MatchValue: Send + Sync + fmt::Debug {
    /// Check if the given value matches.
    fn matches(&self, value: &FieldValue<'_>) -> bool;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Equality
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact equality matcher.
///
/// A text literal equals a string field with the same text, and an integer
/// field whose decimal form is that text. A numeric literal additionally
/// equals a string field that parses to the same number.
///
/// # Example
///
/// ```
/// use reqban::{EqualsMatcher, FieldValue, MatchValue};
///
/// let m = EqualsMatcher::new("/admin/login.php");
/// assert!(m.matches(&FieldValue::Str("/admin/login.php")));
/// assert!(!m.matches(&FieldValue::Str("/admin/login.php/x")));
///
/// let m = EqualsMatcher::number(80.0);
/// assert!(m.matches(&FieldValue::Int(80)));
/// assert!(m.matches(&FieldValue::Str("80")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EqualsMatcher {
    text: String,
    int: Option<i64>,
    number: Option<f64>,
}

impl EqualsMatcher {
    /// Create an equality matcher for a text literal.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let int = canonical_int(&text);
        Self {
            text,
            int,
            number: None,
        }
    }

    /// Create an equality matcher for a numeric literal.
    #[must_use]
    pub fn number(n: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let int = (n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64)
            .then_some(n as i64);
        let text = int.map_or_else(|| n.to_string(), |i| i.to_string());
        Self {
            text,
            int,
            number: Some(n),
        }
    }

    /// The literal in text form.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Parses `s` as an integer only when `s` is exactly that integer's decimal
/// form, so `"080"` and `"+80"` never equal the integer `80`.
fn canonical_int(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|i| i.to_string() == s)
}

impl MatchValue for EqualsMatcher {
    fn matches(&self, value: &FieldValue<'_>) -> bool {
        match value {
            FieldValue::Missing => false,
            FieldValue::Str(s) => {
                *s == self.text
                    || self
                        .number
                        .is_some_and(|n| value.as_number() == Some(n))
            }
            #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
            FieldValue::Int(i) => {
                self.int == Some(*i) || self.number.is_some_and(|n| *i as f64 == n)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Regular expressions
// ═══════════════════════════════════════════════════════════════════════════════

/// Default limit on the compiled size of one regular expression.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Regular expression matcher.
///
/// The pattern is compiled once with its case-sensitivity baked in. Matching
/// is a search: unanchored unless the pattern anchors itself. Integer fields
/// are matched against their decimal form.
///
/// Uses Rust's `regex` crate, which guarantees linear-time matching, so a
/// pattern cannot backtrack catastrophically.
///
/// # Example
///
/// ```
/// use reqban::{FieldValue, MatchValue, RegexMatcher};
///
/// let m = RegexMatcher::new(r"^/phpmyadmin", true).unwrap();
/// assert!(m.matches(&FieldValue::Str("/PHPMYADMIN/setup.php")));
/// assert!(!m.matches(&FieldValue::Str("/index.php")));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: regex::Regex,
    case_insensitive: bool,
}

impl RegexMatcher {
    /// Compile a regex matcher with the default size limit.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the pattern is invalid.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        Self::with_size_limit(pattern, case_insensitive, DEFAULT_REGEX_SIZE_LIMIT)
    }

    /// Compile a regex matcher with an explicit compiled-size limit.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the pattern is invalid or compiles larger than
    /// `size_limit` bytes.
    pub fn with_size_limit(
        pattern: &str,
        case_insensitive: bool,
        size_limit: usize,
    ) -> Result<Self, regex::Error> {
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .size_limit(size_limit)
            .build()?;
        Ok(Self {
            regex,
            case_insensitive,
        })
    }

    /// The source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern was compiled case-insensitively.
    #[must_use]
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl MatchValue for RegexMatcher {
    fn matches(&self, value: &FieldValue<'_>) -> bool {
        match value {
            FieldValue::Missing => false,
            FieldValue::Str(s) => self.regex.is_match(s),
            FieldValue::Int(i) => {
                // i64::MIN is the longest decimal form at 20 bytes.
                let mut buf = [0u8; 20];
                let mut cursor = std::io::Cursor::new(&mut buf[..]);
                if write!(cursor, "{i}").is_err() {
                    return false;
                }
                #[allow(clippy::cast_possible_truncation)]
                let len = cursor.position() as usize;
                std::str::from_utf8(&buf[..len]).is_ok_and(|s| self.regex.is_match(s))
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Numeric comparison
// ═══════════════════════════════════════════════════════════════════════════════

/// A numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CompareOp {
    /// Every operator, in the order they are documented.
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Ne,
    ];

    /// Parse an operator from its symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// The operator's symbol as written in rules.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// Apply the operator as `lhs <op> rhs`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Numeric comparison matcher: `field <op> threshold`.
///
/// Non-numeric and missing values never match, for every operator.
///
/// # Example
///
/// ```
/// use reqban::{CompareMatcher, CompareOp, FieldValue, MatchValue};
///
/// let m = CompareMatcher::new(CompareOp::Gt, 80.0);
/// assert!(m.matches(&FieldValue::Int(8080)));
/// assert!(!m.matches(&FieldValue::Int(80)));
/// assert!(!m.matches(&FieldValue::Str("http")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareMatcher {
    op: CompareOp,
    threshold: f64,
}

impl CompareMatcher {
    /// Create a comparison matcher.
    #[must_use]
    pub fn new(op: CompareOp, threshold: f64) -> Self {
        Self { op, threshold }
    }

    /// The comparison operator.
    #[must_use]
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// The threshold compared against.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl MatchValue for CompareMatcher {
    fn matches(&self, value: &FieldValue<'_>) -> bool {
        value
            .as_number()
            .is_some_and(|n| self.op.apply(n, self.threshold))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ValueMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// The leaf test of a compiled predicate.
///
/// Resolved once by the compiler; evaluation dispatches on the variant
/// without re-inspecting the rule description.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// `is: <literal>`
    Equals(EqualsMatcher),
    /// `matches: <pattern>`
    Regex(RegexMatcher),
    /// `<op>: <number>`
    Compare(CompareMatcher),
}

impl MatchValue for ValueMatcher {
    #[inline]
    fn matches(&self, value: &FieldValue<'_>) -> bool {
        match self {
            Self::Equals(m) => m.matches(value),
            Self::Regex(m) => m.matches(value),
            Self::Compare(m) => m.matches(value),
        }
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(m) => write!(f, "is {:?}", m.text()),
            Self::Regex(m) => {
                write!(f, "matches /{}/", m.pattern())?;
                if m.is_case_insensitive() {
                    f.write_str("i")?;
                }
                Ok(())
            }
            Self::Compare(m) => write!(f, "{} {}", m.op(), m.threshold()),
        }
    }
}

impl From<EqualsMatcher> for ValueMatcher {
    fn from(m: EqualsMatcher) -> Self {
        Self::Equals(m)
    }
}

impl From<RegexMatcher> for ValueMatcher {
    fn from(m: RegexMatcher) -> Self {
        Self::Regex(m)
    }
}

impl From<CompareMatcher> for ValueMatcher {
    fn from(m: CompareMatcher) -> Self {
        Self::Compare(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_text() {
        let m = EqualsMatcher::new("/admin/login.php");
        assert!(m.matches(&"/admin/login.php".into()));
        assert!(!m.matches(&"/admin/login.php/x".into()));
        assert!(!m.matches(&"/ADMIN/login.php".into()));
        assert!(!m.matches(&FieldValue::Missing));
    }

    #[test]
    fn test_equals_text_against_int() {
        let m = EqualsMatcher::new("8080");
        assert!(m.matches(&FieldValue::Int(8080)));
        assert!(!m.matches(&FieldValue::Int(80)));

        let m = EqualsMatcher::new("080");
        assert!(!m.matches(&FieldValue::Int(80)));
    }

    #[test]
    fn test_equals_number() {
        let m = EqualsMatcher::number(443.0);
        assert_eq!(m.text(), "443");
        assert!(m.matches(&FieldValue::Int(443)));
        assert!(m.matches(&"443".into()));
        assert!(m.matches(&"443.0".into()));
        assert!(!m.matches(&"https".into()));

        let m = EqualsMatcher::number(1.5);
        assert_eq!(m.text(), "1.5");
        assert!(!m.matches(&FieldValue::Int(1)));
        assert!(m.matches(&"1.50".into()));
    }

    #[test]
    fn test_regex_case_sensitivity() {
        let m = RegexMatcher::new(r"\.edu$", false).unwrap();
        assert!(m.matches(&"lib.university.edu".into()));
        assert!(!m.matches(&"lib.university.EDU".into()));
        assert!(!m.matches(&"lib.university.com".into()));

        let m = RegexMatcher::new("spider", true).unwrap();
        assert!(m.is_case_insensitive());
        assert!(m.matches(&"SomeSpiderBot".into()));
    }

    #[test]
    fn test_regex_is_unanchored_search() {
        let m = RegexMatcher::new("ZmEu", true).unwrap();
        assert!(m.matches(&"Mozilla/5.0 zmeu scanner".into()));
    }

    #[test]
    fn test_regex_on_int() {
        let m = RegexMatcher::new(r"^80\d\d$", false).unwrap();
        assert!(m.matches(&FieldValue::Int(8080)));
        assert!(!m.matches(&FieldValue::Int(80)));

        let m = RegexMatcher::new(r"^-9223372036854775808$", false).unwrap();
        assert!(m.matches(&FieldValue::Int(i64::MIN)));
    }

    #[test]
    fn test_regex_missing() {
        let m = RegexMatcher::new(".*", false).unwrap();
        assert!(!m.matches(&FieldValue::Missing));
    }

    #[test]
    fn test_regex_invalid() {
        assert!(RegexMatcher::new("(unclosed", false).is_err());
        // Backreferences need backtracking and are not supported.
        assert!(RegexMatcher::new(r"(a)\1", false).is_err());
    }

    #[test]
    fn test_regex_size_limit() {
        assert!(RegexMatcher::with_size_limit(r"\w{1000}", false, 1024).is_err());
    }

    #[test]
    fn test_compare_operators() {
        let cases = [
            (CompareOp::Gt, 8080, true),
            (CompareOp::Gt, 80, false),
            (CompareOp::Lt, 79, true),
            (CompareOp::Ge, 80, true),
            (CompareOp::Le, 81, false),
            (CompareOp::Eq, 80, true),
            (CompareOp::Ne, 80, false),
            (CompareOp::Ne, 443, true),
        ];
        for (op, value, expected) in cases {
            let m = CompareMatcher::new(op, 80.0);
            assert_eq!(
                m.matches(&FieldValue::Int(value)),
                expected,
                "{value} {op} 80"
            );
        }
    }

    #[test]
    fn test_compare_non_numeric_never_matches() {
        for op in CompareOp::ALL {
            let m = CompareMatcher::new(op, 80.0);
            assert!(!m.matches(&"http".into()), "{op}");
            assert!(!m.matches(&FieldValue::Missing), "{op}");
        }
    }

    #[test]
    fn test_compare_numeric_string() {
        let m = CompareMatcher::new(CompareOp::Ge, 1_048_576.0);
        assert!(m.matches(&"2097152".into()));
        assert!(!m.matches(&"1024".into()));
    }

    #[test]
    fn test_op_symbols() {
        for op in CompareOp::ALL {
            assert_eq!(CompareOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(CompareOp::from_symbol("=>"), None);
        assert_eq!(CompareOp::from_symbol("="), None);
    }

    #[test]
    fn test_value_matcher_display() {
        let m: ValueMatcher = RegexMatcher::new("^https:?$", true).unwrap().into();
        assert_eq!(m.to_string(), "matches /^https:?$/i");
        let m: ValueMatcher = CompareMatcher::new(CompareOp::Gt, 80.0).into();
        assert_eq!(m.to_string(), "> 80");
        let m: ValueMatcher = EqualsMatcher::new("/x").into();
        assert_eq!(m.to_string(), "is \"/x\"");
    }

    #[test]
    fn test_matchers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValueMatcher>();
    }
}
