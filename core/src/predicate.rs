//! Predicate — Boolean expressions over request fields
//!
//! Predicates combine a [`Field`] and a [`ValueMatcher`] into a leaf
//! condition, and compose leaves with AND / OR / UNLESS.

use crate::{Field, MatchValue, NodePath, PredicateTrace, RequestSnapshot, ValueMatcher};

/// A leaf predicate: combines a [`Field`] with a [`ValueMatcher`].
///
/// # INV: Missing → false
///
/// If the field is absent from the snapshot, the predicate evaluates to
/// `false`, whatever the matcher.
///
/// # Example
///
/// ```
/// use reqban::{Field, NodePath, RegexMatcher, RequestSnapshot, SinglePredicate};
///
/// let predicate = SinglePredicate::new(
///     Field::header("user-agent"),
///     RegexMatcher::new("ZmEu", true).unwrap().into(),
///     NodePath::rule(2),
/// );
///
/// let req = RequestSnapshot::builder().header("User-Agent", "zmeu").build();
/// assert!(predicate.evaluate(&req));
/// assert!(!predicate.evaluate(&RequestSnapshot::default()));
/// ```
#[derive(Debug, Clone)]
pub struct SinglePredicate {
    field: Field,
    matcher: ValueMatcher,
    path: NodePath,
}

impl SinglePredicate {
    /// Create a new leaf predicate.
    #[must_use]
    pub fn new(field: Field, matcher: ValueMatcher, path: NodePath) -> Self {
        Self {
            field,
            matcher,
            path,
        }
    }

    /// The field this predicate reads.
    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The test applied to the field.
    #[must_use]
    pub fn matcher(&self) -> &ValueMatcher {
        &self.matcher
    }

    /// Where this predicate was declared.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Evaluate this predicate against the snapshot.
    #[inline]
    pub fn evaluate(&self, req: &RequestSnapshot) -> bool {
        let value = self.field.get(req);
        if value.is_missing() {
            return false; // INV: Missing → false
        }
        self.matcher.matches(&value)
    }

    /// Evaluate with full trace for debugging.
    #[must_use]
    pub fn evaluate_with_trace(&self, req: &RequestSnapshot) -> PredicateTrace {
        let value = self.field.get(req);
        let matched = !value.is_missing() && self.matcher.matches(&value);
        PredicateTrace::Single {
            matched,
            path: self.path.to_string(),
            field: self.field.to_string(),
            value: value.to_string(),
            matcher: self.matcher.to_string(),
        }
    }
}

/// Composite predicate with boolean logic.
///
/// Evaluation uses short-circuit semantics.
///
/// # Variants
///
/// - `Single` — A leaf predicate
/// - `And` — All predicates must match (short-circuit on first false; empty is `true`)
/// - `Or` — Any predicate must match (short-circuit on first true; empty is `false`)
/// - `Unless` — Inverts the result of the inner predicate
#[derive(Debug, Clone)]
pub enum Predicate {
    /// A leaf predicate.
    Single(SinglePredicate),

    /// All predicates must match (logical AND).
    And(Vec<Predicate>),

    /// Any predicate must match (logical OR).
    Or(Vec<Predicate>),

    /// Matches iff the inner predicate does not (logical NOT).
    Unless(Box<Predicate>),
}

impl Predicate {
    /// Evaluate this predicate against the snapshot.
    ///
    /// Recursion depth is bounded by the compiler's depth limit.
    pub fn evaluate(&self, req: &RequestSnapshot) -> bool {
        match self {
            Predicate::Single(p) => p.evaluate(req),
            Predicate::And(predicates) => predicates.iter().all(|p| p.evaluate(req)),
            Predicate::Or(predicates) => predicates.iter().any(|p| p.evaluate(req)),
            Predicate::Unless(p) => !p.evaluate(req),
        }
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Unlike [`evaluate()`](Self::evaluate), this does NOT short-circuit
    /// And/Or: all children are evaluated so the trace shows every leaf.
    /// The `matched` result is still correct.
    #[must_use]
    pub fn evaluate_with_trace(&self, req: &RequestSnapshot) -> PredicateTrace {
        match self {
            Self::Single(p) => p.evaluate_with_trace(req),
            Self::And(predicates) => {
                let children: Vec<PredicateTrace> = predicates
                    .iter()
                    .map(|p| p.evaluate_with_trace(req))
                    .collect();
                let matched = children.iter().all(PredicateTrace::matched);
                PredicateTrace::And { matched, children }
            }
            Self::Or(predicates) => {
                let children: Vec<PredicateTrace> = predicates
                    .iter()
                    .map(|p| p.evaluate_with_trace(req))
                    .collect();
                let matched = children.iter().any(PredicateTrace::matched);
                PredicateTrace::Or { matched, children }
            }
            Self::Unless(p) => {
                let inner = p.evaluate_with_trace(req);
                PredicateTrace::Unless {
                    matched: !inner.matched(),
                    inner: Box::new(inner),
                }
            }
        }
    }

    /// Wrap a predicate in `Unless`.
    #[must_use]
    pub fn unless(predicate: Self) -> Self {
        Self::Unless(Box::new(predicate))
    }

    /// Returns `true` if this is a `Single` predicate.
    #[must_use]
    pub fn is_single(&self) -> bool {
        matches!(self, Predicate::Single(_))
    }

    /// Returns `true` if this is an `And` predicate.
    #[must_use]
    pub fn is_and(&self) -> bool {
        matches!(self, Predicate::And(_))
    }

    /// Returns `true` if this is an `Or` predicate.
    #[must_use]
    pub fn is_or(&self) -> bool {
        matches!(self, Predicate::Or(_))
    }

    /// Returns `true` if this is an `Unless` predicate.
    #[must_use]
    pub fn is_unless(&self) -> bool {
        matches!(self, Predicate::Unless(_))
    }

    /// Calculate the depth of this predicate tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Predicate::Single(_) => 1,
            Predicate::And(ps) | Predicate::Or(ps) => {
                1 + ps.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            Predicate::Unless(p) => 1 + p.depth(),
        }
    }

    /// Number of leaf predicates in this tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Predicate::Single(_) => 1,
            Predicate::And(ps) | Predicate::Or(ps) => ps.iter().map(Predicate::leaf_count).sum(),
            Predicate::Unless(p) => p.leaf_count(),
        }
    }
}
