//! Evaluation trace types for debugging ban decisions.
//!
//! Trace types mirror the runtime types ([`Predicate`](crate::Predicate),
//! [`Ruleset`](crate::Ruleset)) but capture evaluation results instead of
//! inputs. Use `evaluate_with_trace()` to see why a request was (or was not)
//! banned.
//!
//! # Two Levels of Trace
//!
//! - [`PredicateTrace`] — Per-predicate: which sub-expressions matched?
//! - [`EvalTrace`] — Per-ruleset: which rules were checked, which one fired?
//!
//! # Example
//!
//! ```ignore
//! let trace = ruleset.evaluate_with_trace(&req);
//! println!("Verdict: {:?}", trace.verdict);
//! for step in &trace.steps {
//!     println!("  rule[{}]: matched={}", step.index, step.matched);
//! }
//! ```

use crate::Verdict;
use std::fmt;

/// Trace of a predicate evaluation.
///
/// In And/Or, ALL children are evaluated (no short-circuit) for maximum
/// debugging value. The `matched` result is still correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateTrace {
    /// A leaf predicate evaluation.
    Single {
        /// Whether this predicate matched.
        matched: bool,
        /// Where the predicate was declared (e.g. `"[3].AND[1]"`).
        path: String,
        /// The field read (e.g. `"header:user-agent"`).
        field: String,
        /// The value extracted from the snapshot (`"<missing>"` when absent).
        value: String,
        /// The test applied (e.g. `"matches /spider/i"`).
        matcher: String,
    },
    /// AND: all children must match.
    And {
        /// Whether all children matched.
        matched: bool,
        /// Trace of each child (all evaluated, no short-circuit).
        children: Vec<PredicateTrace>,
    },
    /// OR: any child must match.
    Or {
        /// Whether any child matched.
        matched: bool,
        /// Trace of each child (all evaluated, no short-circuit).
        children: Vec<PredicateTrace>,
    },
    /// UNLESS: inverts inner result.
    Unless {
        /// Whether the UNLESS predicate matched (i.e., inner did NOT match).
        matched: bool,
        /// Trace of the inner predicate.
        inner: Box<PredicateTrace>,
    },
}

impl PredicateTrace {
    /// Get the overall match result of this predicate.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::Single { matched, .. }
            | Self::And { matched, .. }
            | Self::Or { matched, .. }
            | Self::Unless { matched, .. } => *matched,
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let mark = if self.matched() { "+" } else { "-" };
        let pad = "  ".repeat(indent);
        match self {
            Self::Single {
                path,
                field,
                value,
                matcher,
                ..
            } => writeln!(f, "{pad}{mark} {path}: {field} {matcher} (got {value})"),
            Self::And { children, .. } | Self::Or { children, .. } => {
                let name = if matches!(self, Self::And { .. }) {
                    "AND"
                } else {
                    "OR"
                };
                writeln!(f, "{pad}{mark} {name}")?;
                children
                    .iter()
                    .try_for_each(|child| child.write_tree(f, indent + 1))
            }
            Self::Unless { inner, .. } => {
                writeln!(f, "{pad}{mark} UNLESS")?;
                inner.write_tree(f, indent + 1)
            }
        }
    }
}

impl fmt::Display for PredicateTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Trace of a full [`Ruleset`](crate::Ruleset) evaluation.
///
/// # INV: `verdict` == `evaluate()` result
///
/// The `verdict` field always equals what
/// [`Ruleset::evaluate()`](crate::Ruleset::evaluate) returns for the same
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The final verdict (identical to what `evaluate()` returns).
    pub verdict: Verdict,
    /// Trace of each rule that was evaluated (in order).
    /// Stops after the first match (preserves first-match-wins).
    pub steps: Vec<EvalStep>,
}

/// One top-level rule's evaluation in a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalStep {
    /// Index in the ruleset (0-based).
    pub index: usize,
    /// The rule's name, or its node path when unnamed.
    pub rule: String,
    /// Did the rule match?
    pub matched: bool,
    /// Full predicate evaluation trace.
    pub predicate_trace: PredicateTrace,
}

impl fmt::Display for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "rule {} ({}):", step.index, step.rule)?;
            step.predicate_trace.write_tree(f, 1)?;
        }
        write!(f, "=> {}", self.verdict)
    }
}
