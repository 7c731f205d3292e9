//! Ruleset — ordered ban rules with first-match-wins semantics
//!
//! The `Ruleset` is the entry point for evaluation. It holds the compiled
//! top-level rules and evaluates them in declaration order, reporting the
//! first one that matches.

use crate::{EvalStep, EvalTrace, NodePath, Predicate, RequestSnapshot};
use std::fmt;
use std::sync::Arc;

/// The outcome of evaluating a ruleset against one request.
///
/// `matched == true` means the request should be banned, and
/// `rule_index`/`rule_path` identify the rule responsible. A verdict with no
/// match means "allow".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether any rule matched.
    pub matched: bool,
    /// Index of the matching rule in declaration order.
    pub rule_index: Option<usize>,
    /// The matching rule's name, or its node path (e.g. `"[3]"`) when unnamed.
    pub rule_path: Option<Arc<str>>,
}

impl Verdict {
    /// The no-match verdict.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            matched: false,
            rule_index: None,
            rule_path: None,
        }
    }

    fn ban(rule: &Rule) -> Self {
        Self {
            matched: true,
            rule_index: Some(rule.index),
            rule_path: Some(Arc::clone(&rule.id)),
        }
    }

    /// Returns `true` if the request should be banned.
    #[must_use]
    pub fn is_ban(&self) -> bool {
        self.matched
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.rule_index, &self.rule_path) {
            (Some(index), Some(path)) if self.matched => write!(f, "BAN rule {index} ({path})"),
            _ => f.write_str("ALLOW"),
        }
    }
}

/// One compiled top-level rule.
#[derive(Debug, Clone)]
pub struct Rule {
    index: usize,
    path: NodePath,
    name: Option<String>,
    id: Arc<str>,
    predicate: Predicate,
}

impl Rule {
    /// Create a rule at position `index`.
    ///
    /// The rule's identifier is `name` when given, else its node path.
    #[must_use]
    pub fn new(index: usize, name: Option<String>, predicate: Predicate) -> Self {
        let path = NodePath::rule(index);
        let id: Arc<str> = name
            .as_deref()
            .map_or_else(|| Arc::from(path.to_string()), Arc::from);
        Self {
            index,
            path,
            name,
            id,
            predicate,
        }
    }

    /// Position in the ruleset.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Node path of the rule (`[index]`).
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// The optional `name` label.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name, or the node path when unnamed.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The rule's predicate tree.
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Evaluate this rule against the snapshot.
    #[inline]
    pub fn matches(&self, req: &RequestSnapshot) -> bool {
        self.predicate.evaluate(req)
    }
}

/// An ordered, immutable sequence of compiled rules.
///
/// Build one with the [`Compiler`](crate::Compiler) (or [`Ruleset::new`] for
/// hand-assembled rules), then share it freely: a `Ruleset` is `Send + Sync`
/// and evaluation takes `&self`.
///
/// # INV: First-match-wins
///
/// Rules are evaluated in order. The first matching rule terminates
/// evaluation, even if later rules would also match.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Ruleset {
    /// Create a ruleset from already-compiled rules.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// A ruleset with no rules; every request is allowed.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Evaluate the ruleset against a snapshot.
    ///
    /// Returns the verdict for the first matching rule, or
    /// [`Verdict::allow`] when nothing matches.
    pub fn evaluate(&self, req: &RequestSnapshot) -> Verdict {
        match self.rules.iter().find(|rule| rule.matches(req)) {
            Some(rule) => {
                tracing::trace!(rule = %rule.id, index = rule.index, "request matched ban rule");
                Verdict::ban(rule)
            }
            None => Verdict::allow(),
        }
    }

    /// Evaluate with full trace for debugging.
    ///
    /// Rules are traced in order up to and including the first match.
    #[must_use]
    pub fn evaluate_with_trace(&self, req: &RequestSnapshot) -> EvalTrace {
        let mut steps = Vec::new();
        for rule in &self.rules {
            let predicate_trace = rule.predicate.evaluate_with_trace(req);
            let matched = predicate_trace.matched();
            steps.push(EvalStep {
                index: rule.index,
                rule: rule.id.to_string(),
                matched,
                predicate_trace,
            });
            if matched {
                return EvalTrace {
                    verdict: Verdict::ban(rule),
                    steps,
                };
            }
        }
        EvalTrace {
            verdict: Verdict::allow(),
            steps,
        }
    }

    /// Indices of every rule that matches, in order.
    ///
    /// Useful for auditing overlapping rules; the verdict only ever reports
    /// the first.
    #[must_use]
    pub fn matching_rules(&self, req: &RequestSnapshot) -> Vec<usize> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(req))
            .map(Rule::index)
            .collect()
    }

    /// The rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Maximum predicate depth over all rules.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.rules
            .iter()
            .map(|rule| rule.predicate.depth())
            .max()
            .unwrap_or(0)
    }
}
