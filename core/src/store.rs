//! Lock-free ruleset store with hot-swapping
//!
//! Readers call [`RulesetStore::evaluate`] (or hold a [`RulesetStore::current`]
//! snapshot) without locking. A reload compiles the new ruleset completely
//! before swapping it in; a failed reload leaves the active ruleset untouched.

use crate::{CompileError, CompileWarning, Compiler, RequestSnapshot, Ruleset, Verdict};
use arc_swap::ArcSwap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The active ruleset of a running server.
///
/// An evaluation in flight keeps using the ruleset it loaded, even if a
/// swap happens mid-request; it never sees a mix of old and new rules.
///
/// # Example
///
/// ```
/// use reqban::{Compiler, RequestSnapshot, RulesetStore};
/// use serde_json::json;
///
/// let store = RulesetStore::empty();
/// let req = RequestSnapshot::builder().path("/wp-login.php").build();
/// assert!(!store.evaluate(&req).matched);
///
/// let compiler = Compiler::default();
/// store.reload(&compiler, &json!([{ "attr": "path", "is": "/wp-login.php" }])).unwrap();
/// assert!(store.evaluate(&req).matched);
///
/// // A broken reload keeps the previous rules.
/// assert!(store.reload(&compiler, &json!([{ "attr": "path" }])).is_err());
/// assert!(store.evaluate(&req).matched);
/// assert_eq!(store.version(), 1);
/// ```
#[derive(Debug)]
pub struct RulesetStore {
    ruleset: ArcSwap<Ruleset>,
    /// Number of successful swaps since construction.
    version: AtomicU64,
}

impl RulesetStore {
    /// Create a store with an initial ruleset (version 0).
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset: ArcSwap::from_pointee(ruleset),
            version: AtomicU64::new(0),
        }
    }

    /// Create a store that allows every request until rules are loaded.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Ruleset::empty())
    }

    /// The ruleset currently in effect.
    #[must_use]
    pub fn current(&self) -> Arc<Ruleset> {
        self.ruleset.load_full()
    }

    /// Evaluate a request against the current ruleset.
    #[inline]
    pub fn evaluate(&self, req: &RequestSnapshot) -> Verdict {
        self.ruleset.load().evaluate(req)
    }

    /// Atomically replace the active ruleset.
    pub fn replace(&self, ruleset: Ruleset) {
        let rules = ruleset.len();
        self.ruleset.store(Arc::new(ruleset));
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(rules, version, "ban ruleset activated");
    }

    /// Compile `raw` and, only if it compiles, make it the active ruleset.
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`]; the previously active ruleset stays in
    /// effect.
    pub fn reload(
        &self,
        compiler: &Compiler,
        raw: &Value,
    ) -> Result<Vec<CompileWarning>, CompileError> {
        match compiler.compile(raw) {
            Ok(compiled) => {
                self.replace(compiled.ruleset);
                Ok(compiled.warnings)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    version = self.version(),
                    "ruleset reload rejected, keeping current rules"
                );
                Err(e)
            }
        }
    }

    /// Number of successful swaps so far.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl Default for RulesetStore {
    fn default() -> Self {
        Self::empty()
    }
}
