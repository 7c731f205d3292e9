//! `NodePath` — where a node sits in the rule description.
//!
//! Paths are built by the compiler while it walks the raw rules and are
//! carried by compiled nodes, errors, warnings and verdicts, so a problem or
//! a match can always be traced back to the exact rule that caused it.

use std::fmt;

/// One step from a parent node to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Position in a list (top-level rules, `AND`/`OR` children).
    Index(usize),
    /// A key of a rule object (`AND`, `OR`, `UNLESS`, `matches`, ...).
    Key(String),
}

/// Position of a node in the rule description.
///
/// Displays as `[4].AND[1].UNLESS`; the root renders as `$`.
///
/// # Example
///
/// ```
/// use reqban::NodePath;
///
/// let path = NodePath::root().index(4).key("AND").index(1).key("UNLESS");
/// assert_eq!(path.to_string(), "[4].AND[1].UNLESS");
/// assert_eq!(path.rule_index(), Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    /// The root of the rule description.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the top-level rule at `index`.
    #[must_use]
    pub fn rule(index: usize) -> Self {
        Self::root().index(index)
    }

    /// Extend with a list position.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.child(Segment::Index(index))
    }

    /// Extend with an object key.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(Segment::Key(key.into()))
    }

    fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// The path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Index of the top-level rule this path belongs to.
    #[must_use]
    pub fn rule_index(&self) -> Option<usize> {
        match self.segments.first() {
            Some(Segment::Index(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(idx) => write!(f, "[{idx}]")?,
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}
