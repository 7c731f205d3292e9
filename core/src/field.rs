//! `Field` — which part of the request a predicate looks at.
//!
//! A field selector extracts a [`FieldValue`] from a [`RequestSnapshot`].
//! Selectors are resolved once at compile time; extraction borrows from the
//! snapshot and never allocates for lowercase header names, which is all the
//! compiler produces.

use crate::{FieldValue, RequestSnapshot};
use std::fmt;

/// Selects one field of a request.
///
/// # INV: absent → Missing
///
/// An absent header or unset attribute yields [`FieldValue::Missing`], which
/// every matcher evaluates to `false`.
///
/// # Example
///
/// ```
/// use reqban::{Field, FieldValue, RequestSnapshot};
///
/// let req = RequestSnapshot::builder()
///     .path("/setup.php")
///     .header("user-agent", "ZmEu")
///     .build();
///
/// assert_eq!(Field::attr("path").get(&req), FieldValue::Str("/setup.php"));
/// assert_eq!(Field::header("User-Agent").get(&req), FieldValue::Str("ZmEu"));
/// assert!(Field::header("referer").get(&req).is_missing());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A named attribute (`path`, `host`, `port`, `protocol` or an extension).
    Attr(String),
    /// A header, by lowercase name.
    Header(String),
}

impl Field {
    /// Select a named attribute.
    pub fn attr(name: impl Into<String>) -> Self {
        Self::Attr(name.into())
    }

    /// Select a header. The name is lowercased.
    pub fn header(name: impl Into<String>) -> Self {
        Self::Header(name.into().to_ascii_lowercase())
    }

    /// Extract this field from the snapshot.
    #[inline]
    #[must_use]
    pub fn get<'r>(&self, req: &'r RequestSnapshot) -> FieldValue<'r> {
        match self {
            Self::Attr(name) => req.attr(name),
            Self::Header(name) => req.header(name).into(),
        }
    }

    /// The attribute or header name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Attr(name) | Self::Header(name) => name,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => write!(f, "attr:{name}"),
            Self::Header(name) => write!(f, "header:{name}"),
        }
    }
}
