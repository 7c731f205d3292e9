//! `FieldValue` — Type-erased data that flows between a [`Field`](crate::Field) and a
//! [`ValueMatcher`](crate::ValueMatcher)
//!
//! Fields produce `FieldValue`, matchers consume it. Values borrow from the
//! [`RequestSnapshot`](crate::RequestSnapshot), so extracting a field never
//! allocates.

use std::fmt;

/// A value extracted from a request snapshot.
///
/// # Variants
///
/// - `Missing` — The snapshot has no such field (absent header, unset attribute)
/// - `Str` — String data (paths, hosts, header values)
/// - `Int` — Integer data (port, numeric attributes)
///
/// # INV: Missing → false
///
/// Every matcher evaluates `Missing` to `false`. This includes numeric
/// comparisons with `!=`: an absent field is never "not equal" to anything.
///
/// # Example
///
/// ```
/// use reqban::FieldValue;
///
/// let value = FieldValue::Str("/admin");
/// assert_eq!(value.as_str(), Some("/admin"));
/// assert!(!value.is_missing());
/// assert!(FieldValue::Missing.is_missing());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// No data available.
    Missing,

    /// String data.
    Str(&'a str),

    /// Integer data.
    Int(i64),
}

impl<'a> FieldValue<'a> {
    /// Returns `true` if this is the `Missing` variant.
    #[inline]
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the string if this is a `Str` value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int` value.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of this value.
    ///
    /// Integers convert directly. Strings are parsed after trimming
    /// surrounding whitespace; anything that is not a finite number yields
    /// `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Str(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Returns a static string naming the value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Str(_) => "string",
            Self::Int(_) => "int",
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("<missing>"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl<'a, T> From<Option<T>> for FieldValue<'a>
where
    T: Into<FieldValue<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}
