//! `RequestSnapshot` — read-only view of one inbound request.
//!
//! The host server decodes the request and builds a snapshot with
//! [`RequestSnapshot::builder`]. Once built, a snapshot is never mutated.

use crate::FieldValue;
use std::collections::HashMap;

/// An attribute value carried in the snapshot's extension map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// String attribute (method, client address, ...).
    Str(String),
    /// Integer attribute (content length, TLS version, ...).
    Int(i64),
}

impl AttrValue {
    fn as_field(&self) -> FieldValue<'_> {
        match self {
            Self::Str(s) => FieldValue::Str(s),
            Self::Int(i) => FieldValue::Int(*i),
        }
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// Immutable view of one request's fields.
///
/// `path`, `host`, `port` and `protocol` are named attributes; any other
/// attribute lives in the extension map. Header names are stored lowercase.
///
/// # Example
///
/// ```
/// use reqban::{FieldValue, RequestSnapshot};
///
/// let req = RequestSnapshot::builder()
///     .path("/img/photo.jpg")
///     .host("lib.university.edu")
///     .port(443)
///     .header("User-Agent", "SomeSpiderBot")
///     .build();
///
/// assert_eq!(req.attr("path"), FieldValue::Str("/img/photo.jpg"));
/// assert_eq!(req.attr("port"), FieldValue::Int(443));
/// assert_eq!(req.header("user-agent"), Some("SomeSpiderBot"));
/// assert!(req.attr("protocol").is_missing());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    path: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    protocol: Option<String>,
    headers: HashMap<String, String>,
    attributes: HashMap<String, AttrValue>,
}

impl RequestSnapshot {
    /// Create a builder for `RequestSnapshot`.
    #[must_use]
    pub fn builder() -> RequestSnapshotBuilder {
        RequestSnapshotBuilder::default()
    }

    /// Get the request path.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the host name.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Get the port number.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Get the protocol (e.g. `http`, `https:`).
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Get a header value by name.
    ///
    /// Lookups with an already-lowercase name do not allocate.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            return self
                .headers
                .get(&name.to_ascii_lowercase())
                .map(String::as_str);
        }
        self.headers.get(name).map(String::as_str)
    }

    /// Iterate over all headers as `(lowercase name, value)`.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Generic attribute accessor.
    ///
    /// Resolves the named attributes `path`, `host`, `port` and `protocol`
    /// first, then the extension map. Unknown or unset attributes are
    /// [`FieldValue::Missing`].
    #[must_use]
    pub fn attr(&self, name: &str) -> FieldValue<'_> {
        match name {
            "path" => self.path().into(),
            "host" => self.host().into(),
            "port" => self.port.map(i64::from).into(),
            "protocol" => self.protocol().into(),
            _ => self
                .attributes
                .get(name)
                .map_or(FieldValue::Missing, AttrValue::as_field),
        }
    }
}

/// Builder for `RequestSnapshot`.
#[derive(Debug, Default)]
pub struct RequestSnapshotBuilder {
    snapshot: RequestSnapshot,
}

impl RequestSnapshotBuilder {
    /// Set the request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.snapshot.path = Some(path.into());
        self
    }

    /// Set the host name.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.snapshot.host = Some(host.into());
        self
    }

    /// Set the port number.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.snapshot.port = Some(port);
        self
    }

    /// Set the protocol.
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.snapshot.protocol = Some(protocol.into());
        self
    }

    /// Add a header (name is lowercased). A repeated name replaces the
    /// earlier value.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot
            .headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Add an extension attribute.
    ///
    /// Names that collide with `path`, `host`, `port` or `protocol` are
    /// shadowed by the named fields; use the dedicated setters for those.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.snapshot.attributes.insert(name.into(), value.into());
        self
    }

    /// Build the `RequestSnapshot`.
    #[must_use]
    pub fn build(self) -> RequestSnapshot {
        self.snapshot
    }
}
