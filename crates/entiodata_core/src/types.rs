//! Core type definitions for EntiOData.

use std::borrow::Cow;
use std::fmt;

/// Stable tag identifying one record shape.
///
/// Shape tags are chosen by whoever registers a record shape. They stand in
/// for the runtime type of a record wherever the engine has to find the
/// accessor, complex type, or entity set belonging to a value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(Cow<'static, str>);

impl ShapeId {
    /// Creates a shape tag from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a shape tag from any name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape:{}", self.0)
    }
}

impl From<&'static str> for ShapeId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// How many entities sit at the far end of a navigation property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Multiplicity {
    /// Exactly one related entity.
    One,
    /// Zero or one related entity.
    ZeroOrOne,
    /// Any number of related entities.
    Many,
}

impl Multiplicity {
    /// Whether this end materializes as a collection link.
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::One => "1",
            Self::ZeroOrOne => "0..1",
            Self::Many => "*",
        })
    }
}
