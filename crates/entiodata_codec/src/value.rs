//! Dynamic simple value type.

use crate::numeric::Numeric;
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// The primitive types a property value can carry.
///
/// Each variant corresponds to one `Edm.*` simple type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimpleType {
    /// `Edm.Binary`
    Binary,
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.Byte`
    Byte,
    /// `Edm.SByte`
    SByte,
    /// `Edm.DateTime`
    DateTime,
    /// `Edm.DateTimeOffset`
    DateTimeOffset,
    /// `Edm.Decimal`
    Decimal,
    /// `Edm.Double`
    Double,
    /// `Edm.Single`
    Single,
    /// `Edm.Guid`
    Guid,
    /// `Edm.Int16`
    Int16,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.String`
    String,
    /// `Edm.Time`
    Time,
}

impl SimpleType {
    /// Returns the fully qualified type name, e.g. `Edm.Int32`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "Edm.Binary",
            Self::Boolean => "Edm.Boolean",
            Self::Byte => "Edm.Byte",
            Self::SByte => "Edm.SByte",
            Self::DateTime => "Edm.DateTime",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::Decimal => "Edm.Decimal",
            Self::Double => "Edm.Double",
            Self::Single => "Edm.Single",
            Self::Guid => "Edm.Guid",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::String => "Edm.String",
            Self::Time => "Edm.Time",
        }
    }

    /// Whether values of this type take part in numeric promotion.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::SByte
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Decimal
                | Self::Double
                | Self::Single
        )
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamic simple value.
///
/// `Null` is untyped; every other variant maps onto exactly one
/// [`SimpleType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 8-bit integer.
    SByte(i8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 32-bit floating point.
    Single(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Exact decimal.
    Decimal(Decimal),
    /// UTF-8 text.
    String(String),
    /// Date and time without offset.
    DateTime(NaiveDateTime),
    /// Date and time with a fixed offset.
    DateTimeOffset(DateTime<FixedOffset>),
    /// Time of day.
    Time(NaiveTime),
    /// 128-bit identifier.
    Guid(Uuid),
    /// Raw bytes.
    Binary(Vec<u8>),
}

impl Value {
    /// Returns the simple type of this value, or `None` for `Null`.
    #[must_use]
    pub fn simple_type(&self) -> Option<SimpleType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => SimpleType::Boolean,
            Value::Byte(_) => SimpleType::Byte,
            Value::SByte(_) => SimpleType::SByte,
            Value::Int16(_) => SimpleType::Int16,
            Value::Int32(_) => SimpleType::Int32,
            Value::Int64(_) => SimpleType::Int64,
            Value::Single(_) => SimpleType::Single,
            Value::Double(_) => SimpleType::Double,
            Value::Decimal(_) => SimpleType::Decimal,
            Value::String(_) => SimpleType::String,
            Value::DateTime(_) => SimpleType::DateTime,
            Value::DateTimeOffset(_) => SimpleType::DateTimeOffset,
            Value::Time(_) => SimpleType::Time,
            Value::Guid(_) => SimpleType::Guid,
            Value::Binary(_) => SimpleType::Binary,
        })
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get any integral value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(n) => Some(i64::from(*n)),
            Value::SByte(n) => Some(i64::from(*n)),
            Value::Int16(n) => Some(i64::from(*n)),
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value in its numeric promotion family, if it is numeric.
    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Value::Single(f) => Some(Numeric::Float(f64::from(*f))),
            Value::Double(f) => Some(Numeric::Float(*f)),
            Value::Decimal(d) => Some(Numeric::Decimal(*d)),
            other => other.as_i64().map(Numeric::Integer),
        }
    }

    /// Compare two values of compatible families.
    ///
    /// Numeric values are promoted to their common family before
    /// comparing. `Null` orders before every other value and NaN after
    /// every other number. Returns `None` when the operands belong to
    /// incompatible families.
    pub fn try_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DateTimeOffset(a), Value::DateTimeOffset(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTimeOffset(b)) => Some(a.cmp(&b.naive_utc())),
            (Value::DateTimeOffset(a), Value::DateTime(b)) => Some(a.naive_utc().cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
            (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
            _ => {
                let lhs = self.as_numeric()?;
                let rhs = other.as_numeric()?;
                Some(lhs.compare(&rhs))
            }
        }
    }

    /// Equality across compatible families (`Int32(2)` equals `Int64(2)`).
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.try_compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Byte(n) => write!(f, "{n}"),
            Value::SByte(n) => write!(f, "{n}"),
            Value::Int16(n) => write!(f, "{n}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Single(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeOffset(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Time(t) => write!(f, "{t}"),
            Value::Guid(g) => write!(f, "{g}"),
            Value::Binary(b) => write!(f, "{} bytes", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Byte(n)
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::Int16(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Single(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(g: Uuid) -> Self {
        Value::Guid(g)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
