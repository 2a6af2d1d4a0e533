//! Literal encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::fmt::Write;

/// Encode a value as a URI literal.
///
/// The output follows the OData v2 literal forms so that
/// [`parse_literal`](crate::parse_literal) reads back an equal value:
/// - `Int64` carries an `L` suffix, `Decimal` an `M`, `Double` a `D`,
///   `Single` an `f`
/// - strings are single-quoted with embedded quotes doubled
/// - temporal, guid and binary values use their prefixed quoted form
///
/// # Errors
///
/// Returns [`CodecError::NonFinite`] for NaN or infinite floats.
pub fn to_literal(value: &Value) -> CodecResult<String> {
    let mut encoder = LiteralEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_string())
}

/// A literal encoder writing into a reusable buffer.
pub struct LiteralEncoder {
    buffer: String,
}

impl LiteralEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Encode a value, appending to the buffer.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        // Writing into a String never fails.
        let _ = match value {
            Value::Null => write!(self.buffer, "null"),
            Value::Boolean(b) => write!(self.buffer, "{b}"),
            Value::Byte(n) => write!(self.buffer, "{n}"),
            Value::SByte(n) => write!(self.buffer, "{n}"),
            Value::Int16(n) => write!(self.buffer, "{n}"),
            Value::Int32(n) => write!(self.buffer, "{n}"),
            Value::Int64(n) => write!(self.buffer, "{n}L"),
            Value::Single(f) => {
                if !f.is_finite() {
                    return Err(CodecError::NonFinite);
                }
                write!(self.buffer, "{f}f")
            }
            Value::Double(f) => {
                if !f.is_finite() {
                    return Err(CodecError::NonFinite);
                }
                write!(self.buffer, "{f}D")
            }
            Value::Decimal(d) => write!(self.buffer, "{d}M"),
            Value::String(s) => {
                self.encode_quoted(s);
                Ok(())
            }
            Value::DateTime(dt) => {
                write!(self.buffer, "datetime'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            Value::DateTimeOffset(dt) => write!(self.buffer, "datetimeoffset'{}'", dt.to_rfc3339()),
            Value::Time(t) => write!(self.buffer, "time'{}'", t.format("%H:%M:%S%.f")),
            Value::Guid(g) => write!(self.buffer, "guid'{g}'"),
            Value::Binary(bytes) => {
                self.buffer.push_str("X'");
                for b in bytes {
                    let _ = write!(self.buffer, "{b:02X}");
                }
                self.buffer.push('\'');
                Ok(())
            }
        };
        Ok(())
    }

    fn encode_quoted(&mut self, s: &str) {
        self.buffer.reserve(s.len() + 2);
        self.buffer.push('\'');
        for c in s.chars() {
            if c == '\'' {
                self.buffer.push('\'');
            }
            self.buffer.push(c);
        }
        self.buffer.push('\'');
    }

    /// Consume this encoder and return the encoded text.
    pub fn into_string(self) -> String {
        self.buffer
    }

    /// Get a reference to the encoded text.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl Default for LiteralEncoder {
    fn default() -> Self {
        Self::new()
    }
}
