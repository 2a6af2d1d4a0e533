//! Literal decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Decode a URI literal into a value.
///
/// Unsuffixed integers become `Int32`, or `Int64` when they do not fit.
/// Unsuffixed fractional numbers become `Decimal`.
///
/// # Errors
///
/// Returns an error if the text is not a recognized literal form.
pub fn parse_literal(text: &str) -> CodecResult<Value> {
    LiteralDecoder::new(text).decode()
}

/// A decoder for a single literal.
pub struct LiteralDecoder<'a> {
    text: &'a str,
}

const PREFIXES: [&str; 5] = ["datetimeoffset", "datetime", "time", "guid", "binary"];

impl<'a> LiteralDecoder<'a> {
    /// Create a new decoder for the given text.
    pub fn new(text: &'a str) -> Self {
        Self { text: text.trim() }
    }

    /// Decode the literal.
    pub fn decode(&self) -> CodecResult<Value> {
        let text = self.text;
        if text.is_empty() {
            return Err(CodecError::invalid_literal(text, "empty literal"));
        }

        match text {
            "null" => return Ok(Value::Null),
            "true" => return Ok(Value::Boolean(true)),
            "false" => return Ok(Value::Boolean(false)),
            _ => {}
        }

        if text.starts_with('\'') {
            return self.decode_quoted(text).map(Value::String);
        }

        if let Some(rest) = text.strip_prefix("X'").or_else(|| text.strip_prefix("x'")) {
            return self.decode_binary(rest);
        }

        for prefix in PREFIXES {
            if let Some(rest) = text.strip_prefix(prefix) {
                if rest.starts_with('\'') {
                    let inner = self.decode_quoted(rest)?;
                    return self.decode_prefixed(prefix, &inner);
                }
            }
        }

        self.decode_number(text)
    }

    fn decode_quoted(&self, quoted: &str) -> CodecResult<String> {
        let body = quoted
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .ok_or_else(|| CodecError::Unterminated {
                literal: self.text.to_string(),
            })?;

        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            if c == '\'' {
                // Embedded quotes must be doubled.
                if chars.next() != Some('\'') {
                    return Err(CodecError::invalid_literal(
                        self.text,
                        "unescaped quote inside string",
                    ));
                }
            }
            out.push(c);
        }
        Ok(out)
    }

    fn decode_prefixed(&self, prefix: &str, inner: &str) -> CodecResult<Value> {
        let invalid = |message: String| CodecError::invalid_literal(self.text, message);
        match prefix {
            "datetime" => NaiveDateTime::parse_from_str(inner, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(inner, "%Y-%m-%dT%H:%M"))
                .map(Value::DateTime)
                .map_err(|e| invalid(e.to_string())),
            "datetimeoffset" => DateTime::parse_from_rfc3339(inner)
                .map(Value::DateTimeOffset)
                .map_err(|e| invalid(e.to_string())),
            "time" => NaiveTime::parse_from_str(inner, "%H:%M:%S%.f")
                .map(Value::Time)
                .map_err(|e| invalid(e.to_string())),
            "guid" => Uuid::parse_str(inner).map(Value::Guid).map_err(|e| invalid(e.to_string())),
            "binary" => self.decode_hex(inner).map(Value::Binary),
            _ => Err(CodecError::invalid_literal(self.text, "unknown prefix")),
        }
    }

    fn decode_binary(&self, rest: &str) -> CodecResult<Value> {
        let hex = rest.strip_suffix('\'').ok_or_else(|| CodecError::Unterminated {
            literal: self.text.to_string(),
        })?;
        self.decode_hex(hex).map(Value::Binary)
    }

    fn decode_hex(&self, hex: &str) -> CodecResult<Vec<u8>> {
        if hex.len() % 2 != 0 {
            return Err(CodecError::invalid_literal(self.text, "odd number of hex digits"));
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| CodecError::invalid_literal(self.text, "invalid hex digit"))
            })
            .collect()
    }

    fn decode_number(&self, text: &str) -> CodecResult<Value> {
        let (body, suffix) = match text.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => (&text[..idx], Some(c)),
            _ => (text, None),
        };

        if body.is_empty()
            || !body
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            return Err(CodecError::invalid_literal(text, "unrecognized literal"));
        }

        let out_of_range = || CodecError::out_of_range(text);
        let invalid = || CodecError::invalid_literal(text, "malformed number");

        match suffix.map(|c| c.to_ascii_uppercase()) {
            Some('L') => body.parse::<i64>().map(Value::Int64).map_err(|_| out_of_range()),
            Some('M') => Decimal::from_str(body)
                .or_else(|_| Decimal::from_scientific(body))
                .map(Value::Decimal)
                .map_err(|_| invalid()),
            Some('D') => body.parse::<f64>().map(Value::Double).map_err(|_| invalid()),
            Some('F') => body.parse::<f32>().map(Value::Single).map_err(|_| invalid()),
            Some(_) => Err(CodecError::invalid_literal(text, "unknown numeric suffix")),
            None if body.contains(['.', 'e', 'E']) => {
                if body.contains(['e', 'E']) {
                    body.parse::<f64>().map(Value::Double).map_err(|_| invalid())
                } else {
                    Decimal::from_str(body).map(Value::Decimal).map_err(|_| invalid())
                }
            }
            None => {
                let n = body.parse::<i64>().map_err(|_| out_of_range())?;
                Ok(i32::try_from(n).map_or(Value::Int64(n), Value::Int32))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_literal;

    #[test]
    fn keywords() {
        assert_eq!(parse_literal("null").unwrap(), Value::Null);
        assert_eq!(parse_literal("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse_literal(" false ").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn integers_pick_width() {
        assert_eq!(parse_literal("2").unwrap(), Value::Int32(2));
        assert_eq!(parse_literal("-2").unwrap(), Value::Int32(-2));
        assert_eq!(parse_literal("3000000000").unwrap(), Value::Int64(3_000_000_000));
        assert_eq!(parse_literal("2L").unwrap(), Value::Int64(2));
    }

    #[test]
    fn fractional_defaults_to_decimal() {
        assert_eq!(
            parse_literal("10.0").unwrap(),
            Value::Decimal(Decimal::new(100, 1))
        );
        assert_eq!(parse_literal("2.5D").unwrap(), Value::Double(2.5));
        assert_eq!(parse_literal("1e3").unwrap(), Value::Double(1000.0));
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(parse_literal("'ALFKI'").unwrap(), Value::from("ALFKI"));
        assert_eq!(parse_literal("'O''Neil'").unwrap(), Value::from("O'Neil"));
        assert!(matches!(
            parse_literal("'open"),
            Err(CodecError::Unterminated { .. })
        ));
        assert!(parse_literal("'a'b'").is_err());
    }

    #[test]
    fn prefixed_values_read_back() {
        for text in [
            "datetime'2010-01-02T03:04:05'",
            "guid'67e55044-10b1-426f-9247-bb680e5fe0c8'",
            "X'0AFF'",
            "time'13:45:00'",
        ] {
            let value = parse_literal(text).unwrap();
            assert_eq!(to_literal(&value).unwrap(), text);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_literal("").is_err());
        assert!(parse_literal("abc").is_err());
        assert!(parse_literal("12Q").is_err());
    }
}
