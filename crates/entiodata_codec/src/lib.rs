//! # EntiOData Codec
//!
//! Simple values and their URI literal form.
//!
//! This crate provides:
//! - [`Value`], the dynamic value carried by simple properties
//! - [`SimpleType`], the `Edm.*` primitive type names
//! - numeric promotion shared by comparison and arithmetic
//! - literal encoding, used for entity key strings and paging cursors
//! - literal decoding, the inverse of the above
//!
//! ## Usage
//!
//! ```
//! use entiodata_codec::{parse_literal, to_literal, Value};
//!
//! let value = Value::from("O'Neil");
//! let text = to_literal(&value).unwrap();
//! assert_eq!(text, "'O''Neil'");
//!
//! let decoded = parse_literal(&text).unwrap();
//! assert_eq!(value, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod numeric;
mod value;

pub use decoder::{parse_literal, LiteralDecoder};
pub use encoder::{to_literal, LiteralEncoder};
pub use error::{CodecError, CodecResult};
pub use numeric::{ArithmeticOp, Numeric};
pub use value::{SimpleType, Value};

/// Trait for types that have a URI literal form.
pub trait ToLiteral {
    /// Encode this value as a literal.
    fn to_literal(&self) -> CodecResult<String>;
}

impl ToLiteral for Value {
    fn to_literal(&self) -> CodecResult<String> {
        to_literal(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Boolean),
            any::<i32>().prop_map(Value::Int32),
            any::<i64>().prop_map(Value::Int64),
            any::<u8>().prop_map(Value::Byte),
            "[ -~]{0,16}".prop_map(Value::String),
            (any::<i64>(), 0u32..10).prop_map(|(m, s)| {
                Value::Decimal(rust_decimal::Decimal::new(m, s))
            }),
            prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Binary),
        ]
    }

    proptest! {
        #[test]
        fn literal_reads_back_equal(value in value_strategy()) {
            let text = value.to_literal().unwrap();
            let decoded = parse_literal(&text).unwrap();
            prop_assert!(value.loosely_equals(&decoded) || value == decoded);
        }
    }
}
