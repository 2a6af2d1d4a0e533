//! Entity keys and key strings.

use crate::error::{CoreError, CoreResult};
use entiodata_codec::{to_literal, Value};
use serde::Serialize;
use std::fmt;

/// The key of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Key of an entity type with one key field.
    Single(Value),
    /// Named key values, in declared key order.
    Composite(Vec<(String, Value)>),
}

impl EntityKey {
    /// Builds a key from declared key names and their values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] when the counts differ, no key
    /// is declared, or any value is null.
    pub fn create(names: &[String], values: Vec<Value>) -> CoreResult<Self> {
        if names.is_empty() || names.len() != values.len() {
            return Err(CoreError::invalid_key(format!(
                "expected {} key values, got {}",
                names.len(),
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(Value::is_null) {
            return Err(CoreError::invalid_key(format!("key {} is null", names[i])));
        }

        let key = if names.len() == 1 {
            values.into_iter().next().map(Self::Single)
        } else {
            Some(Self::Composite(names.iter().cloned().zip(values).collect()))
        };
        key.ok_or_else(|| CoreError::invalid_key("empty key"))
    }

    /// Number of key values.
    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Composite(pairs) => pairs.len(),
        }
    }

    /// Whether any key value is null.
    pub fn has_null(&self) -> bool {
        match self {
            Self::Single(v) => v.is_null(),
            Self::Composite(pairs) => pairs.iter().any(|(_, v)| v.is_null()),
        }
    }

    /// Encodes the key as a key string: the literal of a single value, or
    /// `Name=literal` pairs joined by commas.
    ///
    /// # Errors
    ///
    /// Fails if a value has no literal form.
    pub fn to_key_string(&self) -> CoreResult<String> {
        match self {
            Self::Single(v) => Ok(to_literal(v)?),
            Self::Composite(pairs) => {
                let mut parts = Vec::with_capacity(pairs.len());
                for (name, value) in pairs {
                    parts.push(format!("{name}={}", to_literal(value)?));
                }
                Ok(parts.join(","))
            }
        }
    }

    /// Whether `lookup` addresses this key.
    ///
    /// A single lookup value only matches single-field keys. A composite
    /// lookup must name every field of this key (case-insensitively) with
    /// an equal value.
    pub fn matches(&self, lookup: &EntityKey) -> bool {
        match (self, lookup) {
            (Self::Single(own), Self::Single(wanted)) => own.loosely_equals(wanted),
            (Self::Single(_), Self::Composite(_)) | (Self::Composite(_), Self::Single(_)) => false,
            (Self::Composite(own), Self::Composite(wanted)) => own.iter().all(|(name, value)| {
                wanted
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .is_some_and(|(_, v)| value.loosely_equals(v))
            }),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_key_string() {
            Ok(s) => write!(f, "({s})"),
            Err(_) => f.write_str("(?)"),
        }
    }
}

impl From<Value> for EntityKey {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_key_string() {
        let key = EntityKey::create(&names(&["Id"]), vec![Value::Int32(2)]).unwrap();
        assert_eq!(key.to_key_string().unwrap(), "2");
        assert_eq!(key.to_string(), "(2)");

        let key = EntityKey::from(Value::from("ALFKI"));
        assert_eq!(key.to_key_string().unwrap(), "'ALFKI'");
    }

    #[test]
    fn composite_key_string() {
        let key = EntityKey::create(
            &names(&["OrderId", "ProductId"]),
            vec![Value::Int32(1), Value::Int64(7)],
        )
        .unwrap();
        assert_eq!(key.arity(), 2);
        assert_eq!(key.to_key_string().unwrap(), "OrderId=1,ProductId=7L");
    }

    #[test]
    fn create_rejects_bad_arity_and_nulls() {
        let err = EntityKey::create(&names(&["A", "B"]), vec![Value::Int32(1)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
        assert!(EntityKey::create(&names(&["A"]), vec![Value::Null]).is_err());
        assert!(EntityKey::create(&[], vec![]).is_err());
    }

    #[test]
    fn single_lookup_matches_loosely() {
        let key = EntityKey::Single(Value::Int32(2));
        assert!(key.matches(&EntityKey::Single(Value::Int64(2))));
        assert!(!key.matches(&EntityKey::Single(Value::Int32(3))));
    }

    #[test]
    fn composite_lookup_needs_every_field() {
        let key = EntityKey::Composite(vec![
            ("OrderId".into(), Value::Int32(1)),
            ("ProductId".into(), Value::Int32(7)),
        ]);
        let full = EntityKey::Composite(vec![
            ("productid".into(), Value::Int32(7)),
            ("ORDERID".into(), Value::Int32(1)),
        ]);
        let partial = EntityKey::Composite(vec![("OrderId".into(), Value::Int32(1))]);

        assert!(key.matches(&full));
        assert!(!key.matches(&partial));
        assert!(!key.matches(&EntityKey::Single(Value::Int32(1))));
    }
}
