//! Property accessors.
//!
//! A [`PropertyAccessor`] reads and writes named fields on records of one
//! shape without the engine knowing that shape statically. Accessors are
//! built once at registration time and shared read-only by every query.

mod delegate;
mod record;
mod typed;

pub use delegate::{EnumsAsStrings, KeyFunction, ENTITY_ID_PROPERTY};
pub use record::{Record, RecordData};
pub use typed::TypedAccessor;

use crate::error::{CoreError, CoreResult};
use crate::types::ShapeId;
use chrono::NaiveDateTime;
use entiodata_codec::{SimpleType, Value};
use rust_decimal::Decimal;
use std::any::Any;
use uuid::Uuid;

/// The declared type of a field, or of the elements of a collection field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A simple value.
    Simple(SimpleType),
    /// A named enumeration; surfaced as a string by default policy.
    Enumeration(String),
    /// A nested record of the given shape.
    Record(ShapeId),
}

/// Declaration of one field on a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type; the element type for collections.
    pub ty: FieldType,
    /// Whether the field holds an ordered collection of `ty`.
    pub collection: bool,
    /// Whether the field may be null.
    pub nullable: bool,
}

impl FieldDescriptor {
    /// Declares a single-valued, nullable field.
    pub fn single(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            collection: false,
            nullable: true,
        }
    }

    /// Declares a collection field.
    pub fn collection(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            collection: true,
            nullable: true,
        }
    }
}

/// A value read from or written to a field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// No value.
    Null,
    /// A simple value.
    Simple(Value),
    /// An enumeration member, by name.
    Enum(String),
    /// A nested record.
    Record(Record),
}

impl FieldValue {
    /// Wraps a nested record value.
    pub fn record<T: Any + Send + Sync>(shape: impl Into<ShapeId>, value: T) -> Self {
        Self::Record(Record::new(shape, value))
    }

    /// Wraps an optional nested record value.
    pub fn optional_record<T: Any + Send + Sync>(
        shape: impl Into<ShapeId>,
        value: Option<T>,
    ) -> Self {
        value.map_or(Self::Null, |v| Self::record(shape, v))
    }

    /// Whether this is [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts into a concrete Rust value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] if the value has the wrong kind.
    pub fn extract<T: FromFieldValue>(self) -> CoreResult<T> {
        T::from_field_value(self)
    }

    /// Downcasts a nested record and clones its payload out.
    ///
    /// Returns `Ok(None)` for null.
    pub fn extract_record<T: Any + Clone>(self) -> CoreResult<Option<T>> {
        match self {
            Self::Null => Ok(None),
            Self::Record(record) => record.downcast_ref::<T>().cloned().map(Some).ok_or_else(|| {
                CoreError::invalid_record(format!(
                    "record of {} is not a {}",
                    record.shape(),
                    std::any::type_name::<T>()
                ))
            }),
            other => Err(CoreError::invalid_record(format!(
                "expected a nested record, got {other:?}"
            ))),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Simple(value)
        }
    }
}

/// Conversion from a [`FieldValue`] into a concrete field type.
pub trait FromFieldValue: Sized {
    /// Performs the conversion.
    fn from_field_value(value: FieldValue) -> CoreResult<Self>;
}

fn mismatch<T>(value: &FieldValue) -> CoreError {
    CoreError::invalid_record(format!(
        "cannot convert {value:?} into {}",
        std::any::type_name::<T>()
    ))
}

macro_rules! impl_from_field_value {
    ($ty:ty, $($pat:pat => $out:expr),+ $(,)?) => {
        impl FromFieldValue for $ty {
            fn from_field_value(value: FieldValue) -> CoreResult<Self> {
                match value {
                    $(FieldValue::Simple($pat) => Ok($out),)+
                    other => Err(mismatch::<$ty>(&other)),
                }
            }
        }
    };
}

impl_from_field_value!(bool, Value::Boolean(b) => b);
impl_from_field_value!(u8, Value::Byte(n) => n);
impl_from_field_value!(i16, Value::Int16(n) => n, Value::Byte(n) => i16::from(n));
impl_from_field_value!(
    i32,
    Value::Int32(n) => n,
    Value::Int16(n) => i32::from(n),
    Value::Byte(n) => i32::from(n),
);
impl_from_field_value!(
    i64,
    Value::Int64(n) => n,
    Value::Int32(n) => i64::from(n),
    Value::Int16(n) => i64::from(n),
);
impl_from_field_value!(f64, Value::Double(n) => n, Value::Single(n) => f64::from(n));
impl_from_field_value!(Decimal, Value::Decimal(d) => d, Value::Int32(n) => Decimal::from(n));
impl_from_field_value!(NaiveDateTime, Value::DateTime(dt) => dt);
impl_from_field_value!(Uuid, Value::Guid(g) => g);
impl_from_field_value!(Vec<u8>, Value::Binary(b) => b);

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> CoreResult<Self> {
        match value {
            FieldValue::Simple(Value::String(s)) | FieldValue::Enum(s) => Ok(s),
            other => Err(mismatch::<String>(&other)),
        }
    }
}

impl FromFieldValue for Value {
    fn from_field_value(value: FieldValue) -> CoreResult<Self> {
        match value {
            FieldValue::Null => Ok(Value::Null),
            FieldValue::Simple(v) => Ok(v),
            FieldValue::Enum(s) => Ok(Value::String(s)),
            other => Err(mismatch::<Value>(&other)),
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> CoreResult<Self> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

/// Reads and writes fields on records of one shape.
///
/// Implementations must be cheap to share: one accessor serves every
/// record of its shape for the lifetime of the producer.
pub trait PropertyAccessor: Send + Sync {
    /// Declared fields, in declaration order.
    fn fields(&self) -> &[FieldDescriptor];

    /// Looks up one field declaration.
    fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Type of a single-valued field.
    fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.field(name).filter(|f| !f.collection).map(|f| &f.ty)
    }

    /// Element type of a collection field.
    fn element_type(&self, name: &str) -> Option<&FieldType> {
        self.field(name).filter(|f| f.collection).map(|f| &f.ty)
    }

    /// Allocates a new, empty record of this shape.
    fn create(&self) -> CoreResult<Box<RecordData>>;

    /// Reads a single-valued field.
    fn get(&self, record: &RecordData, field: &str) -> CoreResult<FieldValue>;

    /// Writes a single-valued field.
    fn set(&self, record: &mut RecordData, field: &str, value: FieldValue) -> CoreResult<()>;

    /// Reads a collection field. `None` means the collection itself is null.
    fn get_collection(&self, record: &RecordData, field: &str)
        -> CoreResult<Option<Vec<FieldValue>>>;

    /// Replaces the contents of a collection field.
    fn set_collection(
        &self,
        record: &mut RecordData,
        field: &str,
        values: Vec<FieldValue>,
    ) -> CoreResult<()>;
}
