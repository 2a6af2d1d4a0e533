//! Accessor delegates that reshape another accessor's fields.

use super::{FieldDescriptor, FieldType, FieldValue, PropertyAccessor, RecordData};
use crate::error::{CoreError, CoreResult};
use entiodata_codec::{SimpleType, Value};
use std::any::Any;
use std::sync::Arc;

/// Name of the synthetic key property added by [`KeyFunction`].
pub const ENTITY_ID_PROPERTY: &str = "EntityId";

/// Surfaces enumeration fields as `Edm.String` values.
///
/// Reads turn [`FieldValue::Enum`] into a string value; writes turn string
/// values back into enum members before handing them to the inner accessor.
pub struct EnumsAsStrings {
    inner: Arc<dyn PropertyAccessor>,
    fields: Vec<FieldDescriptor>,
}

impl EnumsAsStrings {
    /// Wraps an accessor.
    pub fn new(inner: Arc<dyn PropertyAccessor>) -> Self {
        let fields = inner
            .fields()
            .iter()
            .cloned()
            .map(|mut field| {
                if matches!(field.ty, FieldType::Enumeration(_)) {
                    field.ty = FieldType::Simple(SimpleType::String);
                }
                field
            })
            .collect();
        Self { inner, fields }
    }

    fn is_enum(&self, field: &str) -> bool {
        self.inner
            .field(field)
            .is_some_and(|f| matches!(f.ty, FieldType::Enumeration(_)))
    }

    fn outgoing(value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Enum(member) => FieldValue::Simple(Value::String(member)),
            other => other,
        }
    }

    fn incoming(value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Simple(Value::String(member)) => FieldValue::Enum(member),
            other => other,
        }
    }
}

impl PropertyAccessor for EnumsAsStrings {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn create(&self) -> CoreResult<Box<RecordData>> {
        self.inner.create()
    }

    fn get(&self, record: &RecordData, field: &str) -> CoreResult<FieldValue> {
        self.inner.get(record, field).map(Self::outgoing)
    }

    fn set(&self, record: &mut RecordData, field: &str, value: FieldValue) -> CoreResult<()> {
        let value = if self.is_enum(field) {
            Self::incoming(value)
        } else {
            value
        };
        self.inner.set(record, field, value)
    }

    fn get_collection(
        &self,
        record: &RecordData,
        field: &str,
    ) -> CoreResult<Option<Vec<FieldValue>>> {
        Ok(self
            .inner
            .get_collection(record, field)?
            .map(|values| values.into_iter().map(Self::outgoing).collect()))
    }

    fn set_collection(
        &self,
        record: &mut RecordData,
        field: &str,
        values: Vec<FieldValue>,
    ) -> CoreResult<()> {
        let values = if self.is_enum(field) {
            values.into_iter().map(Self::incoming).collect()
        } else {
            values
        };
        self.inner.set_collection(record, field, values)
    }
}

type KeyFn = Box<dyn Fn(&RecordData) -> CoreResult<Value> + Send + Sync>;

/// Adds a computed, read-only [`ENTITY_ID_PROPERTY`] key field in front of
/// another accessor's fields.
///
/// Used for record shapes with no natural key field.
pub struct KeyFunction {
    inner: Arc<dyn PropertyAccessor>,
    fields: Vec<FieldDescriptor>,
    key: KeyFn,
}

impl KeyFunction {
    /// Wraps `inner`, computing the key of each `T` record with `key`.
    pub fn new<T, V>(
        inner: Arc<dyn PropertyAccessor>,
        key_type: SimpleType,
        key: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        V: Into<Value>,
    {
        let mut fields = Vec::with_capacity(inner.fields().len() + 1);
        fields.push(FieldDescriptor {
            name: ENTITY_ID_PROPERTY.to_string(),
            ty: FieldType::Simple(key_type),
            collection: false,
            nullable: false,
        });
        fields.extend(inner.fields().iter().cloned());
        let key: KeyFn = Box::new(move |record: &RecordData| {
            record.downcast_ref::<T>().map(|r| Into::<Value>::into(key(r))).ok_or_else(|| {
                CoreError::invalid_record(format!(
                    "key function for {} handed a foreign record",
                    std::any::type_name::<T>()
                ))
            })
        });
        Self { inner, fields, key }
    }
}

impl PropertyAccessor for KeyFunction {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn create(&self) -> CoreResult<Box<RecordData>> {
        self.inner.create()
    }

    fn get(&self, record: &RecordData, field: &str) -> CoreResult<FieldValue> {
        if field == ENTITY_ID_PROPERTY {
            (self.key)(record).map(FieldValue::from)
        } else {
            self.inner.get(record, field)
        }
    }

    fn set(&self, record: &mut RecordData, field: &str, value: FieldValue) -> CoreResult<()> {
        // Derived from the record; nothing to write back.
        if field == ENTITY_ID_PROPERTY {
            return Ok(());
        }
        self.inner.set(record, field, value)
    }

    fn get_collection(
        &self,
        record: &RecordData,
        field: &str,
    ) -> CoreResult<Option<Vec<FieldValue>>> {
        self.inner.get_collection(record, field)
    }

    fn set_collection(
        &self,
        record: &mut RecordData,
        field: &str,
        values: Vec<FieldValue>,
    ) -> CoreResult<()> {
        self.inner.set_collection(record, field, values)
    }
}
