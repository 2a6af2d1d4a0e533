//! Opaque record handle.

use crate::types::ShapeId;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The erased payload of a record.
pub type RecordData = dyn Any + Send + Sync;

/// A shared, read-only handle to one externally owned record.
///
/// The engine never looks inside a record itself; every read goes
/// through the [`PropertyAccessor`](crate::PropertyAccessor) registered for
/// the record's [`ShapeId`].
#[derive(Clone)]
pub struct Record {
    shape: ShapeId,
    data: Arc<RecordData>,
}

impl Record {
    /// Wraps a value as a record of the given shape.
    pub fn new<T: Any + Send + Sync>(shape: impl Into<ShapeId>, value: T) -> Self {
        Self {
            shape: shape.into(),
            data: Arc::new(value),
        }
    }

    /// Wraps an already shared value.
    pub fn from_arc(shape: impl Into<ShapeId>, data: Arc<RecordData>) -> Self {
        Self {
            shape: shape.into(),
            data,
        }
    }

    /// Freezes a freshly populated record.
    pub fn from_boxed(shape: ShapeId, data: Box<RecordData>) -> Self {
        Self {
            shape,
            data: Arc::from(data),
        }
    }

    /// Returns the shape tag.
    pub fn shape(&self) -> &ShapeId {
        &self.shape
    }

    /// Returns the erased payload.
    pub fn data(&self) -> &RecordData {
        &*self.data
    }

    /// Downcasts the payload to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Whether both handles point at the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record").field("shape", &self.shape).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_round_trip() {
        let record = Record::new("Counter", 42u32);
        assert_eq!(record.shape().as_str(), "Counter");
        assert_eq!(record.downcast_ref::<u32>(), Some(&42));
        assert!(record.downcast_ref::<String>().is_none());
    }

    #[test]
    fn clones_share_payload() {
        let record = Record::new("Counter", 1u8);
        let copy = record.clone();
        assert!(record.ptr_eq(&copy));
        assert!(!record.ptr_eq(&Record::new("Counter", 1u8)));
    }

    #[test]
    fn boxed_records_freeze() {
        let boxed: Box<RecordData> = Box::new(String::from("x"));
        let record = Record::from_boxed(ShapeId::new("Text"), boxed);
        assert_eq!(record.downcast_ref::<String>().map(String::as_str), Some("x"));
    }
}
