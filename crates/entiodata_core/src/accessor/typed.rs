//! Closure-backed accessor for concrete Rust record types.

use super::{FieldDescriptor, FieldType, FieldValue, FromFieldValue, PropertyAccessor, RecordData};
use crate::error::{CoreError, CoreResult};
use crate::types::ShapeId;
use entiodata_codec::{SimpleType, Value};
use std::any::Any;
use std::fmt;

type Getter<T> = Box<dyn Fn(&T) -> FieldValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, FieldValue) -> CoreResult<()> + Send + Sync>;
type CollectionGetter<T> = Box<dyn Fn(&T) -> Option<Vec<FieldValue>> + Send + Sync>;
type CollectionSetter<T> = Box<dyn Fn(&mut T, Vec<FieldValue>) -> CoreResult<()> + Send + Sync>;

enum Slot<T> {
    Single {
        get: Getter<T>,
        set: Setter<T>,
    },
    Collection {
        get: CollectionGetter<T>,
        set: CollectionSetter<T>,
    },
}

/// A [`PropertyAccessor`] for records of type `T`, assembled from one
/// getter/setter pair per field.
///
/// ```
/// use entiodata_core::{PropertyAccessor, TypedAccessor};
/// use entiodata_codec::SimpleType;
///
/// #[derive(Default)]
/// struct Tag {
///     id: i32,
///     label: Option<String>,
/// }
///
/// let accessor = TypedAccessor::<Tag>::new()
///     .simple("Id", SimpleType::Int32, |t| t.id, |t, v| t.id = v)
///     .not_null()
///     .simple("Label", SimpleType::String, |t| t.label.clone(), |t, v| t.label = v);
///
/// assert_eq!(accessor.fields().len(), 2);
/// assert!(!accessor.fields()[0].nullable);
/// ```
pub struct TypedAccessor<T> {
    fields: Vec<FieldDescriptor>,
    slots: Vec<Slot<T>>,
}

impl<T> TypedAccessor<T>
where
    T: Default + Any + Send + Sync,
{
    /// Creates an accessor with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Adds a simple-typed field.
    ///
    /// Use an `Option<_>` field type for nullable values; reading `None`
    /// yields [`FieldValue::Null`].
    #[must_use]
    pub fn simple<V>(
        self,
        name: &str,
        ty: SimpleType,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self
    where
        V: Into<Value> + FromFieldValue + 'static,
    {
        self.push(
            FieldDescriptor::single(name, FieldType::Simple(ty)),
            Slot::Single {
                get: Box::new(move |record: &T| FieldValue::from(Into::<Value>::into(get(record)))),
                set: Box::new(move |record: &mut T, value: FieldValue| {
                    set(record, value.extract::<V>()?);
                    Ok(())
                }),
            },
        )
    }

    /// Adds an enumeration field, exchanged by member name.
    #[must_use]
    pub fn enumeration(
        self,
        name: &str,
        enum_name: &str,
        get: impl Fn(&T) -> String + Send + Sync + 'static,
        set: impl Fn(&mut T, &str) -> CoreResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.push(
            FieldDescriptor::single(name, FieldType::Enumeration(enum_name.to_string())),
            Slot::Single {
                get: Box::new(move |record: &T| FieldValue::Enum(get(record))),
                set: Box::new(move |record: &mut T, value: FieldValue| {
                    let member = value.extract::<String>()?;
                    set(record, &member)
                }),
            },
        )
    }

    /// Adds a single nested-record field: a complex value or a single
    /// related entity, depending on how `shape` is registered.
    #[must_use]
    pub fn record<R>(
        self,
        name: &str,
        shape: impl Into<ShapeId>,
        get: impl Fn(&T) -> Option<R> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<R>) + Send + Sync + 'static,
    ) -> Self
    where
        R: Clone + Any + Send + Sync,
    {
        let shape = shape.into();
        let tag = shape.clone();
        self.push(
            FieldDescriptor::single(name, FieldType::Record(shape)),
            Slot::Single {
                get: Box::new(move |record: &T| FieldValue::optional_record(tag.clone(), get(record))),
                set: Box::new(move |record: &mut T, value: FieldValue| {
                    set(record, value.extract_record::<R>()?);
                    Ok(())
                }),
            },
        )
    }

    /// Adds a collection of simple values.
    #[must_use]
    pub fn simple_collection<V>(
        self,
        name: &str,
        ty: SimpleType,
        get: impl Fn(&T) -> Vec<V> + Send + Sync + 'static,
        set: impl Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: Into<Value> + FromFieldValue + 'static,
    {
        self.push(
            FieldDescriptor::collection(name, FieldType::Simple(ty)),
            Slot::Collection {
                get: Box::new(move |record: &T| {
                    Some(
                        get(record)
                            .into_iter()
                            .map(|v| FieldValue::from(Into::<Value>::into(v)))
                            .collect(),
                    )
                }),
                set: Box::new(move |record: &mut T, values: Vec<FieldValue>| {
                    let values = values
                        .into_iter()
                        .map(FieldValue::extract::<V>)
                        .collect::<CoreResult<Vec<_>>>()?;
                    set(record, values);
                    Ok(())
                }),
            },
        )
    }

    /// Adds a collection of nested records: complex values or related
    /// entities, depending on how `shape` is registered.
    #[must_use]
    pub fn record_collection<R>(
        self,
        name: &str,
        shape: impl Into<ShapeId>,
        get: impl Fn(&T) -> Vec<R> + Send + Sync + 'static,
        set: impl Fn(&mut T, Vec<R>) + Send + Sync + 'static,
    ) -> Self
    where
        R: Clone + Any + Send + Sync,
    {
        let shape = shape.into();
        let tag = shape.clone();
        self.push(
            FieldDescriptor::collection(name, FieldType::Record(shape)),
            Slot::Collection {
                get: Box::new(move |record: &T| {
                    Some(
                        get(record)
                            .into_iter()
                            .map(|item| FieldValue::record(tag.clone(), item))
                            .collect(),
                    )
                }),
                set: Box::new(move |record: &mut T, values: Vec<FieldValue>| {
                    let mut items = Vec::with_capacity(values.len());
                    for value in values {
                        if let Some(item) = value.extract_record::<R>()? {
                            items.push(item);
                        }
                    }
                    set(record, items);
                    Ok(())
                }),
            },
        )
    }

    /// Marks the most recently added field as non-nullable.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.nullable = false;
        }
        self
    }

    fn push(mut self, field: FieldDescriptor, slot: Slot<T>) -> Self {
        self.fields.push(field);
        self.slots.push(slot);
        self
    }

    fn slot(&self, name: &str) -> CoreResult<&Slot<T>> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| &self.slots[i])
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "no field {name} on {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    fn downcast<'a>(&self, record: &'a RecordData) -> CoreResult<&'a T> {
        record.downcast_ref::<T>().ok_or_else(Self::wrong_record)
    }

    fn downcast_mut<'a>(&self, record: &'a mut RecordData) -> CoreResult<&'a mut T> {
        record.downcast_mut::<T>().ok_or_else(Self::wrong_record)
    }

    fn wrong_record() -> CoreError {
        CoreError::invalid_record(format!(
            "accessor for {} handed a foreign record",
            std::any::type_name::<T>()
        ))
    }
}

impl<T> Default for TypedAccessor<T>
where
    T: Default + Any + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAccessor")
            .field("type", &std::any::type_name::<T>())
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T> PropertyAccessor for TypedAccessor<T>
where
    T: Default + Any + Send + Sync,
{
    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn create(&self) -> CoreResult<Box<RecordData>> {
        Ok(Box::new(T::default()))
    }

    fn get(&self, record: &RecordData, field: &str) -> CoreResult<FieldValue> {
        let record = self.downcast(record)?;
        match self.slot(field)? {
            Slot::Single { get, .. } => Ok(get(record)),
            Slot::Collection { .. } => Err(CoreError::invalid_record(format!(
                "{field} is a collection field"
            ))),
        }
    }

    fn set(&self, record: &mut RecordData, field: &str, value: FieldValue) -> CoreResult<()> {
        let slot = self.slot(field)?;
        let record = self.downcast_mut(record)?;
        match slot {
            Slot::Single { set, .. } => set(record, value),
            Slot::Collection { .. } => Err(CoreError::invalid_record(format!(
                "{field} is a collection field"
            ))),
        }
    }

    fn get_collection(
        &self,
        record: &RecordData,
        field: &str,
    ) -> CoreResult<Option<Vec<FieldValue>>> {
        let record = self.downcast(record)?;
        match self.slot(field)? {
            Slot::Collection { get, .. } => Ok(get(record)),
            Slot::Single { .. } => Err(CoreError::invalid_record(format!(
                "{field} is not a collection field"
            ))),
        }
    }

    fn set_collection(
        &self,
        record: &mut RecordData,
        field: &str,
        values: Vec<FieldValue>,
    ) -> CoreResult<()> {
        let slot = self.slot(field)?;
        let record = self.downcast_mut(record)?;
        match slot {
            Slot::Collection { set, .. } => set(record, values),
            Slot::Single { .. } => Err(CoreError::invalid_record(format!(
                "{field} is not a collection field"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Shape {
        name: String,
        area: Option<Decimal>,
        origin: Option<Point>,
        tags: Vec<String>,
        corners: Vec<Point>,
        kind: String,
    }

    fn point_accessor() -> TypedAccessor<Point> {
        TypedAccessor::new()
            .simple("X", SimpleType::Int32, |p: &Point| p.x, |p, v| p.x = v)
            .simple("Y", SimpleType::Int32, |p: &Point| p.y, |p, v| p.y = v)
    }

    fn shape_accessor() -> TypedAccessor<Shape> {
        TypedAccessor::new()
            .simple("Name", SimpleType::String, |s: &Shape| s.name.clone(), |s, v| s.name = v)
            .not_null()
            .simple("Area", SimpleType::Decimal, |s: &Shape| s.area, |s, v| s.area = v)
            .record("Origin", "Point", |s: &Shape| s.origin.clone(), |s, v| s.origin = v)
            .simple_collection(
                "Tags",
                SimpleType::String,
                |s: &Shape| s.tags.clone(),
                |s, v| s.tags = v,
            )
            .record_collection(
                "Corners",
                "Point",
                |s: &Shape| s.corners.clone(),
                |s, v| s.corners = v,
            )
            .enumeration(
                "Kind",
                "ShapeKind",
                |s: &Shape| s.kind.clone(),
                |s, v| {
                    s.kind = v.to_string();
                    Ok(())
                },
            )
    }

    fn sample() -> Shape {
        Shape {
            name: "tri".into(),
            area: None,
            origin: Some(Point { x: 1, y: 2 }),
            tags: vec!["a".into(), "b".into()],
            corners: vec![Point { x: 0, y: 0 }, Point { x: 3, y: 0 }],
            kind: "Polygon".into(),
        }
    }

    #[test]
    fn declares_fields_in_order() {
        let accessor = shape_accessor();
        let names: Vec<_> = accessor.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Name", "Area", "Origin", "Tags", "Corners", "Kind"]);
        assert!(!accessor.fields()[0].nullable);
        assert!(accessor.fields()[1].nullable);
        assert_eq!(
            accessor.element_type("Corners"),
            Some(&FieldType::Record(ShapeId::from("Point")))
        );
        assert_eq!(accessor.field_type("Corners"), None);
    }

    #[test]
    fn reads_simple_and_null_values() {
        let accessor = shape_accessor();
        let shape = sample();
        let name = accessor.get(&shape, "Name").unwrap();
        assert!(matches!(name, FieldValue::Simple(Value::String(ref s)) if s == "tri"));
        assert!(accessor.get(&shape, "Area").unwrap().is_null());
        assert!(matches!(accessor.get(&shape, "Kind").unwrap(), FieldValue::Enum(_)));
    }

    #[test]
    fn reads_nested_records() {
        let accessor = shape_accessor();
        let shape = sample();
        let FieldValue::Record(origin) = accessor.get(&shape, "Origin").unwrap() else {
            panic!("expected record");
        };
        assert_eq!(origin.shape().as_str(), "Point");
        let x = point_accessor().get(origin.data(), "X").unwrap();
        assert!(matches!(x, FieldValue::Simple(Value::Int32(1))));
    }

    #[test]
    fn writes_into_fresh_record() {
        let accessor = shape_accessor();
        let mut record = accessor.create().unwrap();
        accessor
            .set(&mut *record, "Name", FieldValue::from(Value::from("sq")))
            .unwrap();
        accessor
            .set(&mut *record, "Origin", FieldValue::record("Point", Point { x: 5, y: 6 }))
            .unwrap();
        accessor
            .set_collection(
                &mut *record,
                "Tags",
                vec![FieldValue::from(Value::from("x"))],
            )
            .unwrap();
        accessor
            .set(&mut *record, "Kind", FieldValue::Enum("Box".into()))
            .unwrap();

        let shape = record.downcast_ref::<Shape>().unwrap();
        assert_eq!(shape.name, "sq");
        assert_eq!(shape.origin, Some(Point { x: 5, y: 6 }));
        assert_eq!(shape.tags, vec!["x".to_string()]);
        assert_eq!(shape.kind, "Box");
    }

    #[test]
    fn collections_round_trip() {
        let accessor = shape_accessor();
        let shape = sample();
        let corners = accessor.get_collection(&shape, "Corners").unwrap().unwrap();
        assert_eq!(corners.len(), 2);

        let mut record = accessor.create().unwrap();
        accessor
            .set_collection(&mut *record, "Corners", corners)
            .unwrap();
        assert_eq!(record.downcast_ref::<Shape>().unwrap().corners, shape.corners);
    }

    #[test]
    fn rejects_unknown_fields_and_foreign_records() {
        let accessor = shape_accessor();
        let shape = sample();
        assert!(accessor.get(&shape, "Missing").unwrap_err().is_not_found());
        let err = accessor.get(&Point::default(), "Name").unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord { .. }));
        assert!(accessor.get(&shape, "Tags").is_err());
        assert!(accessor.get_collection(&shape, "Name").is_err());
    }

    #[test]
    fn rejects_null_for_required_values() {
        let accessor = point_accessor();
        let mut record = accessor.create().unwrap();
        assert!(accessor.set(&mut *record, "X", FieldValue::Null).is_err());
    }
}
