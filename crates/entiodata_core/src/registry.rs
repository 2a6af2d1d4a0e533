//! Registered record shapes.
//!
//! The registry maps shape tags to entity sets and complex types. It is
//! the only place the engine looks when it has to find the accessor, set,
//! or complex type that belongs to a record.

use crate::accessor::{KeyFunction, PropertyAccessor, Record, ENTITY_ID_PROPERTY};
use crate::materialize::MaterializeHooks;
use crate::types::ShapeId;
use entiodata_codec::{SimpleType, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Pulls the current records of one entity set.
///
/// Invoked on every query; the engine never caches the result.
pub trait RecordSource: Send + Sync {
    /// Returns a snapshot of the records.
    fn records(&self) -> Vec<Record>;
}

impl<F> RecordSource for F
where
    F: Fn() -> Vec<Record> + Send + Sync,
{
    fn records(&self) -> Vec<Record> {
        self()
    }
}

/// Registration of one entity set.
#[derive(Clone)]
pub struct EntitySetRegistration {
    pub(crate) set_name: String,
    pub(crate) type_name: String,
    pub(crate) shape: ShapeId,
    pub(crate) accessor: Arc<dyn PropertyAccessor>,
    pub(crate) keys: Vec<String>,
    pub(crate) source: Arc<dyn RecordSource>,
    pub(crate) hooks: Option<Arc<dyn MaterializeHooks>>,
}

impl EntitySetRegistration {
    /// Starts a registration. The entity type name defaults to the set name.
    pub fn new(
        set_name: impl Into<String>,
        shape: impl Into<ShapeId>,
        accessor: impl PropertyAccessor + 'static,
        source: impl RecordSource + 'static,
    ) -> Self {
        let set_name = set_name.into();
        Self {
            type_name: set_name.clone(),
            set_name,
            shape: shape.into(),
            accessor: Arc::new(accessor),
            keys: Vec::new(),
            source: Arc::new(source),
            hooks: None,
        }
    }

    /// Sets the entity type name.
    #[must_use]
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    /// Sets the key fields, in key order.
    #[must_use]
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys the set by a function of each `T` record instead of by fields.
    ///
    /// Adds a synthetic `EntityId` key property of type `key_type`.
    #[must_use]
    pub fn key_function<T, V>(
        mut self,
        key_type: SimpleType,
        key: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        V: Into<Value>,
    {
        self.accessor = Arc::new(KeyFunction::new::<T, V>(self.accessor, key_type, key));
        self.keys = vec![ENTITY_ID_PROPERTY.to_string()];
        self
    }

    /// Installs materialize hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: impl MaterializeHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Returns the set name.
    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Returns the entity type name.
    pub fn entity_type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the record shape.
    pub fn shape(&self) -> &ShapeId {
        &self.shape
    }

    /// Returns the key fields.
    pub fn key_fields(&self) -> &[String] {
        &self.keys
    }

    /// Returns the property accessor.
    pub fn accessor(&self) -> &Arc<dyn PropertyAccessor> {
        &self.accessor
    }

    /// Pulls the current records.
    pub fn records(&self) -> Vec<Record> {
        self.source.records()
    }

    pub(crate) fn map_accessor(
        mut self,
        f: impl FnOnce(Arc<dyn PropertyAccessor>) -> Arc<dyn PropertyAccessor>,
    ) -> Self {
        self.accessor = f(self.accessor);
        self
    }
}

impl fmt::Debug for EntitySetRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySetRegistration")
            .field("set_name", &self.set_name)
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("keys", &self.keys)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

/// Registration of one complex type.
#[derive(Clone)]
pub struct ComplexTypeRegistration {
    pub(crate) type_name: String,
    pub(crate) shape: ShapeId,
    pub(crate) accessor: Arc<dyn PropertyAccessor>,
    pub(crate) hooks: Option<Arc<dyn MaterializeHooks>>,
}

impl ComplexTypeRegistration {
    /// Starts a registration.
    pub fn new(
        type_name: impl Into<String>,
        shape: impl Into<ShapeId>,
        accessor: impl PropertyAccessor + 'static,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            shape: shape.into(),
            accessor: Arc::new(accessor),
            hooks: None,
        }
    }

    /// Installs materialize hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: impl MaterializeHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Returns the complex type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the record shape.
    pub fn shape(&self) -> &ShapeId {
        &self.shape
    }

    /// Returns the property accessor.
    pub fn accessor(&self) -> &Arc<dyn PropertyAccessor> {
        &self.accessor
    }

    pub(crate) fn map_accessor(
        mut self,
        f: impl FnOnce(Arc<dyn PropertyAccessor>) -> Arc<dyn PropertyAccessor>,
    ) -> Self {
        self.accessor = f(self.accessor);
        self
    }
}

impl fmt::Debug for ComplexTypeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexTypeRegistration")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

/// Finds the accessor for a record shape.
pub trait AccessorResolver {
    /// Returns the accessor registered for `shape`, if any.
    fn accessor_for(&self, shape: &ShapeId) -> Option<&Arc<dyn PropertyAccessor>>;
}

/// Ordered registrations of entity sets and complex types.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entity_sets: Vec<EntitySetRegistration>,
    complex_types: Vec<ComplexTypeRegistration>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity set. Returns `false` if the set name or shape is taken.
    pub fn add_entity_set(&mut self, registration: EntitySetRegistration) -> bool {
        let taken = self.entity_sets.iter().any(|r| {
            r.set_name == registration.set_name || r.shape == registration.shape
        });
        if taken {
            return false;
        }
        self.entity_sets.push(registration);
        true
    }

    /// Adds or replaces a complex type, keyed by shape.
    pub fn add_complex_type(&mut self, registration: ComplexTypeRegistration) {
        match self
            .complex_types
            .iter_mut()
            .find(|r| r.shape == registration.shape)
        {
            Some(existing) => *existing = registration,
            None => self.complex_types.push(registration),
        }
    }

    /// Entity set registrations, in registration order.
    pub fn entity_sets(&self) -> &[EntitySetRegistration] {
        &self.entity_sets
    }

    /// Complex type registrations, in registration order.
    pub fn complex_types(&self) -> &[ComplexTypeRegistration] {
        &self.complex_types
    }

    /// Looks up an entity set registration by set name.
    pub fn entity_set(&self, name: &str) -> Option<&EntitySetRegistration> {
        self.entity_sets.iter().find(|r| r.set_name == name)
    }

    /// Looks up the entity set whose records have `shape`.
    pub fn entity_by_shape(&self, shape: &ShapeId) -> Option<&EntitySetRegistration> {
        self.entity_sets.iter().find(|r| &r.shape == shape)
    }

    /// Looks up the complex type whose records have `shape`.
    pub fn complex_by_shape(&self, shape: &ShapeId) -> Option<&ComplexTypeRegistration> {
        self.complex_types.iter().find(|r| &r.shape == shape)
    }

    /// Whether no shape has been registered.
    pub fn is_empty(&self) -> bool {
        self.entity_sets.is_empty() && self.complex_types.is_empty()
    }
}

impl AccessorResolver for Registry {
    fn accessor_for(&self, shape: &ShapeId) -> Option<&Arc<dyn PropertyAccessor>> {
        self.entity_by_shape(shape)
            .map(|r| &r.accessor)
            .or_else(|| self.complex_by_shape(shape).map(|r| &r.accessor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::TypedAccessor;

    #[derive(Debug, Default, Clone)]
    struct Tag {
        id: i32,
    }

    fn tag_accessor() -> TypedAccessor<Tag> {
        TypedAccessor::new().simple("Id", SimpleType::Int32, |t: &Tag| t.id, |t, v| t.id = v)
    }

    fn tags() -> EntitySetRegistration {
        EntitySetRegistration::new("Tags", "Tag", tag_accessor(), || {
            vec![Record::new("Tag", Tag { id: 1 }), Record::new("Tag", Tag { id: 2 })]
        })
        .keys(["Id"])
    }

    #[test]
    fn registration_defaults() {
        let reg = tags();
        assert_eq!(reg.set_name(), "Tags");
        assert_eq!(reg.entity_type_name(), "Tags");
        assert_eq!(reg.key_fields(), ["Id".to_string()]);
        assert_eq!(reg.records().len(), 2);

        let reg = reg.type_name("Tag");
        assert_eq!(reg.entity_type_name(), "Tag");
    }

    #[test]
    fn rejects_duplicate_sets() {
        let mut registry = Registry::new();
        assert!(registry.add_entity_set(tags()));
        assert!(!registry.add_entity_set(tags()));
        assert_eq!(registry.entity_sets().len(), 1);
    }

    #[test]
    fn resolves_by_shape() {
        let mut registry = Registry::new();
        registry.add_entity_set(tags());
        registry.add_complex_type(ComplexTypeRegistration::new(
            "Label",
            "Label",
            tag_accessor(),
        ));

        assert!(registry.entity_by_shape(&ShapeId::from("Tag")).is_some());
        assert!(registry.complex_by_shape(&ShapeId::from("Label")).is_some());
        assert!(registry.accessor_for(&ShapeId::from("Label")).is_some());
        assert!(registry.accessor_for(&ShapeId::from("Nope")).is_none());
    }

    #[test]
    fn key_function_replaces_keys() {
        let reg = tags().key_function(SimpleType::Int64, |t: &Tag| i64::from(t.id) * 10);
        assert_eq!(reg.key_fields(), [ENTITY_ID_PROPERTY.to_string()]);
        assert_eq!(reg.accessor().fields()[0].name, ENTITY_ID_PROPERTY);
    }
}
