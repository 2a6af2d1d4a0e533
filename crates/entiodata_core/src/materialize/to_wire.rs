//! Record to wire entity projection.

use crate::accessor::{FieldValue, PropertyAccessor, Record, RecordData};
use crate::config::ProducerConfig;
use crate::entity::{
    CollectionItem, CollectionValue, EntityKey, WireEntity, WireLink, WireProperty,
};
use crate::error::{CoreError, CoreResult};
use crate::metadata::{
    CollectionType, EntitySet, MetadataModel, NavigationProperty, Property, TypeDescriptor,
};
use crate::query::SelectExpandState;
use crate::registry::{EntitySetRegistration, Registry};
use entiodata_codec::Value;
use std::sync::Arc;
use tracing::trace;

/// Projects records into wire entities.
pub struct EntityMaterializer<'a> {
    registry: &'a Registry,
    model: &'a MetadataModel,
    include_null_properties: bool,
}

impl<'a> EntityMaterializer<'a> {
    /// Creates a materializer.
    pub fn new(registry: &'a Registry, model: &'a MetadataModel, config: &ProducerConfig) -> Self {
        Self {
            registry,
            model,
            include_null_properties: config.include_null_properties,
        }
    }

    /// Builds the wire entity for `record`, a member of `set`.
    ///
    /// Navigation properties are emitted as deferred links unless `state`
    /// expands them, in which case the related records are materialized
    /// recursively with `state` narrowed to the navigation.
    ///
    /// # Errors
    ///
    /// Fails if a key value is missing, an accessor rejects the record, or
    /// a related record belongs to no entity set.
    pub fn to_wire_entity(
        &self,
        set: &EntitySet,
        record: &Record,
        state: &mut SelectExpandState,
    ) -> CoreResult<WireEntity> {
        let registration = self.registration(set)?;
        let accessor = registration.accessor();
        let data = record.data();
        let entity_type = &set.entity_type;

        let key = self.extract_key(set, accessor.as_ref(), data)?;

        let mut properties = Vec::with_capacity(entity_type.properties().len());
        for property in entity_type.properties() {
            if !state.is_selected(&property.name) {
                continue;
            }
            if let Some(wire) = self.project(data, accessor.as_ref(), property)? {
                properties.push(wire);
            }
        }

        let mut links = Vec::with_capacity(entity_type.navigation_properties().len());
        for nav in entity_type.navigation_properties() {
            if !state.is_selected(&nav.name) {
                continue;
            }
            if !state.is_expanded(&nav.name) {
                links.push(WireLink::deferred(&nav.name, nav.multiplicity.is_many()));
                continue;
            }
            state.navigate(&nav.name);
            let link = self.inline_link(nav, accessor.as_ref(), data, state);
            state.pop();
            links.push(link?);
        }

        Ok(WireEntity::new(set, key, properties, links)?.with_record(record.clone()))
    }

    /// Reads the key of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if a key value is null or not a
    /// simple value.
    pub fn extract_key(
        &self,
        set: &EntitySet,
        accessor: &dyn PropertyAccessor,
        record: &RecordData,
    ) -> CoreResult<EntityKey> {
        let names = set.entity_type.keys();
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            let value = match accessor.get(record, name)? {
                FieldValue::Simple(v) => v,
                FieldValue::Enum(member) => Value::String(member),
                FieldValue::Null => {
                    return Err(CoreError::invalid_key(format!(
                        "key {name} of {} is null",
                        set.name
                    )))
                }
                FieldValue::Record(_) => {
                    return Err(CoreError::invalid_key(format!(
                        "key {name} of {} is not a simple value",
                        set.name
                    )))
                }
            };
            values.push(value);
        }
        EntityKey::create(names, values)
    }

    /// Projects one structural property. `None` when the property is
    /// omitted: a null under the exclude-nulls policy, or a complex value
    /// whose shape has no complex type.
    ///
    /// # Errors
    ///
    /// Fails if the accessor cannot read the property, or if a collection
    /// of complex values holds a null element.
    pub fn project(
        &self,
        record: &RecordData,
        accessor: &dyn PropertyAccessor,
        property: &Property,
    ) -> CoreResult<Option<WireProperty>> {
        let name = property.name.as_str();
        match &property.ty {
            TypeDescriptor::Simple(_) => {
                let value = simple_value(accessor.get(record, name)?, name)?;
                if value.is_null() && !self.include_null_properties {
                    return Ok(None);
                }
                Ok(Some(WireProperty::simple(name, property.ty.clone(), value)))
            }
            TypeDescriptor::Complex(_) => match accessor.get(record, name)? {
                FieldValue::Null if self.include_null_properties => {
                    Ok(Some(WireProperty::complex(name, property.ty.clone(), None)))
                }
                FieldValue::Null => Ok(None),
                FieldValue::Record(nested) => Ok(self
                    .complex_properties(&nested)?
                    .map(|props| WireProperty::complex(name, property.ty.clone(), Some(props)))),
                other => Err(CoreError::invalid_record(format!(
                    "{name} should hold a nested record, got {other:?}"
                ))),
            },
            TypeDescriptor::Collection(collection) => {
                match accessor.get_collection(record, name)? {
                    None if !self.include_null_properties => Ok(None),
                    values => self
                        .collection(collection, values.unwrap_or_default(), name)
                        .map(|value| value.map(|v| WireProperty::collection(name, property.ty.clone(), v))),
                }
            }
            TypeDescriptor::Entity(_) => Ok(None),
        }
    }

    fn collection(
        &self,
        collection: &Arc<CollectionType>,
        values: Vec<FieldValue>,
        name: &str,
    ) -> CoreResult<Option<CollectionValue>> {
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            let item = match collection.item() {
                TypeDescriptor::Complex(_) => match value {
                    FieldValue::Record(nested) => match self.complex_properties(&nested)? {
                        Some(props) => CollectionItem::Complex(props),
                        None => return Ok(None),
                    },
                    FieldValue::Null => {
                        return Err(CoreError::invalid_record(format!(
                            "{name} holds a null complex item"
                        )))
                    }
                    other => {
                        return Err(CoreError::invalid_record(format!(
                            "{name} items should be nested records, got {other:?}"
                        )))
                    }
                },
                _ => CollectionItem::Simple(simple_value(value, name)?),
            };
            items.push(item);
        }
        Ok(Some(CollectionValue {
            item_type: collection.item().clone(),
            items,
        }))
    }

    /// Properties of a complex value, or `None` when its shape has no
    /// complex type.
    fn complex_properties(&self, nested: &Record) -> CoreResult<Option<Vec<WireProperty>>> {
        let Some(registration) = self.registry.complex_by_shape(nested.shape()) else {
            trace!("Dropping complex value of unmapped {}", nested.shape());
            return Ok(None);
        };
        let Some(complex) = self.model.complex_type(registration.type_name()) else {
            trace!("Dropping complex value of {}: not in metadata", registration.type_name());
            return Ok(None);
        };

        let accessor = registration.accessor();
        let mut props = Vec::with_capacity(complex.properties.len());
        for property in &complex.properties {
            if let Some(wire) = self.project(nested.data(), accessor.as_ref(), property)? {
                props.push(wire);
            }
        }
        Ok(Some(props))
    }

    fn inline_link(
        &self,
        nav: &NavigationProperty,
        accessor: &dyn PropertyAccessor,
        record: &RecordData,
        state: &mut SelectExpandState,
    ) -> CoreResult<WireLink> {
        if nav.multiplicity.is_many() {
            let mut entities = Vec::new();
            for related in related_records(accessor, record, nav)? {
                let set = self.set_for(&related)?;
                entities.push(self.to_wire_entity(set, &related, state)?);
            }
            Ok(WireLink::inline_entities(&nav.name, entities))
        } else {
            let entity = match related_records(accessor, record, nav)?.into_iter().next() {
                Some(related) => Some(self.to_wire_entity(self.set_for(&related)?, &related, state)?),
                None => None,
            };
            Ok(WireLink::inline_entity(&nav.name, entity))
        }
    }

    /// Finds the entity set of a related record by its shape.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the shape is not an entity set.
    pub fn set_for(&self, record: &Record) -> CoreResult<&'a EntitySet> {
        let registration = self.registry.entity_by_shape(record.shape()).ok_or_else(|| {
            CoreError::not_found(format!("no entity set for {}", record.shape()))
        })?;
        self.model.entity_set(registration.set_name())
    }

    fn registration(&self, set: &EntitySet) -> CoreResult<&'a EntitySetRegistration> {
        self.registry
            .entity_set(&set.name)
            .ok_or_else(|| CoreError::not_found(format!("entity set {}", set.name)))
    }
}

/// Records at the far end of a navigation property, in source order.
///
/// # Errors
///
/// Fails if the accessor cannot read the navigation field.
pub fn related_records(
    accessor: &dyn PropertyAccessor,
    record: &RecordData,
    nav: &NavigationProperty,
) -> CoreResult<Vec<Record>> {
    let values = if nav.multiplicity.is_many() {
        accessor.get_collection(record, &nav.name)?.unwrap_or_default()
    } else {
        vec![accessor.get(record, &nav.name)?]
    };
    values
        .into_iter()
        .filter_map(|value| match value {
            FieldValue::Record(related) => Some(Ok(related)),
            FieldValue::Null => None,
            other => Some(Err(CoreError::invalid_record(format!(
                "{} should hold entity records, got {other:?}",
                nav.name
            )))),
        })
        .collect()
}

fn simple_value(value: FieldValue, name: &str) -> CoreResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Simple(v) => Ok(v),
        FieldValue::Enum(member) => Ok(Value::String(member)),
        FieldValue::Record(_) => Err(CoreError::invalid_record(format!(
            "{name} should hold a simple value"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{FieldDescriptor, TypedAccessor};
    use crate::entity::PropertyValue;
    use crate::metadata::MetadataGenerator;
    use crate::registry::ComplexTypeRegistration;
    use entiodata_codec::SimpleType;

    #[derive(Debug, Default, Clone)]
    struct Item {
        sku: String,
    }

    #[derive(Debug, Default, Clone)]
    struct Basket {
        id: i32,
        items: Vec<Item>,
    }

    /// Appends a null element to every collection it reads.
    struct TrailingNull(TypedAccessor<Basket>);

    impl PropertyAccessor for TrailingNull {
        fn fields(&self) -> &[FieldDescriptor] {
            self.0.fields()
        }

        fn create(&self) -> CoreResult<Box<RecordData>> {
            self.0.create()
        }

        fn get(&self, record: &RecordData, field: &str) -> CoreResult<FieldValue> {
            self.0.get(record, field)
        }

        fn set(&self, record: &mut RecordData, field: &str, value: FieldValue) -> CoreResult<()> {
            self.0.set(record, field, value)
        }

        fn get_collection(
            &self,
            record: &RecordData,
            field: &str,
        ) -> CoreResult<Option<Vec<FieldValue>>> {
            let mut values = self.0.get_collection(record, field)?;
            if let Some(values) = values.as_mut() {
                values.push(FieldValue::Null);
            }
            Ok(values)
        }

        fn set_collection(
            &self,
            record: &mut RecordData,
            field: &str,
            values: Vec<FieldValue>,
        ) -> CoreResult<()> {
            self.0.set_collection(record, field, values)
        }
    }

    fn registry(accessor: impl PropertyAccessor + 'static) -> Registry {
        let mut registry = Registry::new();
        registry.add_complex_type(ComplexTypeRegistration::new(
            "Item",
            "item",
            TypedAccessor::<Item>::new().simple(
                "Sku",
                SimpleType::String,
                |i: &Item| i.sku.clone(),
                |i, v| i.sku = v,
            ),
        ));
        assert!(registry.add_entity_set(
            EntitySetRegistration::new("Baskets", "basket", accessor, Vec::<Record>::new)
                .keys(["Id"])
        ));
        registry
    }

    fn basket_accessor() -> TypedAccessor<Basket> {
        TypedAccessor::<Basket>::new()
            .simple("Id", SimpleType::Int32, |b: &Basket| b.id, |b, v| b.id = v)
            .not_null()
            .record_collection("Items", "item", |b: &Basket| b.items.clone(), |b, v| b.items = v)
    }

    fn basket() -> Record {
        Record::new(
            "basket",
            Basket {
                id: 1,
                items: vec![Item {
                    sku: "A-1".to_string(),
                }],
            },
        )
    }

    fn materialize(registry: &Registry) -> CoreResult<WireEntity> {
        let config = ProducerConfig::default();
        let model = MetadataGenerator::new(registry, &config).generate()?;
        let set = model.entity_set("Baskets")?;
        EntityMaterializer::new(registry, &model, &config).to_wire_entity(
            set,
            &basket(),
            &mut SelectExpandState::default(),
        )
    }

    #[test]
    fn complex_collections_keep_every_item() {
        let entity = materialize(&registry(basket_accessor())).unwrap();
        assert_eq!(entity.key(), &EntityKey::from(Value::Int32(1)));
        match &entity.property("Items").unwrap().value {
            PropertyValue::Collection(items) => assert_eq!(items.items.len(), 1),
            other => panic!("unexpected items {other:?}"),
        }
    }

    #[test]
    fn null_complex_items_are_rejected() {
        let err = materialize(&registry(TrailingNull(basket_accessor()))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord { .. }));
    }
}
