//! Wire entity to record reconstruction.

use super::hooks::{MaterializeHooks, WireSource};
use crate::accessor::{FieldType, FieldValue, PropertyAccessor, Record, RecordData};
use crate::entity::{find_property, CollectionItem, LinkKind, PropertyValue, WireEntity, WireProperty};
use crate::error::{CoreError, CoreResult};
use crate::metadata::{MetadataModel, Property, TypeDescriptor};
use crate::registry::Registry;
use crate::types::ShapeId;
use std::sync::Arc;

/// Rebuilds records from wire entities and complex values.
///
/// Every call allocates fresh records; nothing is shared with the wire
/// graph it reads from.
pub struct RecordMaterializer<'a> {
    registry: &'a Registry,
    model: &'a MetadataModel,
}

impl<'a> RecordMaterializer<'a> {
    /// Creates a materializer.
    pub fn new(registry: &'a Registry, model: &'a MetadataModel) -> Self {
        Self { registry, model }
    }

    /// Builds a record of `shape` from `entity`, including inline links.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingProperty`] when a non-nullable property
    /// is absent, [`CoreError::NotFound`] when `shape` is not an entity set,
    /// and any error raised by the accessor or the hooks.
    pub fn to_record(&self, entity: &WireEntity, shape: &ShapeId) -> CoreResult<Record> {
        let registration = self.registry.entity_by_shape(shape).ok_or_else(|| {
            CoreError::not_found(format!("no entity set for {shape}"))
        })?;
        let set = self.model.entity_set(registration.set_name())?;
        let accessor = registration.accessor().as_ref();
        let source = WireSource::Entity(entity);

        let mut data = accessor.create()?;
        before(registration.hooks.as_ref(), &mut *data, source)?;
        self.fill(&mut *data, accessor, set.entity_type.properties(), entity.properties())?;

        for nav in set.entity_type.navigation_properties() {
            let Some(link) = entity.link(&nav.name) else {
                continue;
            };
            match &link.kind {
                LinkKind::Deferred { .. } => {}
                LinkKind::InlineEntity { entity: related } => {
                    let value = match related {
                        Some(related) => {
                            let target = field_shape(accessor.field_type(&nav.name), &nav.name)?;
                            FieldValue::Record(self.to_record(related, target)?)
                        }
                        None => FieldValue::Null,
                    };
                    accessor.set(&mut *data, &nav.name, value)?;
                }
                LinkKind::InlineEntities { entities } => {
                    let target = field_shape(accessor.element_type(&nav.name), &nav.name)?;
                    let records = entities
                        .iter()
                        .map(|related| self.to_record(related, target).map(FieldValue::Record))
                        .collect::<CoreResult<Vec<_>>>()?;
                    accessor.set_collection(&mut *data, &nav.name, records)?;
                }
            }
        }

        after(registration.hooks.as_ref(), &mut *data, source)?;
        Ok(Record::from_boxed(shape.clone(), data))
    }

    /// Builds a record of `shape` from the properties of a complex value.
    ///
    /// # Errors
    ///
    /// As [`RecordMaterializer::to_record`], with `shape` expected to be a
    /// complex type.
    pub fn to_complex_record(
        &self,
        properties: &[WireProperty],
        shape: &ShapeId,
    ) -> CoreResult<Record> {
        let registration = self.registry.complex_by_shape(shape).ok_or_else(|| {
            CoreError::not_found(format!("no complex type for {shape}"))
        })?;
        let complex = self
            .model
            .complex_type(registration.type_name())
            .ok_or_else(|| {
                CoreError::not_found(format!("complex type {}", registration.type_name()))
            })?;
        let accessor = registration.accessor().as_ref();
        let source = WireSource::Complex(properties);

        let mut data = accessor.create()?;
        before(registration.hooks.as_ref(), &mut *data, source)?;
        self.fill(&mut *data, accessor, &complex.properties, properties)?;
        after(registration.hooks.as_ref(), &mut *data, source)?;
        Ok(Record::from_boxed(shape.clone(), data))
    }

    fn fill(
        &self,
        data: &mut RecordData,
        accessor: &dyn PropertyAccessor,
        declared: &[Property],
        wire: &[WireProperty],
    ) -> CoreResult<()> {
        for property in declared {
            let name = property.name.as_str();
            let Some(source) = find_property(wire, name) else {
                if property.nullable {
                    continue;
                }
                return Err(CoreError::missing_property(name));
            };

            match (&property.ty, &source.value) {
                (TypeDescriptor::Simple(_), PropertyValue::Simple(v)) => {
                    accessor.set(data, name, FieldValue::from(v.clone()))?;
                }
                (TypeDescriptor::Complex(_), PropertyValue::Complex(None)) => {
                    accessor.set(data, name, FieldValue::Null)?;
                }
                (TypeDescriptor::Complex(_), PropertyValue::Complex(Some(props))) => {
                    let shape = field_shape(accessor.field_type(name), name)?;
                    let nested = self.to_complex_record(props, shape)?;
                    accessor.set(data, name, FieldValue::Record(nested))?;
                }
                (TypeDescriptor::Collection(_), PropertyValue::Collection(collection)) => {
                    let mut values = Vec::with_capacity(collection.items.len());
                    for item in &collection.items {
                        values.push(match item {
                            CollectionItem::Simple(v) => FieldValue::from(v.clone()),
                            CollectionItem::Complex(props) => {
                                let shape = field_shape(accessor.element_type(name), name)?;
                                FieldValue::Record(self.to_complex_record(props, shape)?)
                            }
                        });
                    }
                    accessor.set_collection(data, name, values)?;
                }
                (ty, _) => {
                    return Err(CoreError::invalid_record(format!(
                        "{name} carries a value that does not fit {ty}"
                    )))
                }
            }
        }
        Ok(())
    }
}

fn field_shape<'f>(ty: Option<&'f FieldType>, name: &str) -> CoreResult<&'f ShapeId> {
    match ty {
        Some(FieldType::Record(shape)) => Ok(shape),
        _ => Err(CoreError::invalid_record(format!(
            "{name} is not a nested record field"
        ))),
    }
}

fn before(
    hooks: Option<&Arc<dyn MaterializeHooks>>,
    data: &mut RecordData,
    source: WireSource<'_>,
) -> CoreResult<()> {
    match hooks {
        Some(hooks) => hooks.before_materialize(data, source),
        None => Ok(()),
    }
}

fn after(
    hooks: Option<&Arc<dyn MaterializeHooks>>,
    data: &mut RecordData,
    source: WireSource<'_>,
) -> CoreResult<()> {
    match hooks {
        Some(hooks) => hooks.after_materialize(data, source),
        None => Ok(()),
    }
}
