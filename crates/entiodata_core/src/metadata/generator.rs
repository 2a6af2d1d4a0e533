//! Derives a [`MetadataModel`] from registered accessors.

use super::model::{
    CollectionKind, CollectionType, ComplexType, EntitySet, EntityType, MetadataModel,
    NavigationProperty, Property, TypeDescriptor,
};
use crate::accessor::{FieldDescriptor, FieldType};
use crate::config::ProducerConfig;
use crate::error::CoreResult;
use crate::registry::Registry;
use crate::types::{Multiplicity, ShapeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Builds the metadata model for a registry.
///
/// Fields whose record shape is registered as an entity set become
/// navigation properties; fields whose shape is a registered complex type
/// become complex properties; anything else is dropped.
pub struct MetadataGenerator<'a> {
    registry: &'a Registry,
    namespace: &'a str,
    container_name: &'a str,
}

impl<'a> MetadataGenerator<'a> {
    /// Creates a generator.
    pub fn new(registry: &'a Registry, config: &'a ProducerConfig) -> Self {
        Self {
            registry,
            namespace: &config.namespace,
            container_name: &config.container_name,
        }
    }

    /// Generates the model.
    ///
    /// # Errors
    ///
    /// Fails if the registrations violate a model invariant, such as an
    /// undeclared key field or a duplicate type name.
    pub fn generate(&self) -> CoreResult<MetadataModel> {
        let mut complex = ComplexResolver {
            registry: self.registry,
            namespace: self.namespace,
            built: HashMap::new(),
            in_progress: HashSet::new(),
        };

        let mut entity_sets = Vec::with_capacity(self.registry.entity_sets().len());
        for reg in self.registry.entity_sets() {
            let mut properties = Vec::new();
            let mut navigation = Vec::new();

            for field in reg.accessor().fields() {
                if let Some(nav) = self.navigation(field) {
                    navigation.push(nav);
                    continue;
                }
                if let Some(mut property) = complex.structural(reg.entity_type_name(), field)? {
                    if reg.key_fields().contains(&property.name) {
                        property.nullable = false;
                    }
                    properties.push(property);
                }
            }

            let entity_type = EntityType::new(
                self.namespace,
                reg.entity_type_name(),
                reg.key_fields().to_vec(),
                properties,
                navigation,
            )?;
            entity_sets.push(EntitySet {
                name: reg.set_name().to_string(),
                entity_type: Arc::new(entity_type),
            });
        }

        let mut complex_types = Vec::with_capacity(self.registry.complex_types().len());
        for reg in self.registry.complex_types() {
            if let Some(ty) = complex.resolve(reg.shape())? {
                complex_types.push(ty);
            }
        }

        debug!(
            "Generated metadata: {} entity sets, {} complex types",
            entity_sets.len(),
            complex_types.len()
        );
        MetadataModel::new(
            self.namespace,
            self.container_name,
            entity_sets,
            complex_types,
        )
    }

    fn navigation(&self, field: &FieldDescriptor) -> Option<NavigationProperty> {
        let FieldType::Record(shape) = &field.ty else {
            return None;
        };
        let target = self.registry.entity_by_shape(shape)?;
        Some(NavigationProperty {
            name: field.name.clone(),
            multiplicity: if field.collection {
                Multiplicity::Many
            } else {
                Multiplicity::ZeroOrOne
            },
            target_type: target.entity_type_name().to_string(),
        })
    }
}

struct ComplexResolver<'a> {
    registry: &'a Registry,
    namespace: &'a str,
    built: HashMap<ShapeId, Arc<ComplexType>>,
    in_progress: HashSet<ShapeId>,
}

impl ComplexResolver<'_> {
    /// Resolves a shape to its complex type, building it on first use.
    ///
    /// `None` for unregistered shapes and for shapes that contain
    /// themselves.
    fn resolve(&mut self, shape: &ShapeId) -> CoreResult<Option<Arc<ComplexType>>> {
        if let Some(ty) = self.built.get(shape) {
            return Ok(Some(Arc::clone(ty)));
        }
        let Some(reg) = self.registry.complex_by_shape(shape) else {
            return Ok(None);
        };
        if !self.in_progress.insert(shape.clone()) {
            debug!("Complex type {} contains itself", reg.type_name());
            return Ok(None);
        }

        let mut properties = Vec::new();
        for field in reg.accessor().fields() {
            if let Some(property) = self.structural(reg.type_name(), field)? {
                properties.push(property);
            }
        }
        self.in_progress.remove(shape);

        let ty = Arc::new(ComplexType {
            namespace: self.namespace.to_string(),
            name: reg.type_name().to_string(),
            properties,
        });
        self.built.insert(shape.clone(), Arc::clone(&ty));
        Ok(Some(ty))
    }

    fn structural(&mut self, owner: &str, field: &FieldDescriptor) -> CoreResult<Option<Property>> {
        let item = match &field.ty {
            FieldType::Simple(t) => TypeDescriptor::Simple(*t),
            FieldType::Enumeration(name) => {
                debug!("Dropping {owner}.{}: enumeration {name} has no mapping", field.name);
                return Ok(None);
            }
            FieldType::Record(shape) => match self.resolve(shape)? {
                Some(ty) => TypeDescriptor::Complex(ty),
                None => {
                    debug!("Dropping {owner}.{}: no complex type for {shape}", field.name);
                    return Ok(None);
                }
            },
        };
        let ty = if field.collection {
            TypeDescriptor::Collection(Arc::new(CollectionType::new(CollectionKind::List, item)?))
        } else {
            item
        };
        Ok(Some(Property::new(field.name.clone(), ty, field.nullable)))
    }
}
