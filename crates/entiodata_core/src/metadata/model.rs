//! Immutable metadata descriptors.

use crate::error::{CoreError, CoreResult};
use crate::types::Multiplicity;
use entiodata_codec::SimpleType;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The type of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A simple type.
    Simple(SimpleType),
    /// A complex type.
    Complex(Arc<ComplexType>),
    /// A collection of simple or complex items.
    Collection(Arc<CollectionType>),
    /// An entity type.
    Entity(Arc<EntityType>),
}

impl TypeDescriptor {
    /// Fully qualified type name, e.g. `Edm.Int32` or `List(Shop.LineItem)`.
    pub fn full_name(&self) -> String {
        match self {
            Self::Simple(t) => t.name().to_string(),
            Self::Complex(t) => t.full_name(),
            Self::Collection(t) => t.full_name(),
            Self::Entity(t) => t.full_name(),
        }
    }

    /// Whether this is a simple type.
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// Returns the simple type, if this is one.
    pub fn as_simple(&self) -> Option<SimpleType> {
        match self {
            Self::Simple(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the complex type, if this is one.
    pub fn as_complex(&self) -> Option<&Arc<ComplexType>> {
        match self {
            Self::Complex(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_name())
    }
}

/// Flavor of a collection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CollectionKind {
    /// Unordered, duplicates allowed.
    Bag,
    /// Ordered.
    List,
    /// Unspecified.
    Collection,
}

impl CollectionKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Bag => "Bag",
            Self::List => "List",
            Self::Collection => "Collection",
        }
    }
}

/// A collection of simple or complex items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionType {
    kind: CollectionKind,
    item: TypeDescriptor,
}

impl CollectionType {
    /// Creates a collection type.
    ///
    /// # Errors
    ///
    /// Fails if `item` is itself a collection or an entity type.
    pub fn new(kind: CollectionKind, item: TypeDescriptor) -> CoreResult<Self> {
        match item {
            TypeDescriptor::Collection(_) => Err(CoreError::invalid_metadata(
                "collection items cannot be collections",
            )),
            TypeDescriptor::Entity(_) => Err(CoreError::invalid_metadata(
                "collection items cannot be entity types",
            )),
            item => Ok(Self { kind, item }),
        }
    }

    /// Returns the collection kind.
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Returns the item type.
    pub fn item(&self) -> &TypeDescriptor {
        &self.item
    }

    /// Name in `Kind(Item)` form.
    pub fn full_name(&self) -> String {
        format!("{}({})", self.kind.as_str(), self.item.full_name())
    }
}

/// A structural property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property type.
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    /// Whether the property may be null.
    pub nullable: bool,
}

impl Property {
    /// Creates a property.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
        }
    }
}

/// A named structured type without identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexType {
    /// Schema namespace.
    pub namespace: String,
    /// Type name.
    pub name: String,
    /// Properties, in declaration order.
    pub properties: Vec<Property>,
}

impl ComplexType {
    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A relationship from one entity type to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationProperty {
    /// Navigation property name.
    pub name: String,
    /// Multiplicity of the far end.
    pub multiplicity: Multiplicity,
    /// Name of the target entity type.
    pub target_type: String,
}

/// A keyed structured type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityType {
    namespace: String,
    name: String,
    keys: Vec<String>,
    properties: Vec<Property>,
    navigation: Vec<NavigationProperty>,
}

impl EntityType {
    /// Creates an entity type.
    ///
    /// # Errors
    ///
    /// Fails if there are no keys, or a key is not among `properties`.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        keys: Vec<String>,
        properties: Vec<Property>,
        navigation: Vec<NavigationProperty>,
    ) -> CoreResult<Self> {
        let name = name.into();
        if keys.is_empty() {
            return Err(CoreError::invalid_metadata(format!(
                "entity type {name} declares no key"
            )));
        }
        if let Some(missing) = keys
            .iter()
            .find(|k| !properties.iter().any(|p| &p.name == *k))
        {
            return Err(CoreError::invalid_metadata(format!(
                "key {missing} is not a property of {name}"
            )));
        }
        Ok(Self {
            namespace: namespace.into(),
            name,
            keys,
            properties,
            navigation,
        })
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Key property names, in key order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Structural properties, in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Navigation properties, in declaration order.
    pub fn navigation_properties(&self) -> &[NavigationProperty] {
        &self.navigation
    }

    /// Looks up a structural property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a navigation property.
    pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation.iter().find(|n| n.name == name)
    }
}

/// A named collection of entities of one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySet {
    /// Set name.
    pub name: String,
    /// Entity type of every member.
    pub entity_type: Arc<EntityType>,
}

/// The complete, immutable model of one producer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataModel {
    namespace: String,
    container_name: String,
    entity_sets: Vec<EntitySet>,
    entity_types: Vec<Arc<EntityType>>,
    complex_types: Vec<Arc<ComplexType>>,
}

impl MetadataModel {
    /// Assembles a model.
    ///
    /// # Errors
    ///
    /// Fails on duplicate set, entity type, or complex type names.
    pub fn new(
        namespace: impl Into<String>,
        container_name: impl Into<String>,
        entity_sets: Vec<EntitySet>,
        complex_types: Vec<Arc<ComplexType>>,
    ) -> CoreResult<Self> {
        ensure_unique("entity set", entity_sets.iter().map(|s| s.name.as_str()))?;
        ensure_unique(
            "entity type",
            entity_sets.iter().map(|s| s.entity_type.name()),
        )?;
        ensure_unique("complex type", complex_types.iter().map(|t| t.name.as_str()))?;

        let entity_types = entity_sets.iter().map(|s| Arc::clone(&s.entity_type)).collect();
        Ok(Self {
            namespace: namespace.into(),
            container_name: container_name.into(),
            entity_sets,
            entity_types,
            complex_types,
        })
    }

    /// Returns the schema namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the entity container name.
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Entity sets, in registration order.
    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    /// Entity types, in registration order.
    pub fn entity_types(&self) -> &[Arc<EntityType>] {
        &self.entity_types
    }

    /// Complex types, in registration order.
    pub fn complex_types(&self) -> &[Arc<ComplexType>] {
        &self.complex_types
    }

    /// Looks up an entity set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown name.
    pub fn entity_set(&self, name: &str) -> CoreResult<&EntitySet> {
        self.find_entity_set(name)
            .ok_or_else(|| CoreError::not_found(format!("entity set {name}")))
    }

    /// Looks up an entity set without failing.
    pub fn find_entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    /// Finds the one set whose members have the named entity type.
    pub fn entity_set_for_type(&self, type_name: &str) -> Option<&EntitySet> {
        self.entity_sets
            .iter()
            .find(|s| s.entity_type.name() == type_name)
    }

    /// Looks up an entity type by name.
    pub fn entity_type(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.entity_types.iter().find(|t| t.name() == name)
    }

    /// Looks up a complex type by name.
    pub fn complex_type(&self, name: &str) -> Option<&Arc<ComplexType>> {
        self.complex_types.iter().find(|t| t.name == name)
    }
}

fn ensure_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CoreError::invalid_metadata(format!(
                "duplicate {kind} name {name}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_type() -> EntityType {
        EntityType::new(
            "Shop",
            "Order",
            vec!["Id".into()],
            vec![
                Property::new("Id", TypeDescriptor::Simple(SimpleType::Int32), false),
                Property::new("Total", TypeDescriptor::Simple(SimpleType::Decimal), true),
            ],
            vec![NavigationProperty {
                name: "Customer".into(),
                multiplicity: Multiplicity::ZeroOrOne,
                target_type: "Customer".into(),
            }],
        )
        .unwrap()
    }

    #[test]
    fn entity_type_requires_declared_keys() {
        let err = EntityType::new(
            "Shop",
            "Order",
            vec!["Missing".into()],
            vec![Property::new("Id", TypeDescriptor::Simple(SimpleType::Int32), false)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMetadata { .. }));

        assert!(EntityType::new("Shop", "Order", vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn collections_cannot_nest() {
        let inner = CollectionType::new(
            CollectionKind::List,
            TypeDescriptor::Simple(SimpleType::String),
        )
        .unwrap();
        assert_eq!(inner.full_name(), "List(Edm.String)");

        let nested = CollectionType::new(
            CollectionKind::Bag,
            TypeDescriptor::Collection(Arc::new(inner)),
        );
        assert!(nested.is_err());
    }

    #[test]
    fn model_lookup() {
        let order = Arc::new(order_type());
        let model = MetadataModel::new(
            "Shop",
            "Container",
            vec![EntitySet {
                name: "Orders".into(),
                entity_type: Arc::clone(&order),
            }],
            vec![],
        )
        .unwrap();

        assert_eq!(model.entity_set("Orders").unwrap().entity_type.name(), "Order");
        assert!(model.entity_set("Nope").unwrap_err().is_not_found());
        assert_eq!(model.entity_set_for_type("Order").unwrap().name, "Orders");
        assert_eq!(order.full_name(), "Shop.Order");
        assert!(order.navigation_property("Customer").is_some());
    }

    #[test]
    fn model_rejects_duplicate_sets() {
        let order = Arc::new(order_type());
        let set = EntitySet {
            name: "Orders".into(),
            entity_type: order,
        };
        let err = MetadataModel::new("Shop", "Container", vec![set.clone(), set], vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn type_names_serialize_as_strings() {
        let property = Property::new("Tags", TypeDescriptor::Simple(SimpleType::Guid), true);
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(json["type"], "Edm.Guid");
    }
}
