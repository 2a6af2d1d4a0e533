//! Wire entities: the protocol-facing form of a record.

mod key;
mod link;
mod property;

pub use key::EntityKey;
pub use link::{LinkKind, WireLink};
pub use property::{find_property, CollectionItem, CollectionValue, PropertyValue, WireProperty};

use crate::accessor::Record;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntitySet, EntityType};
use serde::Serialize;
use std::sync::Arc;

/// One entity: its set, key, properties and navigation links.
///
/// Entities produced by the query engine keep a handle to the record they
/// were materialized from.
#[derive(Debug, Clone, Serialize)]
pub struct WireEntity {
    entity_set: String,
    #[serde(serialize_with = "serialize_type_name")]
    entity_type: Arc<EntityType>,
    key: EntityKey,
    properties: Vec<WireProperty>,
    links: Vec<WireLink>,
    #[serde(skip)]
    record: Option<Record>,
}

fn serialize_type_name<S: serde::Serializer>(
    ty: &Arc<EntityType>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ty.full_name())
}

impl WireEntity {
    /// Creates an entity of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if the key has a null value or its
    /// arity differs from the declared key fields.
    pub fn new(
        set: &EntitySet,
        key: EntityKey,
        properties: Vec<WireProperty>,
        links: Vec<WireLink>,
    ) -> CoreResult<Self> {
        let declared = set.entity_type.keys().len();
        if key.arity() != declared {
            return Err(CoreError::invalid_key(format!(
                "{} declares {declared} key fields, key has {}",
                set.entity_type.name(),
                key.arity()
            )));
        }
        if key.has_null() {
            return Err(CoreError::invalid_key(format!(
                "null key value for {}",
                set.entity_type.name()
            )));
        }
        Ok(Self {
            entity_set: set.name.clone(),
            entity_type: Arc::clone(&set.entity_type),
            key,
            properties,
            links,
            record: None,
        })
    }

    /// Attaches the originating record.
    #[must_use]
    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Returns the entity set name.
    pub fn entity_set(&self) -> &str {
        &self.entity_set
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Returns the key.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Encodes the key as a key string.
    pub fn key_string(&self) -> CoreResult<String> {
        self.key.to_key_string()
    }

    /// Returns the properties, in declaration order.
    pub fn properties(&self) -> &[WireProperty] {
        &self.properties
    }

    /// Looks up a property.
    pub fn property(&self, name: &str) -> Option<&WireProperty> {
        find_property(&self.properties, name)
    }

    /// Returns the links, in declaration order.
    pub fn links(&self) -> &[WireLink] {
        &self.links
    }

    /// Looks up a link.
    pub fn link(&self, name: &str) -> Option<&WireLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Returns the originating record, if any.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }
}

impl PartialEq for WireEntity {
    fn eq(&self, other: &Self) -> bool {
        self.entity_set == other.entity_set
            && self.key == other.key
            && self.properties == other.properties
            && self.links == other.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Property, TypeDescriptor};
    use entiodata_codec::{SimpleType, Value};

    fn pairs_set() -> EntitySet {
        let ty = EntityType::new(
            "Shop",
            "Pair",
            vec!["A".into(), "B".into()],
            vec![
                Property::new("A", TypeDescriptor::Simple(SimpleType::Int32), false),
                Property::new("B", TypeDescriptor::Simple(SimpleType::Int32), false),
            ],
            vec![],
        )
        .unwrap();
        EntitySet {
            name: "Pairs".into(),
            entity_type: Arc::new(ty),
        }
    }

    #[test]
    fn key_arity_checked() {
        let set = pairs_set();
        let err = WireEntity::new(&set, EntityKey::Single(Value::Int32(1)), vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }

    #[test]
    fn null_key_rejected() {
        let set = pairs_set();
        let key = EntityKey::Composite(vec![
            ("A".into(), Value::Int32(1)),
            ("B".into(), Value::Null),
        ]);
        assert!(WireEntity::new(&set, key, vec![], vec![]).is_err());
    }

    #[test]
    fn serializes_type_by_name() {
        let set = pairs_set();
        let key = EntityKey::Composite(vec![
            ("A".into(), Value::Int32(1)),
            ("B".into(), Value::Int32(2)),
        ]);
        let entity = WireEntity::new(&set, key, vec![], vec![WireLink::deferred("Next", false)])
            .unwrap();
        assert_eq!(entity.key_string().unwrap(), "A=1,B=2");

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["entity_type"], "Shop.Pair");
        assert_eq!(json["links"][0]["link"], "deferred");
        assert!(json.get("record").is_none());
    }
}
