//! Wire properties.

use crate::metadata::TypeDescriptor;
use entiodata_codec::Value;
use serde::Serialize;

/// One named, typed property of a wire entity or complex value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireProperty {
    /// Property name.
    pub name: String,
    /// Declared property type.
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    /// Property value.
    pub value: PropertyValue,
}

impl WireProperty {
    /// Creates a simple property.
    pub fn simple(name: impl Into<String>, ty: TypeDescriptor, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            value: PropertyValue::Simple(value),
        }
    }

    /// Creates a complex property; `None` is a null complex value.
    pub fn complex(
        name: impl Into<String>,
        ty: TypeDescriptor,
        properties: Option<Vec<WireProperty>>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            value: PropertyValue::Complex(properties),
        }
    }

    /// Creates a collection property.
    pub fn collection(name: impl Into<String>, ty: TypeDescriptor, value: CollectionValue) -> Self {
        Self {
            name: name.into(),
            ty,
            value: PropertyValue::Collection(value),
        }
    }

    /// Whether the value is null.
    pub fn is_null(&self) -> bool {
        match &self.value {
            PropertyValue::Simple(v) => v.is_null(),
            PropertyValue::Complex(props) => props.is_none(),
            PropertyValue::Collection(_) => false,
        }
    }

    /// Returns the simple value, if this is a simple property.
    pub fn as_simple(&self) -> Option<&Value> {
        match &self.value {
            PropertyValue::Simple(v) => Some(v),
            _ => None,
        }
    }
}

/// The value of a wire property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A simple value, possibly null.
    Simple(Value),
    /// The properties of a complex value, or `None` for null.
    Complex(Option<Vec<WireProperty>>),
    /// An ordered collection.
    Collection(CollectionValue),
}

/// An ordered collection value tagged with its item type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionValue {
    /// Declared item type.
    pub item_type: TypeDescriptor,
    /// Items, in source order.
    pub items: Vec<CollectionItem>,
}

/// One element of a collection value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CollectionItem {
    /// A simple item.
    Simple(Value),
    /// The properties of a complex item.
    Complex(Vec<WireProperty>),
}

/// Looks up a property by name in a property list.
pub fn find_property<'a>(properties: &'a [WireProperty], name: &str) -> Option<&'a WireProperty> {
    properties.iter().find(|p| p.name == name)
}
