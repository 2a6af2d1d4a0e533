//! Metadata model, generation and caching.

mod generator;
mod model;
mod store;

pub use generator::MetadataGenerator;
pub use model::{
    CollectionKind, CollectionType, ComplexType, EntitySet, EntityType, MetadataModel,
    NavigationProperty, Property, TypeDescriptor,
};
pub use store::MetadataStore;
