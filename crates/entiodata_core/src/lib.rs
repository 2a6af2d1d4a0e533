//! # EntiOData Core
//!
//! In-memory producer core for EntiOData.
//!
//! This crate provides:
//! - Property accessors over arbitrary in-memory record shapes
//! - Metadata generation from registered shapes, with caching
//! - Filter and ordering expressions with three-valued evaluation
//! - A paging query engine with skip tokens and inline counts
//! - Conversion between records and wire entities, in both directions

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod accessor;
mod config;
pub mod entity;
mod error;
pub mod materialize;
pub mod metadata;
mod producer;
pub mod query;
mod registry;
mod types;

pub use accessor::{
    EnumsAsStrings, FieldDescriptor, FieldType, FieldValue, FromFieldValue, KeyFunction,
    PropertyAccessor, Record, RecordData, TypedAccessor, ENTITY_ID_PROPERTY,
};
pub use config::{ProducerConfig, DEFAULT_CONTAINER_NAME, DEFAULT_MAX_RESULTS};
pub use entity::{EntityKey, WireEntity, WireLink, WireProperty};
pub use error::{CoreError, CoreResult};
pub use materialize::{MaterializeHooks, WireSource};
pub use metadata::MetadataModel;
pub use producer::InMemoryProducer;
pub use query::{
    Direction, Expr, InlineCount, NavigationResponse, OrderBy, QueryInfo, ResultPage,
};
pub use registry::{
    AccessorResolver, ComplexTypeRegistration, EntitySetRegistration, RecordSource, Registry,
};
pub use types::{Multiplicity, ShapeId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
