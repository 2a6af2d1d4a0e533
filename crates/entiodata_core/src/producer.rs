//! In-memory producer facade.

use crate::accessor::{EnumsAsStrings, Record};
use crate::config::ProducerConfig;
use crate::entity::{EntityKey, WireEntity, WireLink, WireProperty};
use crate::error::{CoreError, CoreResult};
use crate::materialize::RecordMaterializer;
use crate::metadata::{MetadataGenerator, MetadataModel, MetadataStore};
use crate::query::{NavigationResponse, QueryEngine, QueryInfo, ResultPage};
use crate::registry::{ComplexTypeRegistration, EntitySetRegistration, Registry};
use crate::types::ShapeId;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// The main producer handle.
///
/// `InMemoryProducer` exposes registered record sources as entity sets:
/// - Registration of entity sets and complex types
/// - Lazily generated, cached metadata
/// - Paged queries, counts, key lookups and navigation
/// - Reconstruction of records from wire entities
///
/// # Example
///
/// ```rust
/// use entiodata_codec::SimpleType;
/// use entiodata_core::{
///     EntitySetRegistration, InMemoryProducer, ProducerConfig, QueryInfo, Record,
///     TypedAccessor,
/// };
///
/// #[derive(Default, Clone)]
/// struct Tag {
///     id: i32,
/// }
///
/// let producer = InMemoryProducer::new(ProducerConfig::default());
/// let accessor = TypedAccessor::<Tag>::new()
///     .simple("Id", SimpleType::Int32, |t| t.id, |t, v| t.id = v)
///     .not_null();
/// let source = || (1..=3).map(|id| Record::new("tag", Tag { id })).collect::<Vec<_>>();
/// producer
///     .register_entity_set(EntitySetRegistration::new("Tags", "tag", accessor, source).keys(["Id"]))
///     .unwrap();
///
/// let page = producer.get_entities("Tags", &QueryInfo::new().top(2)).unwrap();
/// assert_eq!(page.entities.len(), 2);
/// assert_eq!(page.skip_token.as_deref(), Some("2"));
/// ```
pub struct InMemoryProducer {
    config: ProducerConfig,
    registry: RwLock<Registry>,
    metadata: MetadataStore,
}

impl Default for InMemoryProducer {
    fn default() -> Self {
        Self::new(ProducerConfig::default())
    }
}

impl InMemoryProducer {
    /// Creates a producer with nothing registered.
    #[must_use]
    pub fn new(config: ProducerConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(Registry::new()),
            metadata: MetadataStore::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Registers an entity set.
    ///
    /// Drops any cached metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] if the set name or shape is
    /// already registered.
    pub fn register_entity_set(&self, registration: EntitySetRegistration) -> CoreResult<()> {
        let registration = if self.config.enums_as_strings {
            registration.map_accessor(|inner| Arc::new(EnumsAsStrings::new(inner)))
        } else {
            registration
        };
        let name = registration.set_name().to_string();

        let mut registry = self.registry.write();
        if !registry.add_entity_set(registration) {
            return Err(CoreError::invalid_metadata(format!(
                "entity set {name} or its shape is already registered"
            )));
        }
        // Readers must never see the new registrations with the old model.
        self.metadata.invalidate();
        drop(registry);
        info!("Registered entity set {}", name);
        Ok(())
    }

    /// Registers a complex type, replacing any earlier registration of the
    /// same shape.
    ///
    /// Drops any cached metadata.
    pub fn register_complex_type(&self, registration: ComplexTypeRegistration) {
        let registration = if self.config.enums_as_strings {
            registration.map_accessor(|inner| Arc::new(EnumsAsStrings::new(inner)))
        } else {
            registration
        };
        let name = registration.type_name().to_string();

        let mut registry = self.registry.write();
        registry.add_complex_type(registration);
        self.metadata.invalidate();
        drop(registry);
        info!("Registered complex type {}", name);
    }

    /// Returns the metadata, generating it on first use after a
    /// registration change.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] if the registrations do not
    /// form a valid model.
    pub fn metadata(&self) -> CoreResult<Arc<MetadataModel>> {
        let registry = self.registry.read();
        self.model(&registry)
    }

    /// Regenerates the metadata from the current registrations, replacing
    /// any cached model.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMetadata`] if the registrations do not
    /// form a valid model; the previously cached model is kept.
    pub fn rebuild_metadata(&self) -> CoreResult<Arc<MetadataModel>> {
        let registry = self.registry.read();
        self.metadata.build(|| MetadataGenerator::new(&registry, &self.config).generate())
    }

    fn model(&self, registry: &Registry) -> CoreResult<Arc<MetadataModel>> {
        self.metadata.get_or_build(|| {
            debug!("Generating metadata for {} entity sets", registry.entity_sets().len());
            MetadataGenerator::new(registry, &self.config).generate()
        })
    }

    /// Queries an entity set.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::get_entities`].
    pub fn get_entities(&self, set_name: &str, query: &QueryInfo) -> CoreResult<ResultPage> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        QueryEngine::new(&registry, &model, &self.config).get_entities(set_name, query)
    }

    /// Counts the entities a query selects.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::get_entities_count`].
    pub fn get_entities_count(&self, set_name: &str, query: &QueryInfo) -> CoreResult<usize> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        QueryEngine::new(&registry, &model, &self.config).get_entities_count(set_name, query)
    }

    /// Looks up one entity by key. Only the select and expand options of
    /// `query` apply.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::get_entity`].
    pub fn get_entity(
        &self,
        set_name: &str,
        key: &EntityKey,
        query: &QueryInfo,
    ) -> CoreResult<WireEntity> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        QueryEngine::new(&registry, &model, &self.config).get_entity(set_name, key, query)
    }

    /// Follows a navigation or simple property of one entity.
    ///
    /// # Errors
    ///
    /// See [`QueryEngine::get_nav_property`].
    pub fn get_nav_property(
        &self,
        set_name: &str,
        key: &EntityKey,
        name: &str,
        query: &QueryInfo,
    ) -> CoreResult<NavigationResponse> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        QueryEngine::new(&registry, &model, &self.config)
            .get_nav_property(set_name, key, name, query)
    }

    /// Rebuilds a record of `shape` from a wire entity.
    ///
    /// # Errors
    ///
    /// See [`RecordMaterializer::to_record`].
    pub fn to_record(&self, entity: &WireEntity, shape: &ShapeId) -> CoreResult<Record> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        RecordMaterializer::new(&registry, &model).to_record(entity, shape)
    }

    /// Rebuilds a complex record of `shape` from wire properties.
    ///
    /// # Errors
    ///
    /// See [`RecordMaterializer::to_complex_record`].
    pub fn to_complex_record(
        &self,
        properties: &[WireProperty],
        shape: &ShapeId,
    ) -> CoreResult<Record> {
        let registry = self.registry.read();
        let model = self.model(&registry)?;
        RecordMaterializer::new(&registry, &model).to_complex_record(properties, shape)
    }

    /// Not supported: record sources are read-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn create_entity(&self, set_name: &str, _entity: &WireEntity) -> CoreResult<WireEntity> {
        Err(read_only("create entity in", set_name))
    }

    /// Not supported: record sources are read-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn update_entity(&self, set_name: &str, _entity: &WireEntity) -> CoreResult<()> {
        Err(read_only("update entity in", set_name))
    }

    /// Not supported: record sources are read-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn merge_entity(&self, set_name: &str, _entity: &WireEntity) -> CoreResult<()> {
        Err(read_only("merge entity in", set_name))
    }

    /// Not supported: record sources are read-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn delete_entity(&self, set_name: &str, _key: &EntityKey) -> CoreResult<()> {
        Err(read_only("delete entity from", set_name))
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn get_links(&self, set_name: &str, _key: &EntityKey, _nav: &str) -> CoreResult<Vec<EntityKey>> {
        Err(read_only("read links of", set_name))
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn create_link(&self, set_name: &str, _key: &EntityKey, _link: &WireLink) -> CoreResult<()> {
        Err(read_only("create link in", set_name))
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn update_link(&self, set_name: &str, _key: &EntityKey, _link: &WireLink) -> CoreResult<()> {
        Err(read_only("update link in", set_name))
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn delete_link(&self, set_name: &str, _key: &EntityKey, _nav: &str) -> CoreResult<()> {
        Err(read_only("delete link in", set_name))
    }

    /// Not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn get_nav_property_count(
        &self,
        set_name: &str,
        _key: &EntityKey,
        _nav: &str,
        _query: &QueryInfo,
    ) -> CoreResult<usize> {
        Err(CoreError::unsupported(format!(
            "navigation counts on {set_name}"
        )))
    }

    /// Not supported: no service operations are registered.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::UnsupportedOperation`].
    pub fn call_function(&self, name: &str) -> CoreResult<ResultPage> {
        Err(CoreError::unsupported(format!("function {name}")))
    }
}

fn read_only(action: &str, set_name: &str) -> CoreError {
    CoreError::unsupported(format!("cannot {action} read-only entity set {set_name}"))
}
