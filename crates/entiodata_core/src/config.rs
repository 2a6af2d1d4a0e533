//! Producer configuration.

/// Configuration for an in-memory producer.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Namespace of the generated schema.
    pub namespace: String,

    /// Name of the generated entity container.
    pub container_name: String,

    /// Maximum number of entities returned in a single page.
    pub max_results: usize,

    /// Whether null-valued properties are emitted on wire entities.
    ///
    /// Turning this off deviates from the protocol but keeps wide
    /// entity types readable while debugging.
    pub include_null_properties: bool,

    /// Whether enumeration fields are exposed as `Edm.String` properties.
    ///
    /// Without this, enumeration fields have no metadata counterpart and
    /// are left out of the schema.
    pub enums_as_strings: bool,
}

/// Container name used when none (or an empty one) is configured.
pub const DEFAULT_CONTAINER_NAME: &str = "Container";

/// Page size used when none is configured.
pub const DEFAULT_MAX_RESULTS: usize = 100;

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            namespace: "InMemory".to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            include_null_properties: true,
            enums_as_strings: true,
        }
    }
}

impl ProducerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the container name. An empty name keeps the default.
    #[must_use]
    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.container_name = if name.is_empty() {
            DEFAULT_CONTAINER_NAME.to_string()
        } else {
            name
        };
        self
    }

    /// Sets the maximum page size.
    #[must_use]
    pub const fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Sets whether null-valued properties are emitted.
    #[must_use]
    pub const fn include_null_properties(mut self, value: bool) -> Self {
        self.include_null_properties = value;
        self
    }

    /// Sets whether enumeration fields are exposed as strings.
    #[must_use]
    pub const fn enums_as_strings(mut self, value: bool) -> Self {
        self.enums_as_strings = value;
        self
    }
}
