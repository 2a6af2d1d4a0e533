//! Error types for EntiOData core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in EntiOData core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Literal codec error.
    #[error("codec error: {0}")]
    Codec(#[from] entiodata_codec::CodecError),

    /// Unknown entity set, unresolvable key, or unknown property.
    #[error("not found: {message}")]
    NotFound {
        /// What could not be found.
        message: String,
    },

    /// The operation or query combination is not supported.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation {
        /// Why the operation is unsupported.
        message: String,
    },

    /// A filter or ordering expression could not be evaluated.
    #[error("evaluation error: {message}")]
    Evaluation {
        /// Description of the failure.
        message: String,
    },

    /// A non-nullable property has no value in the source entity.
    #[error("missing required property {property}")]
    MissingProperty {
        /// Name of the missing property.
        property: String,
    },

    /// An entity key is null or does not match the declared key fields.
    #[error("invalid entity key: {message}")]
    InvalidKey {
        /// Description of the key problem.
        message: String,
    },

    /// The metadata model violates one of its invariants.
    #[error("invalid metadata: {message}")]
    InvalidMetadata {
        /// Description of the violation.
        message: String,
    },

    /// A property accessor was handed a record or value it cannot handle.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the mismatch.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Creates a missing property error.
    pub fn missing_property(property: impl Into<String>) -> Self {
        Self::MissingProperty {
            property: property.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates an invalid metadata error.
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`CoreError::UnsupportedOperation`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}
