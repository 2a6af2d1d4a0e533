//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding literals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The literal text could not be parsed.
    #[error("invalid literal `{literal}`: {message}")]
    InvalidLiteral {
        /// The offending literal text.
        literal: String,
        /// Description of the problem.
        message: String,
    },

    /// A numeric literal does not fit its target type.
    #[error("numeric literal out of range: {literal}")]
    OutOfRange {
        /// The offending literal text.
        literal: String,
    },

    /// A quoted literal is missing its closing quote.
    #[error("unterminated quoted literal: {literal}")]
    Unterminated {
        /// The offending literal text.
        literal: String,
    },

    /// Floating point values that have no literal form.
    #[error("non-finite floating point values have no literal form")]
    NonFinite,
}

impl CodecError {
    /// Create an invalid literal error.
    pub fn invalid_literal(literal: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            literal: literal.into(),
            message: message.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(literal: impl Into<String>) -> Self {
        Self::OutOfRange {
            literal: literal.into(),
        }
    }
}
