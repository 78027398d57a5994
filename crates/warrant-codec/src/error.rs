//! Error types for the codec crate.

use thiserror::Error;

/// Errors that can occur while decoding a [`Values`](crate::Values) structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input is truncated or otherwise not in canonical form.
    #[error("malformed encoding at offset {offset}: {reason}")]
    MalformedEncoding { offset: usize, reason: String },

    /// An entry used a kind discriminator this version does not know.
    #[error("unknown value kind {kind:#04x} at offset {offset}")]
    UnknownKind { kind: u8, offset: usize },

    /// Nested structures went deeper than the decode limit.
    #[error("nesting depth exceeds limit of {max}")]
    DepthExceeded { max: usize },

    /// The input is larger than the decode limit.
    #[error("encoded size {size} exceeds limit of {max} bytes")]
    TooLarge { size: usize, max: usize },
}

impl CodecError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            offset,
            reason: reason.into(),
        }
    }
}
