//! Error types for the wire codec.

use qcir_ir::IrError;
use thiserror::Error;

/// Errors raised while converting between the IR and the wire format.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// The message is well-formed protobuf but violates the circuit schema.
    #[error("Schema violation in {context}: {reason}")]
    SchemaViolation {
        /// Message or field being decoded.
        context: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The bytes are not a valid protobuf message.
    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The output buffer could not hold the message.
    #[error("Encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    /// The decoded values do not form a valid IR object.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),
}

impl ProtoError {
    /// Shorthand for [`ProtoError::SchemaViolation`].
    pub fn schema(context: &'static str, reason: impl Into<String>) -> Self {
        ProtoError::SchemaViolation {
            context,
            reason: reason.into(),
        }
    }

    /// A required `oneof` or message field was left unset.
    pub fn unset(context: &'static str) -> Self {
        Self::schema(context, "required field is not set")
    }

    /// An enum field holds a value outside the known range.
    pub fn unknown_tag(context: &'static str, value: i32) -> Self {
        Self::schema(context, format!("unknown enum value {value}"))
    }
}

/// Result type for codec operations.
pub type ProtoResult<T> = std::result::Result<T, ProtoError>;
