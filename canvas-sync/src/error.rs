//! Error types for canvas synchronization.

use thiserror::Error;

use crate::command::Opcode;

/// Result type for canvas synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while encoding or decoding a command batch.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// An operand has no representation in the structural encoding.
    #[error("Command {index} ({opcode:?}) carries a non-finite operand")]
    NonFiniteOperand {
        /// Position of the offending command in the batch.
        index: usize,
        /// Opcode of the offending command.
        opcode: Opcode,
    },

    /// The structural encoder rejected the batch, or a body is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A decoded entry does not have the `[opcode, [operands]]` shape.
    #[error("Batch entry {0} is not an [opcode, operands] pair")]
    InvalidEntry(usize),

    /// A decoded entry names an opcode outside the fixed set.
    #[error("Unknown opcode id: {0}")]
    UnknownOpcode(u64),
}

/// Errors reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The receiving side of the channel has gone away.
    #[error("Transport closed")]
    Closed,

    /// Delivery failed for a transport-specific reason.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Errors that can occur while decoding a property from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The wire value has the wrong JSON type for the property.
    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        /// The wire type the property accepts.
        expected: &'static str,
        /// The JSON value that was supplied.
        found: String,
    },

    /// A buffer reference points past the supplied side buffers.
    #[error("Buffer reference {index} out of range ({available} buffers)")]
    MissingBuffer {
        /// The referenced index.
        index: usize,
        /// Number of side buffers supplied with the patch.
        available: usize,
    },
}

/// Error returned by an inbound event callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in canvas synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The command batch could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// The transport rejected a message.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A property value could not be decoded.
    #[error("Property error: {0}")]
    Property(#[from] CodecError),

    /// An inbound message was not a well-formed comm envelope.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
