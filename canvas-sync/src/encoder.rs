//! Binary encoding of a command batch.
//!
//! ## Wire Format
//!
//! ```text
//! metadata: {"dtype": "uint8"}
//! buffer 0: UTF-8 bytes of [[opcode_id, [operand, ...]], ...]
//! ```
//!
//! The command list is first turned into a JSON structure and the bytes of
//! that structure become the binary body, so the same channel that carries
//! property patches can carry a batch as an opaque buffer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{Command, Opcode, Operand};
use crate::error::EncodeError;

/// Element type tag of every batch body.
pub const BATCH_DTYPE: &str = "uint8";

/// Envelope describing the binary body of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// Element type of the body, always [`BATCH_DTYPE`].
    pub dtype: String,
}

impl Default for BatchMetadata {
    fn default() -> Self {
        Self {
            dtype: BATCH_DTYPE.to_string(),
        }
    }
}

impl BatchMetadata {
    /// JSON form of the envelope.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "dtype": self.dtype })
    }
}

/// An encoded batch ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    /// Envelope naming the body's element type.
    pub metadata: BatchMetadata,
    /// Binary body.
    pub payload: Bytes,
    /// Number of commands in the batch.
    pub command_count: usize,
}

/// One command as read back from a batch body.
#[derive(Debug, Clone, PartialEq)]
pub struct WireCommand {
    /// Decoded opcode.
    pub opcode: Opcode,
    /// Operands as structural values.
    pub operands: Vec<Value>,
}

/// Encode `commands`, in order, into a batch.
///
/// The same command sequence always yields the same bytes.
///
/// # Errors
///
/// Returns [`EncodeError::NonFiniteOperand`] if any operand is NaN or
/// infinite, since the structural encoding has no representation for it.
pub fn encode_batch(commands: &[Command]) -> Result<EncodedBatch, EncodeError> {
    let mut entries: Vec<(u8, Vec<Operand>)> = Vec::with_capacity(commands.len());
    for (index, command) in commands.iter().enumerate() {
        let operands = command.operands();
        if !operands.iter().all(Operand::is_finite) {
            return Err(EncodeError::NonFiniteOperand {
                index,
                opcode: command.opcode(),
            });
        }
        entries.push((command.opcode().id(), operands));
    }

    let payload = serde_json::to_vec(&entries)?;
    Ok(EncodedBatch {
        metadata: BatchMetadata::default(),
        payload: Bytes::from(payload),
        command_count: commands.len(),
    })
}

/// Decode a batch body back into opcode-tagged operand lists.
///
/// # Errors
///
/// Returns an error if the body is not JSON, an entry is not an
/// `[opcode, [operands]]` pair, or an opcode id is unknown.
pub fn decode_batch(payload: &[u8]) -> Result<Vec<WireCommand>, EncodeError> {
    let entries: Vec<Value> = serde_json::from_slice(payload)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let Value::Array(mut pair) = entry else {
                return Err(EncodeError::InvalidEntry(index));
            };
            if pair.len() != 2 {
                return Err(EncodeError::InvalidEntry(index));
            }
            let Value::Array(operands) = pair.pop().unwrap_or_default() else {
                return Err(EncodeError::InvalidEntry(index));
            };
            let id = pair[0].as_u64().ok_or(EncodeError::InvalidEntry(index))?;
            let opcode = Opcode::from_id(id).ok_or(EncodeError::UnknownOpcode(id))?;
            Ok(WireCommand { opcode, operands })
        })
        .collect()
}
