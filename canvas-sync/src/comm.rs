//! Comm envelope shared by patches, batches and inbound events.
//!
//! ## Message Protocol
//!
//! - `{"method": "update", "state": {...}}` - property patch (either direction)
//! - `{"method": "custom", "content": {...}}` - command batch out, event in
//! - `{"method": "request_state"}` - renderer asks for a full snapshot

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SyncError;

/// A message on the comm channel, tagged by `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CommMessage {
    /// A full or partial property state.
    Update {
        /// Property name to wire value.
        state: Map<String, Value>,
    },
    /// An application-defined payload.
    Custom {
        /// Payload content.
        content: Value,
    },
    /// Request for the full property state.
    RequestState,
}

impl CommMessage {
    /// JSON form of the envelope.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Update { state } => serde_json::json!({ "method": "update", "state": state }),
            Self::Custom { content } => {
                serde_json::json!({ "method": "custom", "content": content })
            }
            Self::RequestState => serde_json::json!({ "method": "request_state" }),
        }
    }

    /// Parse an envelope received from the renderer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidMessage`] if `value` is not a known
    /// method or lacks its fields.
    pub fn from_value(value: &Value) -> Result<Self, SyncError> {
        Self::deserialize(value).map_err(|e| SyncError::InvalidMessage(e.to_string()))
    }
}
