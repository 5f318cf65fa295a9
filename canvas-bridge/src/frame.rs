//! WebSocket framing for comm messages.
//!
//! Each comm message travels as one text frame:
//!
//! ```json
//! {"data": {"method": "custom", "content": {"dtype": "uint8"}}, "buffers": ["W1tdXQ=="]}
//! ```
//!
//! Binary buffers are base64 encoded so the whole message stays a single
//! JSON document.

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum accepted size of an inbound text frame.
pub const MAX_FRAME_SIZE: usize = 1_048_576; // 1MB

/// Framing errors.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame exceeds [`MAX_FRAME_SIZE`].
    #[error("frame too large ({size} bytes, max {MAX_FRAME_SIZE})")]
    TooLarge {
        /// Received size in bytes.
        size: usize,
    },
    /// Frame is not a valid JSON frame.
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
    /// A buffer is not valid base64.
    #[error("buffer {index} is not valid base64: {source}")]
    Base64 {
        /// Position of the buffer in the frame.
        index: usize,
        /// Decoder error.
        #[source]
        source: base64::DecodeError,
    },
}

/// A comm message in its text-frame form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    /// Structured comm message.
    pub data: Value,
    /// Base64-encoded binary buffers.
    #[serde(default)]
    pub buffers: Vec<String>,
}

impl WireFrame {
    /// Build a frame from a comm message and its buffers.
    #[must_use]
    pub fn encode(metadata: Value, buffers: &[Bytes]) -> Self {
        let engine = base64::engine::general_purpose::STANDARD;
        Self {
            data: metadata,
            buffers: buffers.iter().map(|b| engine.encode(b)).collect(),
        }
    }

    /// Parse an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] for oversized frames and
    /// [`FrameError::Json`] if the text is not a frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        if text.len() > MAX_FRAME_SIZE {
            return Err(FrameError::TooLarge { size: text.len() });
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to frame text.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if serialization fails.
    pub fn to_text(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the binary buffers.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Base64`] naming the first invalid buffer.
    pub fn decode_buffers(&self) -> Result<Vec<Bytes>, FrameError> {
        let engine = base64::engine::general_purpose::STANDARD;
        self.buffers
            .iter()
            .enumerate()
            .map(|(index, encoded)| {
                engine
                    .decode(encoded)
                    .map(Bytes::from)
                    .map_err(|source| FrameError::Base64 { index, source })
            })
            .collect()
    }
}
