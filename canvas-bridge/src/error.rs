//! Error types for the bridge.

use canvas_sync::SyncError;
use thiserror::Error;

use crate::frame::FrameError;

/// Errors while routing one inbound frame.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The frame could not be decoded.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// The canvas rejected the message or failed to reply.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
