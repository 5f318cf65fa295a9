//! # Canvas Sync
//!
//! Synchronization core for a remotely rendered drawing canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Canvas                     │
//! ├──────────────────────────────────────────────┤
//! │  State Codec      │  Flush Controller        │
//! │  - Snapshots      │  - Command buffer        │
//! │  - Patches        │  - Immediate / caching   │
//! │  - Side buffers   │  - Batch encoder         │
//! ├──────────────────────────────────────────────┤
//! │  Inbound Handler  │  Transport               │
//! │  - Update / event │  - JSON metadata         │
//! │  - Callbacks      │  - Binary buffers        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Drawing calls become [`Command`]s. A batch is sent as a `custom` comm
//! message whose content is `{"dtype": "uint8"}` and whose single binary
//! buffer holds the UTF-8 JSON `[[opcode, [operands...]], ...]`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod canvas;
pub mod comm;
pub mod command;
pub mod encoder;
pub mod error;
pub mod flush;
pub mod inbound;
pub mod property;
pub mod state;
pub mod transport;

pub use buffer::CommandBuffer;
pub use canvas::{Canvas, Handled};
pub use comm::CommMessage;
pub use command::{Command, FillRule, Matrix, Opcode, Operand};
pub use encoder::{
    decode_batch, encode_batch, BatchMetadata, EncodedBatch, WireCommand, BATCH_DTYPE,
};
pub use error::{CallbackError, CodecError, EncodeError, SyncError, SyncResult, TransportError};
pub use flush::{FlushController, FlushMode};
pub use inbound::{CallbackId, DispatchReport, EventKind, InboundEvent, InboundHandler};
pub use property::{Binary, Property, PropertyCodec, WireValue, BUFFER_REFERENCE_PREFIX};
pub use state::{CanvasState, PatchOutcome, Snapshot, StateLayer, WidgetBase};
pub use transport::{MemoryTransport, OutboundMessage, Transport};

/// Canvas sync version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
