//! Flush policy: when buffered commands are handed to the transport.
//!
//! ```text
//!               begin_caching
//!  Immediate ------------------> Caching
//!      ^                            |
//!      +----------------------------+
//!        end_caching (one flush)
//! ```
//!
//! In [`FlushMode::Immediate`] every command is flushed as its own batch.
//! In [`FlushMode::Caching`] commands accumulate until caching ends.

use crate::buffer::CommandBuffer;
use crate::comm::CommMessage;
use crate::command::Command;
use crate::encoder::encode_batch;
use crate::error::SyncResult;
use crate::transport::Transport;

/// Flush policy state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushMode {
    /// Flush after every command.
    #[default]
    Immediate,
    /// Hold commands until caching ends.
    Caching,
}

/// Owns the command buffer and decides when it is flushed.
#[derive(Debug, Default)]
pub struct FlushController {
    buffer: CommandBuffer,
    mode: FlushMode,
    flushes: u64,
}

impl FlushController {
    /// Create a controller in immediate mode with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current flush mode.
    #[must_use]
    pub const fn mode(&self) -> FlushMode {
        self.mode
    }

    /// Check if commands are being held.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.mode == FlushMode::Caching
    }

    /// Number of successful flushes so far.
    #[must_use]
    pub const fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// The pending command buffer.
    #[must_use]
    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Mutable access to the pending buffer, e.g. to drop a bad command.
    pub fn buffer_mut(&mut self) -> &mut CommandBuffer {
        &mut self.buffer
    }

    /// Append a command and flush unless caching.
    ///
    /// # Errors
    ///
    /// Returns the flush error in immediate mode. The command stays buffered.
    pub fn send_command<T: Transport + ?Sized>(
        &mut self,
        command: Command,
        transport: &mut T,
    ) -> SyncResult<()> {
        self.buffer.append(command);
        if self.mode == FlushMode::Immediate {
            self.flush(transport)?;
        }
        Ok(())
    }

    /// Encode the whole buffer as one batch, send it, then clear the buffer.
    ///
    /// An empty buffer still sends an empty batch.
    ///
    /// # Errors
    ///
    /// Returns an encoding or transport error. The buffer is left intact.
    pub fn flush<T: Transport + ?Sized>(&mut self, transport: &mut T) -> SyncResult<()> {
        let batch = encode_batch(self.buffer.commands())?;
        let bytes = batch.payload.len();
        let message = CommMessage::Custom {
            content: batch.metadata.to_value(),
        };
        transport.send(message.to_value(), vec![batch.payload])?;

        self.buffer.clear();
        self.flushes += 1;
        tracing::debug!(
            "Flushed batch of {} commands ({} bytes)",
            batch.command_count,
            bytes
        );
        Ok(())
    }

    /// Start holding commands. Idempotent while already caching.
    pub fn begin_caching(&mut self) {
        if self.mode == FlushMode::Caching {
            tracing::debug!("begin_caching while already caching");
        }
        self.mode = FlushMode::Caching;
    }

    /// Stop holding commands and flush everything held, once.
    ///
    /// Does nothing when not caching.
    ///
    /// # Errors
    ///
    /// Returns the flush error. The mode is back to immediate either way and
    /// the held commands remain buffered on failure.
    pub fn end_caching<T: Transport + ?Sized>(&mut self, transport: &mut T) -> SyncResult<()> {
        if self.mode == FlushMode::Immediate {
            tracing::debug!("end_caching while not caching; nothing to flush");
            return Ok(());
        }
        self.mode = FlushMode::Immediate;
        self.flush(transport)
    }

    /// Leave caching mode without flushing. Held commands stay buffered.
    pub fn abort_caching(&mut self) {
        if self.mode == FlushMode::Caching {
            tracing::debug!(
                "Caching window aborted with {} held commands",
                self.buffer.len()
            );
        }
        self.mode = FlushMode::Immediate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::decode_batch;
    use crate::error::SyncError;
    use crate::transport::MemoryTransport;
    use crate::Opcode;

    fn batch_sizes(transport: &MemoryTransport) -> Vec<usize> {
        transport
            .sent()
            .iter()
            .map(|m| decode_batch(&m.buffers[0]).unwrap().len())
            .collect()
    }

    #[test]
    fn test_immediate_mode_flushes_each_command() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        for _ in 0..4 {
            controller
                .send_command(Command::Save, &mut transport)
                .unwrap();
        }

        assert_eq!(controller.flush_count(), 4);
        assert_eq!(batch_sizes(&transport), vec![1, 1, 1, 1]);
        assert!(controller.buffer().is_empty());
    }

    #[test]
    fn test_caching_coalesces_into_one_batch() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        controller.begin_caching();
        controller
            .send_command(Command::Save, &mut transport)
            .unwrap();
        controller
            .send_command(Command::Restore, &mut transport)
            .unwrap();
        assert!(transport.sent().is_empty());
        controller.end_caching(&mut transport).unwrap();

        assert_eq!(transport.sent().len(), 1);
        let decoded = decode_batch(&transport.sent()[0].buffers[0]).unwrap();
        assert_eq!(decoded[0].opcode, Opcode::Save);
        assert_eq!(decoded[1].opcode, Opcode::Restore);
        assert!(controller.buffer().is_empty());
        assert_eq!(controller.mode(), FlushMode::Immediate);
    }

    #[test]
    fn test_envelope_shape() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        controller.flush(&mut transport).unwrap();

        let sent = &transport.sent()[0];
        assert_eq!(
            sent.metadata,
            serde_json::json!({"method": "custom", "content": {"dtype": "uint8"}})
        );
        assert_eq!(sent.buffers.len(), 1);
        assert_eq!(sent.buffers[0].as_ref(), b"[]");
    }

    #[test]
    fn test_end_caching_when_immediate_is_noop() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        controller.end_caching(&mut transport).unwrap();

        assert!(transport.sent().is_empty());
        assert_eq!(controller.flush_count(), 0);
    }

    #[test]
    fn test_begin_caching_twice_is_single_window() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        controller.begin_caching();
        controller.begin_caching();
        controller
            .send_command(Command::Clip, &mut transport)
            .unwrap();
        controller.end_caching(&mut transport).unwrap();
        controller.end_caching(&mut transport).unwrap();

        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_transport_failure_keeps_buffer() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();
        transport.set_connected(false);

        let err = controller
            .send_command(Command::Clear, &mut transport)
            .unwrap_err();

        assert!(matches!(err, SyncError::Transport(_)));
        assert_eq!(controller.buffer().commands(), &[Command::Clear]);

        transport.set_connected(true);
        controller.flush(&mut transport).unwrap();
        assert!(controller.buffer().is_empty());
        assert_eq!(batch_sizes(&transport), vec![1]);
    }

    #[test]
    fn test_encode_failure_keeps_buffer_until_fixed() {
        let mut controller = FlushController::new();
        let mut transport = MemoryTransport::new();

        controller.begin_caching();
        controller
            .send_command(Command::Save, &mut transport)
            .unwrap();
        controller
            .send_command(Command::Scale { x: f64::INFINITY, y: 1.0 }, &mut transport)
            .unwrap();

        let err = controller.end_caching(&mut transport).unwrap_err();
        assert!(matches!(err, SyncError::Encode(_)));
        assert_eq!(controller.buffer().len(), 2);
        assert!(transport.sent().is_empty());

        controller.buffer_mut().remove(1);
        controller.flush(&mut transport).unwrap();
        assert_eq!(batch_sizes(&transport), vec![1]);
    }

    mod proptest_tests {
        use crate::command::strategies::arb_command;
        use crate::encoder::decode_batch;
        use crate::flush::FlushController;
        use crate::transport::MemoryTransport;
        use proptest::prelude::*;
        use serde_json::Value;

        proptest! {
            #[test]
            fn prop_caching_window_sends_one_ordered_batch(
                commands in prop::collection::vec(arb_command(), 0..32)
            ) {
                let mut controller = FlushController::new();
                let mut transport = MemoryTransport::new();

                controller.begin_caching();
                for command in &commands {
                    controller.send_command(command.clone(), &mut transport).unwrap();
                }
                prop_assert!(transport.sent().is_empty());
                controller.end_caching(&mut transport).unwrap();

                prop_assert_eq!(transport.sent().len(), 1);
                prop_assert!(controller.buffer().is_empty());
                let decoded = decode_batch(&transport.sent()[0].buffers[0]).unwrap();
                prop_assert_eq!(decoded.len(), commands.len());
                for (wire, command) in decoded.iter().zip(&commands) {
                    prop_assert_eq!(wire.opcode, command.opcode());
                    prop_assert_eq!(
                        Value::Array(wire.operands.clone()),
                        serde_json::to_value(command.operands()).unwrap()
                    );
                }
            }

            #[test]
            fn prop_immediate_mode_sends_one_batch_per_command(
                commands in prop::collection::vec(arb_command(), 1..16)
            ) {
                let mut controller = FlushController::new();
                let mut transport = MemoryTransport::new();

                for command in &commands {
                    controller.send_command(command.clone(), &mut transport).unwrap();
                }

                prop_assert_eq!(transport.sent().len(), commands.len());
                prop_assert_eq!(
                    controller.flush_count(),
                    u64::try_from(commands.len()).unwrap()
                );
                for (message, command) in transport.sent().iter().zip(&commands) {
                    let decoded = decode_batch(&message.buffers[0]).unwrap();
                    prop_assert_eq!(decoded.len(), 1);
                    prop_assert_eq!(decoded[0].opcode, command.opcode());
                }
            }
        }
    }
}
