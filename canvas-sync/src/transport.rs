//! Outbound transport seam.
//!
//! The core hands complete messages to a [`Transport`] and never waits for
//! acknowledgement. Any error reported by `send` fails the call that
//! triggered it.

use bytes::Bytes;
use serde_json::Value;

use crate::error::TransportError;

/// A one-way, ordered channel to the remote renderer.
pub trait Transport {
    /// Deliver one message with its binary parts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message could not be handed off.
    fn send(&mut self, metadata: Value, buffers: Vec<Bytes>) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, metadata: Value, buffers: Vec<Bytes>) -> Result<(), TransportError> {
        (**self).send(metadata, buffers)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, metadata: Value, buffers: Vec<Bytes>) -> Result<(), TransportError> {
        (**self).send(metadata, buffers)
    }
}

/// A message as handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Structured part.
    pub metadata: Value,
    /// Binary parts.
    pub buffers: Vec<Bytes>,
}

/// In-memory transport that records every delivered message.
///
/// Delivery can be switched off to simulate a lost connection.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    sent: Vec<OutboundMessage>,
    connected: bool,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create a connected transport with no recorded messages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            connected: true,
        }
    }

    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> &[OutboundMessage] {
        &self.sent
    }

    /// Take all recorded messages.
    pub fn take(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.sent)
    }

    /// Set whether delivery succeeds.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Check if delivery currently succeeds.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, metadata: Value, buffers: Vec<Bytes>) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Delivery("memory transport offline".to_string()));
        }
        self.sent.push(OutboundMessage { metadata, buffers });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_in_order() {
        let mut transport = MemoryTransport::new();
        transport.send(json!(1), Vec::new()).unwrap();
        transport
            .send(json!(2), vec![Bytes::from_static(b"x")])
            .unwrap();

        let sent = transport.take();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].metadata, json!(1));
        assert_eq!(sent[1].buffers[0].as_ref(), b"x");
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_offline_fails_without_recording() {
        let mut transport = MemoryTransport::new();
        transport.set_connected(false);

        let result = transport.send(json!({}), Vec::new());

        assert!(matches!(result, Err(TransportError::Delivery(_))));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mut boxed: Box<dyn Transport> = Box::new(MemoryTransport::new());
        assert!(boxed.send(json!(null), Vec::new()).is_ok());
    }
}
