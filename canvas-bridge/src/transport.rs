//! Channel transport between a canvas and its socket writer.

use bytes::Bytes;
use canvas_sync::{OutboundMessage, Transport, TransportError};
use serde_json::Value;
use tokio::sync::mpsc;

/// Transport that queues messages for the connection task.
///
/// The queue is unbounded so a flush never blocks; ordering is preserved.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its messages arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Check if the receiving side is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, metadata: Value, buffers: Vec<Bytes>) -> Result<(), TransportError> {
        self.tx
            .send(OutboundMessage { metadata, buffers })
            .map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_arrive_in_order() {
        let (mut transport, mut rx) = ChannelTransport::new();

        transport.send(json!(1), Vec::new()).unwrap();
        transport
            .send(json!(2), vec![Bytes::from_static(b"[]")])
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().metadata, json!(1));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.metadata, json!(2));
        assert_eq!(second.buffers.len(), 1);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_closed() {
        let (mut transport, rx) = ChannelTransport::new();
        drop(rx);

        assert!(transport.is_closed());
        let err = transport.send(json!({}), Vec::new()).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
