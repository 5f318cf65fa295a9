//! One canvas per WebSocket connection.
//!
//! ## Message Flow
//!
//! ```text
//! renderer ──text frame──▶ WireFrame ──▶ Canvas::handle_message ──▶ callbacks
//!                                                                      │
//! renderer ◀──text frame── WireFrame ◀── ChannelTransport ◀── flush ◀──┘
//! ```
//!
//! On connect the full canvas state is sent as an `update` message, so the
//! renderer can create its model before any batch arrives.

use axum::extract::ws::{Message, WebSocket};
use canvas_sync::{Canvas, Handled, OutboundMessage};
use futures::{SinkExt, StreamExt};

use crate::demo::ClickPainter;
use crate::error::BridgeResult;
use crate::frame::WireFrame;
use crate::transport::ChannelTransport;
use crate::AppState;

/// A canvas bound to one connection, with its demo behaviour.
#[derive(Debug)]
pub struct CanvasSession {
    canvas: Canvas<ChannelTransport>,
    painter: ClickPainter,
}

impl CanvasSession {
    /// Create a session canvas of the given size.
    #[must_use]
    pub fn new(transport: ChannelTransport, width: i32, height: i32) -> Self {
        let mut canvas = Canvas::with_size(transport, width, height);
        let painter = ClickPainter::attach(&mut canvas);
        Self { canvas, painter }
    }

    /// The session canvas.
    #[must_use]
    pub fn canvas(&self) -> &Canvas<ChannelTransport> {
        &self.canvas
    }

    /// Queue the full state for the renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection task has gone away.
    pub fn send_initial_state(&mut self) -> BridgeResult<()> {
        self.canvas.send_state()?;
        Ok(())
    }

    /// Route one inbound text frame, then paint any clicks it reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is malformed or the canvas cannot send
    /// its reply.
    pub fn handle_text(&mut self, text: &str) -> BridgeResult<Handled> {
        let frame = WireFrame::parse(text)?;
        let buffers = frame.decode_buffers()?;
        let handled = self.canvas.handle_message(&frame.data, &buffers)?;

        match &handled {
            Handled::Patch(outcome) => {
                tracing::debug!(
                    applied = outcome.applied.len(),
                    ignored = outcome.ignored.len(),
                    rejected = outcome.rejected.len(),
                    "Applied renderer patch"
                );
            }
            Handled::Event(report) => {
                if let Some(kind) = report.kind {
                    tracing::debug!(
                        event = kind.as_str(),
                        delivered = report.delivered,
                        failed = report.failures.len(),
                        "Dispatched renderer event"
                    );
                }
                let painted = self.painter.paint(&mut self.canvas)?;
                if painted > 0 {
                    tracing::debug!("Painted {} clicks", painted);
                }
            }
            Handled::StateSent => tracing::debug!("Sent full state on request"),
        }
        Ok(handled)
    }
}

/// Serialize an outbound message as frame text.
fn frame_text(message: &OutboundMessage) -> Option<String> {
    match WireFrame::encode(message.metadata.clone(), &message.buffers).to_text() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("Failed to serialize outbound frame: {}", e);
            None
        }
    }
}

/// Drive one renderer connection until either side closes.
pub async fn handle_canvas_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (transport, mut outbound) = ChannelTransport::new();
    let mut session = CanvasSession::new(transport, state.config.width, state.config.height);
    let _connection = state.connections.enter();

    tracing::info!(
        width = session.canvas().width(),
        height = session.canvas().height(),
        "Canvas connection opened"
    );

    if let Err(e) = session.send_initial_state() {
        tracing::error!("Failed to queue initial canvas state: {}", e);
        return;
    }

    loop {
        tokio::select! {
            // Frames from the renderer
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = session.handle_text(text.as_str()) {
                            tracing::warn!("Dropped renderer frame: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Renderer disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            // Patches and batches from the canvas
            message = outbound.recv() => {
                let Some(message) = message else {
                    tracing::debug!("Canvas channel closed");
                    break;
                };
                if let Some(text) = frame_text(&message) {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("Canvas connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use serde_json::{json, Value};

    fn frame(data: Value) -> String {
        WireFrame::encode(data, &[]).to_text().unwrap()
    }

    #[test]
    fn test_initial_state_is_update() {
        let (transport, mut rx) = ChannelTransport::new();
        let mut session = CanvasSession::new(transport, 320, 240);

        session.send_initial_state().unwrap();

        let message = rx.try_recv().unwrap();
        assert_eq!(message.metadata["method"], "update");
        assert_eq!(message.metadata["state"]["width"], 320);
        assert_eq!(message.metadata["state"]["height"], 240);
        assert_eq!(message.metadata["state"]["_model_name"], "CanvasModel");
    }

    #[test]
    fn test_mouse_down_frame_paints_dot() {
        let (transport, mut rx) = ChannelTransport::new();
        let mut session = CanvasSession::new(transport, 100, 100);

        session
            .handle_text(&frame(json!({
                "method": "custom",
                "content": {"event": "mouse_down", "x": 5, "y": 6}
            })))
            .unwrap();

        let message = rx.try_recv().unwrap();
        assert_eq!(message.metadata["content"]["dtype"], "uint8");
        let body: Value = serde_json::from_slice(&message.buffers[0]).unwrap();
        assert_eq!(body[1][1], json!([5.0, 6.0, crate::demo::DOT_RADIUS]));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remote_patch_applied_silently() {
        let (transport, mut rx) = ChannelTransport::new();
        let mut session = CanvasSession::new(transport, 100, 100);

        let handled = session
            .handle_text(&frame(json!({"method": "update", "state": {"width": 64}})))
            .unwrap();

        assert!(matches!(handled, Handled::Patch(_)));
        assert_eq!(session.canvas().width(), 64);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_request_state_replies() {
        let (transport, mut rx) = ChannelTransport::new();
        let mut session = CanvasSession::new(transport, 100, 100);

        session
            .handle_text(&frame(json!({"method": "request_state"})))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().metadata["method"], "update");
    }

    #[test]
    fn test_garbage_frame_is_error() {
        let (transport, _rx) = ChannelTransport::new();
        let mut session = CanvasSession::new(transport, 100, 100);

        let err = session.handle_text("not json").unwrap_err();
        assert!(matches!(err, BridgeError::Frame(_)));

        let err = session
            .handle_text(&frame(json!({"method": "display"})))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Sync(_)));
    }
}
