//! Inbound events from the renderer and callback dispatch.

use serde_json::Value;

use crate::error::CallbackError;

/// Kinds of event the renderer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Generic interaction event.
    Interaction,
    /// The renderer finished initialising and can receive batches.
    ClientReady,
    /// Pointer moved over the canvas.
    MouseMove,
    /// Pointer button pressed.
    MouseDown,
    /// Pointer button released.
    MouseUp,
    /// Pointer left the canvas.
    MouseOut,
    /// Touch started.
    TouchStart,
    /// Touch ended.
    TouchEnd,
    /// Touch moved.
    TouchMove,
    /// Touch cancelled.
    TouchCancel,
    /// Key pressed while the canvas had focus.
    KeyDown,
}

impl EventKind {
    /// Parse the `event` field of an inbound message.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "interaction" => Self::Interaction,
            "client_ready" => Self::ClientReady,
            "mouse_move" => Self::MouseMove,
            "mouse_down" => Self::MouseDown,
            "mouse_up" => Self::MouseUp,
            "mouse_out" => Self::MouseOut,
            "touch_start" => Self::TouchStart,
            "touch_end" => Self::TouchEnd,
            "touch_move" => Self::TouchMove,
            "touch_cancel" => Self::TouchCancel,
            "key_down" => Self::KeyDown,
            _ => return None,
        })
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interaction => "interaction",
            Self::ClientReady => "client_ready",
            Self::MouseMove => "mouse_move",
            Self::MouseDown => "mouse_down",
            Self::MouseUp => "mouse_up",
            Self::MouseOut => "mouse_out",
            Self::TouchStart => "touch_start",
            Self::TouchEnd => "touch_end",
            Self::TouchMove => "touch_move",
            Self::TouchCancel => "touch_cancel",
            Self::KeyDown => "key_down",
        }
    }
}

/// An event delivered to callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Full message content, including kind-specific fields.
    pub content: Value,
}

impl InboundEvent {
    /// Pointer position carried as `x`/`y`, if present.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        let x = self.content.get("x")?.as_f64()?;
        let y = self.content.get("y")?.as_f64()?;
        Some((x, y))
    }
}

/// Handle returned by [`InboundHandler::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Callback = Box<dyn FnMut(&InboundEvent) -> Result<(), CallbackError> + Send>;

/// Result of dispatching one message.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Recognised kind, `None` if the message was ignored.
    pub kind: Option<EventKind>,
    /// Callbacks that ran to completion.
    pub delivered: usize,
    /// Callbacks that returned an error, with the error text.
    pub failures: Vec<(CallbackId, String)>,
}

/// Registry of event callbacks, dispatched in registration order.
#[derive(Default)]
pub struct InboundHandler {
    callbacks: Vec<(CallbackId, EventKind, Callback)>,
    next_id: u64,
}

impl std::fmt::Debug for InboundHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundHandler")
            .field("callbacks", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl InboundHandler {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> CallbackId
    where
        F: FnMut(&InboundEvent) -> Result<(), CallbackError> + Send + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, kind, Box::new(callback)));
        id
    }

    /// Unregister a callback. Returns whether it was registered.
    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _, _)| *cid != id);
        self.callbacks.len() != before
    }

    /// Number of callbacks registered for `kind`.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.callbacks.iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Dispatch a message to the callbacks registered for its kind.
    ///
    /// Messages without a known `event` field are ignored. A callback error
    /// is logged and recorded, and the remaining callbacks still run.
    pub fn handle(&mut self, content: &Value) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(kind) = content
            .get("event")
            .and_then(Value::as_str)
            .and_then(EventKind::parse)
        else {
            tracing::trace!("Ignoring inbound message without a known event kind");
            return report;
        };
        report.kind = Some(kind);

        let event = InboundEvent {
            kind,
            content: content.clone(),
        };
        for (id, registered, callback) in &mut self.callbacks {
            if *registered != kind {
                continue;
            }
            match callback(&event) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!("Callback {:?} failed on {}: {}", id, kind.as_str(), err);
                    report.failures.push((*id, err.to_string()));
                }
            }
        }
        report
    }
}
