//! Click-to-draw demo attached to every bridged canvas.
//!
//! Callbacks cannot borrow the canvas they are registered on, so the
//! `mouse_down` callback only records the position and the connection task
//! paints the queued clicks once dispatch returns.

use std::sync::{Arc, Mutex, PoisonError};

use canvas_sync::{Canvas, EventKind, SyncResult, Transport};

/// Fill colour of the painted dots.
pub const DOT_STYLE: &str = "#1e88e5";

/// Radius of the painted dots.
pub const DOT_RADIUS: f64 = 6.0;

/// Queues clicks reported by the renderer and paints them as dots.
#[derive(Debug, Clone, Default)]
pub struct ClickPainter {
    clicks: Arc<Mutex<Vec<(f64, f64)>>>,
}

impl ClickPainter {
    /// Register the `mouse_down` callback on `canvas`.
    pub fn attach<T: Transport>(canvas: &mut Canvas<T>) -> Self {
        let painter = Self::default();
        let clicks = Arc::clone(&painter.clicks);
        canvas.on(EventKind::MouseDown, move |event| {
            let position = event.position().ok_or("mouse_down without x/y")?;
            clicks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(position);
            Ok(())
        });
        painter
    }

    /// Number of clicks waiting to be painted.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Paint every queued click as one batch. Returns the number painted.
    ///
    /// # Errors
    ///
    /// Returns the flush error. The painted dots stay pending on the canvas
    /// and go out with its next successful flush, so the clicks are not
    /// queued again.
    pub fn paint<T: Transport>(&self, canvas: &mut Canvas<T>) -> SyncResult<usize> {
        let clicks = std::mem::take(
            &mut *self
                .clicks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if clicks.is_empty() {
            return Ok(0);
        }
        canvas.hold(|c| -> SyncResult<usize> {
            c.set("fillStyle", DOT_STYLE)?;
            for &(x, y) in &clicks {
                c.fill_circle(x, y, DOT_RADIUS)?;
            }
            Ok(clicks.len())
        })?
    }
}
