//! The canvas object: property state, command batching and inbound dispatch
//! bound to one transport.

use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::command::{Command, FillRule, Matrix, Operand};
use crate::comm::CommMessage;
use crate::error::{CallbackError, SyncResult};
use crate::flush::{FlushController, FlushMode};
use crate::inbound::{CallbackId, DispatchReport, EventKind, InboundEvent, InboundHandler};
use crate::property::Binary;
use crate::state::{CanvasState, PatchOutcome, Snapshot, StateLayer};
use crate::transport::Transport;

/// What an inbound comm message resulted in.
#[derive(Debug)]
pub enum Handled {
    /// A property patch was applied.
    Patch(PatchOutcome),
    /// An event was dispatched to callbacks.
    Event(DispatchReport),
    /// The full state was sent in reply.
    StateSent,
}

/// A drawing surface mirrored by a remote renderer.
///
/// # Example
///
/// ```
/// use canvas_sync::{Canvas, MemoryTransport};
///
/// let mut canvas = Canvas::new(MemoryTransport::new());
/// canvas
///     .hold(|c| {
///         c.fill_rect(0.0, 0.0, 10.0, None)?;
///         c.stroke_line(0.0, 0.0, 10.0, 10.0)
///     })
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(canvas.transport().sent().len(), 1);
/// ```
#[derive(Debug)]
pub struct Canvas<T> {
    state: CanvasState,
    flush: FlushController,
    inbound: InboundHandler,
    transport: T,
}

impl<T: Transport> Canvas<T> {
    /// Create a canvas with default properties bound to `transport`.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            state: CanvasState::new(),
            flush: FlushController::new(),
            inbound: InboundHandler::new(),
            transport,
        }
    }

    /// Create a canvas with the given size. Nothing is sent.
    #[must_use]
    pub fn with_size(transport: T, width: i32, height: i32) -> Self {
        let mut canvas = Self::new(transport);
        canvas.state.width.set(width);
        canvas.state.height.set(height);
        canvas
    }

    /// The bound transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the bound transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Property state.
    #[must_use]
    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    /// Mutable property state, e.g. to register observers.
    ///
    /// Values assigned through this reference are not sent to the renderer.
    pub fn state_mut(&mut self) -> &mut CanvasState {
        &mut self.state
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> i32 {
        *self.state.width.get()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> i32 {
        *self.state.height.get()
    }

    /// Whether the renderer reports its pixels back.
    #[must_use]
    pub fn sync_image_data(&self) -> bool {
        *self.state.sync_image_data.get()
    }

    /// Last pixel data reported by the renderer.
    #[must_use]
    pub fn image_data(&self) -> Option<&Binary> {
        self.state.image_data.get().as_ref()
    }

    /// Set the width and send the change.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the patch cannot be delivered.
    pub fn set_width(&mut self, width: i32) -> SyncResult<()> {
        if self.state.width.set(width) {
            let patch = Snapshot::of(&[&self.state.width]);
            self.send_update(patch)?;
        }
        Ok(())
    }

    /// Set the height and send the change.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the patch cannot be delivered.
    pub fn set_height(&mut self, height: i32) -> SyncResult<()> {
        if self.state.height.set(height) {
            let patch = Snapshot::of(&[&self.state.height]);
            self.send_update(patch)?;
        }
        Ok(())
    }

    /// Ask the renderer to report (or stop reporting) its pixels.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the patch cannot be delivered.
    pub fn set_sync_image_data(&mut self, sync: bool) -> SyncResult<()> {
        if self.state.sync_image_data.set(sync) {
            let patch = Snapshot::of(&[&self.state.sync_image_data]);
            self.send_update(patch)?;
        }
        Ok(())
    }

    /// Replace the CSS classes of the view and send the change.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the patch cannot be delivered.
    pub fn set_dom_classes(&mut self, classes: Vec<String>) -> SyncResult<()> {
        if self.state.base.dom_classes.set(classes) {
            let patch = Snapshot::of(&[&self.state.base.dom_classes]);
            self.send_update(patch)?;
        }
        Ok(())
    }

    /// Serialize every declared property.
    #[must_use]
    pub fn serialize_state(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Apply a patch received from the renderer. Nothing is echoed back.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>, buffers: &[Bytes]) -> PatchOutcome {
        self.state.patch(patch, buffers)
    }

    /// Send the full state as an update.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the message cannot be delivered.
    pub fn send_state(&mut self) -> SyncResult<()> {
        let snapshot = self.serialize_state();
        self.send_update(snapshot)
    }

    fn send_update(&mut self, snapshot: Snapshot) -> SyncResult<()> {
        let message = CommMessage::Update {
            state: snapshot.state,
        };
        self.transport.send(message.to_value(), snapshot.buffers)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Register a callback for renderer events of `kind`.
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> CallbackId
    where
        F: FnMut(&InboundEvent) -> Result<(), CallbackError> + Send + 'static,
    {
        self.inbound.on(kind, callback)
    }

    /// Unregister a callback.
    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        self.inbound.remove(id)
    }

    /// Route a comm message from the renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is malformed, or if a state request
    /// cannot be answered.
    pub fn handle_message(&mut self, metadata: &Value, buffers: &[Bytes]) -> SyncResult<Handled> {
        match CommMessage::from_value(metadata)? {
            CommMessage::Update { state } => Ok(Handled::Patch(self.apply_patch(&state, buffers))),
            CommMessage::Custom { content } => Ok(Handled::Event(self.inbound.handle(&content))),
            CommMessage::RequestState => {
                self.send_state()?;
                Ok(Handled::StateSent)
            }
        }
    }

    // ------------------------------------------------------------------
    // Batching
    // ------------------------------------------------------------------

    /// Current flush mode.
    #[must_use]
    pub fn flush_mode(&self) -> FlushMode {
        self.flush.mode()
    }

    /// Commands waiting for the next flush.
    #[must_use]
    pub fn pending_commands(&self) -> &[Command] {
        self.flush.buffer().commands()
    }

    /// Number of batches sent so far.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.flush.flush_count()
    }

    /// Drop a pending command, e.g. after it failed to encode.
    pub fn discard_pending(&mut self, index: usize) -> Option<Command> {
        self.flush.buffer_mut().remove(index)
    }

    /// Keep only the pending commands matching `keep`.
    pub fn retain_pending(&mut self, keep: impl FnMut(&Command) -> bool) {
        self.flush.buffer_mut().retain(keep);
    }

    /// Append a command, flushing immediately unless caching.
    ///
    /// # Errors
    ///
    /// Returns the flush error in immediate mode; the command stays pending.
    pub fn send_command(&mut self, command: Command) -> SyncResult<()> {
        self.flush.send_command(command, &mut self.transport)
    }

    /// Send every pending command as one batch.
    ///
    /// # Errors
    ///
    /// Returns an encoding or transport error; pending commands are kept.
    pub fn flush(&mut self) -> SyncResult<()> {
        self.flush.flush(&mut self.transport)
    }

    /// Start holding commands.
    pub fn begin_caching(&mut self) {
        self.flush.begin_caching();
    }

    /// Stop holding commands and send them as one batch.
    ///
    /// # Errors
    ///
    /// Returns the flush error; held commands are kept.
    pub fn end_caching(&mut self) -> SyncResult<()> {
        self.flush.end_caching(&mut self.transport)
    }

    /// Run `draw` with commands held, then send them as one batch.
    ///
    /// Inside an existing caching window `draw` simply runs and the outer
    /// window sends the batch.
    ///
    /// If `draw` panics the canvas is back in immediate mode, nothing is
    /// sent and the held commands stay pending.
    ///
    /// # Errors
    ///
    /// Returns the flush error of the closing flush.
    pub fn hold<R>(&mut self, draw: impl FnOnce(&mut Self) -> R) -> SyncResult<R> {
        if self.flush.is_caching() {
            return Ok(draw(self));
        }
        self.begin_caching();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| draw(&mut *self))) {
            Ok(result) => result,
            Err(payload) => {
                self.flush.abort_caching();
                panic::resume_unwind(payload);
            }
        };
        self.end_caching()?;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// Fill a rectangle. A missing height draws a square.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: impl Into<Option<f64>>,
    ) -> SyncResult<()> {
        let height = height.into().unwrap_or(width);
        self.send_command(Command::FillRect { x, y, width, height })
    }

    /// Outline a rectangle. A missing height draws a square.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: impl Into<Option<f64>>,
    ) -> SyncResult<()> {
        let height = height.into().unwrap_or(width);
        self.send_command(Command::StrokeRect { x, y, width, height })
    }

    /// Erase a rectangle. A missing height clears a square.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn clear_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: impl Into<Option<f64>>,
    ) -> SyncResult<()> {
        let height = height.into().unwrap_or(width);
        self.send_command(Command::ClearRect { x, y, width, height })
    }

    /// Fill many rectangles in one command.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_rects(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        width: Vec<f64>,
        height: Vec<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::FillRects { x, y, width, height })
    }

    /// Outline many rectangles in one command.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_rects(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        width: Vec<f64>,
        height: Vec<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::StrokeRects { x, y, width, height })
    }

    /// Fill an arc.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::FillArc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Outline an arc.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::StrokeArc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Fill many arcs sharing a direction.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_arcs(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        radius: Vec<f64>,
        start_angle: Vec<f64>,
        end_angle: Vec<f64>,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::FillArcs {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Outline many arcs sharing a direction.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_arcs(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        radius: Vec<f64>,
        start_angle: Vec<f64>,
        end_angle: Vec<f64>,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::StrokeArcs {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Fill a circle.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_circle(&mut self, x: f64, y: f64, radius: f64) -> SyncResult<()> {
        self.send_command(Command::FillCircle { x, y, radius })
    }

    /// Outline a circle.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_circle(&mut self, x: f64, y: f64, radius: f64) -> SyncResult<()> {
        self.send_command(Command::StrokeCircle { x, y, radius })
    }

    /// Fill many circles.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_circles(&mut self, x: Vec<f64>, y: Vec<f64>, radius: Vec<f64>) -> SyncResult<()> {
        self.send_command(Command::FillCircles { x, y, radius })
    }

    /// Outline many circles.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_circles(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        radius: Vec<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::StrokeCircles { x, y, radius })
    }

    /// Draw a line segment.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> SyncResult<()> {
        self.send_command(Command::StrokeLine { x1, y1, x2, y2 })
    }

    /// Fill a closed polygon.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_polygon(&mut self, points: Vec<(f64, f64)>) -> SyncResult<()> {
        self.send_command(Command::FillPolygon { points })
    }

    /// Outline a closed polygon.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_polygon(&mut self, points: Vec<(f64, f64)>) -> SyncResult<()> {
        self.send_command(Command::StrokePolygon { points })
    }

    /// Outline an open polyline.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_lines(&mut self, points: Vec<(f64, f64)>) -> SyncResult<()> {
        self.send_command(Command::StrokeLines { points })
    }

    /// Start a new path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn begin_path(&mut self) -> SyncResult<()> {
        self.send_command(Command::BeginPath)
    }

    /// Close the current sub-path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn close_path(&mut self) -> SyncResult<()> {
        self.send_command(Command::ClosePath)
    }

    /// Outline the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke(&mut self) -> SyncResult<()> {
        self.send_command(Command::Stroke)
    }

    /// Fill the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill(&mut self, rule: FillRule) -> SyncResult<()> {
        self.send_command(Command::Fill { rule })
    }

    /// Fill a path widget identified by its model id.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_path(&mut self, path_model_id: impl Into<String>) -> SyncResult<()> {
        self.send_command(Command::FillPath {
            path_model_id: path_model_id.into(),
        })
    }

    /// Move the pen.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn move_to(&mut self, x: f64, y: f64) -> SyncResult<()> {
        self.send_command(Command::MoveTo { x, y })
    }

    /// Add a straight segment.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn line_to(&mut self, x: f64, y: f64) -> SyncResult<()> {
        self.send_command(Command::LineTo { x, y })
    }

    /// Add a rectangle to the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> SyncResult<()> {
        self.send_command(Command::Rect { x, y, width, height })
    }

    /// Add an arc to the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Add an ellipse to the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) -> SyncResult<()> {
        self.send_command(Command::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
            start_angle,
            end_angle,
            anticlockwise,
        })
    }

    /// Add an arc tangent to two lines.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) -> SyncResult<()> {
        self.send_command(Command::ArcTo {
            x1,
            y1,
            x2,
            y2,
            radius,
        })
    }

    /// Add a quadratic curve.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn quadratic_curve_to(&mut self, cp_x: f64, cp_y: f64, x: f64, y: f64) -> SyncResult<()> {
        self.send_command(Command::QuadraticCurveTo { cp_x, cp_y, x, y })
    }

    /// Add a cubic curve.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn bezier_curve_to(
        &mut self,
        cp1_x: f64,
        cp1_y: f64,
        cp2_x: f64,
        cp2_y: f64,
        x: f64,
        y: f64,
    ) -> SyncResult<()> {
        self.send_command(Command::BezierCurveTo {
            cp1_x,
            cp1_y,
            cp2_x,
            cp2_y,
            x,
            y,
        })
    }

    /// Fill text.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn fill_text(
        &mut self,
        text: impl Into<String>,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::FillText {
            text: text.into(),
            x,
            y,
            max_width,
        })
    }

    /// Outline text.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn stroke_text(
        &mut self,
        text: impl Into<String>,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::StrokeText {
            text: text.into(),
            x,
            y,
            max_width,
        })
    }

    /// Set the dash pattern for strokes.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn set_line_dash(&mut self, segments: Vec<f64>) -> SyncResult<()> {
        self.send_command(Command::SetLineDash { segments })
    }

    /// Draw an image widget identified by its model id.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn draw_image(
        &mut self,
        image_model_id: impl Into<String>,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> SyncResult<()> {
        self.send_command(Command::DrawImage {
            image_model_id: image_model_id.into(),
            x,
            y,
            width,
            height,
        })
    }

    /// Paint the pixels of an image widget, unscaled, at a position.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn put_image_data(
        &mut self,
        image_model_id: impl Into<String>,
        x: f64,
        y: f64,
    ) -> SyncResult<()> {
        self.send_command(Command::PutImageData {
            image_model_id: image_model_id.into(),
            x,
            y,
        })
    }

    /// Clip to the current path.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn clip(&mut self) -> SyncResult<()> {
        self.send_command(Command::Clip)
    }

    /// Push the drawing state.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn save(&mut self) -> SyncResult<()> {
        self.send_command(Command::Save)
    }

    /// Pop the drawing state.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn restore(&mut self) -> SyncResult<()> {
        self.send_command(Command::Restore)
    }

    /// Translate the coordinate system.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn translate(&mut self, x: f64, y: f64) -> SyncResult<()> {
        self.send_command(Command::Translate { x, y })
    }

    /// Rotate the coordinate system by `angle` radians.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn rotate(&mut self, angle: f64) -> SyncResult<()> {
        self.send_command(Command::Rotate { angle })
    }

    /// Scale the coordinate system.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn scale(&mut self, x: f64, y: f64) -> SyncResult<()> {
        self.send_command(Command::Scale { x, y })
    }

    /// Multiply the current transform.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn transform(&mut self, matrix: Matrix) -> SyncResult<()> {
        self.send_command(Command::Transform(matrix))
    }

    /// Replace the current transform.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn set_transform(&mut self, matrix: Matrix) -> SyncResult<()> {
        self.send_command(Command::SetTransform(matrix))
    }

    /// Reset the transform to identity.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn reset_transform(&mut self) -> SyncResult<()> {
        self.send_command(Command::ResetTransform)
    }

    /// Set a drawing-state attribute such as `fillStyle` or `lineWidth`.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Operand>) -> SyncResult<()> {
        self.send_command(Command::Set {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// Clear the whole canvas.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn clear(&mut self) -> SyncResult<()> {
        self.send_command(Command::Clear)
    }

    /// Pause the renderer for `milliseconds` before the next command.
    ///
    /// # Errors
    ///
    /// See [`Canvas::send_command`].
    pub fn sleep(&mut self, milliseconds: u32) -> SyncResult<()> {
        self.send_command(Command::Sleep { milliseconds })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::decode_batch;
    use crate::error::SyncError;
    use crate::transport::MemoryTransport;
    use crate::Opcode;
    use serde_json::json;

    fn canvas() -> Canvas<MemoryTransport> {
        Canvas::new(MemoryTransport::new())
    }

    #[test]
    fn test_new_canvas_defaults() {
        let canvas = canvas();
        assert_eq!(canvas.width(), 700);
        assert_eq!(canvas.height(), 500);
        assert!(!canvas.sync_image_data());
        assert!(canvas.image_data().is_none());
        assert_eq!(canvas.flush_mode(), FlushMode::Immediate);
        assert!(canvas.pending_commands().is_empty());
        assert!(canvas.transport().sent().is_empty());
    }

    #[test]
    fn test_fill_rect_missing_height_uses_width() {
        let mut three = canvas();
        let mut four = canvas();

        three.fill_rect(1.0, 2.0, 3.0, None).unwrap();
        four.fill_rect(1.0, 2.0, 3.0, 3.0).unwrap();

        assert_eq!(three.transport().sent(), four.transport().sent());
        assert_eq!(
            three.transport().sent()[0].buffers[0].as_ref(),
            b"[[0,[1.0,2.0,3.0,3.0]]]"
        );
    }

    #[test]
    fn test_setter_sends_one_property_patch() {
        let mut canvas = canvas();

        canvas.set_width(320).unwrap();
        canvas.set_width(320).unwrap();

        let sent = canvas.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].metadata,
            json!({"method": "update", "state": {"width": 320}})
        );
        assert!(sent[0].buffers.is_empty());
    }

    #[test]
    fn test_remote_patch_not_echoed() {
        let mut canvas = canvas();

        let handled = canvas
            .handle_message(&json!({"method": "update", "state": {"height": 12}}), &[])
            .unwrap();

        assert!(matches!(handled, Handled::Patch(ref o) if o.applied == ["height"]));
        assert_eq!(canvas.height(), 12);
        assert!(canvas.transport().sent().is_empty());
    }

    #[test]
    fn test_remote_image_data_resolves_buffer() {
        let mut canvas = canvas();
        let pixels = Bytes::from_static(&[9, 8, 7, 6]);

        canvas
            .handle_message(
                &json!({"method": "update", "state": {"image_data": "@buffer_reference@0"}}),
                &[pixels.clone()],
            )
            .unwrap();

        assert_eq!(canvas.image_data().map(|b| b.0.clone()), Some(pixels));
    }

    #[test]
    fn test_request_state_replies_with_snapshot() {
        let mut canvas = canvas();

        let handled = canvas
            .handle_message(&json!({"method": "request_state"}), &[])
            .unwrap();

        assert!(matches!(handled, Handled::StateSent));
        let sent = &canvas.transport().sent()[0];
        assert_eq!(sent.metadata["method"], "update");
        assert_eq!(sent.metadata["state"]["width"], 700);
        assert_eq!(sent.metadata["state"]["_view_name"], "CanvasView");
    }

    #[test]
    fn test_custom_message_dispatches_event() {
        let mut canvas = canvas();
        canvas.on(EventKind::MouseDown, |_| Ok(()));

        let handled = canvas
            .handle_message(
                &json!({"method": "custom", "content": {"event": "mouse_down", "x": 1, "y": 2}}),
                &[],
            )
            .unwrap();

        match handled {
            Handled::Event(report) => {
                assert_eq!(report.kind, Some(EventKind::MouseDown));
                assert_eq!(report.delivered, 1);
            }
            other => panic!("Expected Event, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_envelope_is_error() {
        let mut canvas = canvas();
        let err = canvas.handle_message(&json!({"state": {}}), &[]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidMessage(_)));
    }

    #[test]
    fn test_hold_sends_single_batch() {
        let mut canvas = canvas();

        let value = canvas
            .hold(|c| {
                c.save().unwrap();
                c.translate(5.0, 5.0).unwrap();
                c.set("fillStyle", "red").unwrap();
                c.fill_circle(0.0, 0.0, 2.0).unwrap();
                c.restore().unwrap();
                42
            })
            .unwrap();

        assert_eq!(value, 42);
        let sent = canvas.transport().sent();
        assert_eq!(sent.len(), 1);
        let opcodes: Vec<_> = decode_batch(&sent[0].buffers[0])
            .unwrap()
            .into_iter()
            .map(|w| w.opcode)
            .collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::Save,
                Opcode::Translate,
                Opcode::Set,
                Opcode::FillCircle,
                Opcode::Restore
            ]
        );
    }

    #[test]
    fn test_nested_hold_flushes_once_at_outer_end() {
        let mut canvas = canvas();

        canvas
            .hold(|c| {
                c.clear().unwrap();
                c.hold(|inner| inner.begin_path().unwrap()).unwrap();
                assert!(c.transport().sent().is_empty());
                c.stroke().unwrap();
            })
            .unwrap();

        assert_eq!(canvas.transport().sent().len(), 1);
        assert_eq!(canvas.flush_count(), 1);
    }

    #[test]
    fn test_hold_panic_returns_to_immediate_mode() {
        let mut canvas = canvas();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            canvas.hold(|c| {
                c.save().unwrap();
                panic!("draw failed");
            })
        }));

        assert!(outcome.is_err());
        assert_eq!(canvas.flush_mode(), FlushMode::Immediate);
        assert_eq!(canvas.pending_commands(), &[Command::Save]);
        assert!(canvas.transport().sent().is_empty());

        canvas.restore().unwrap();
        let sent = canvas.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_batch(&sent[0].buffers[0]).unwrap().len(), 2);
    }

    #[test]
    fn test_put_image_data_sends_model_reference() {
        let mut canvas = canvas();
        canvas.put_image_data("IPY_MODEL_pixels", 3.0, 4.0).unwrap();

        let sent = canvas.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].buffers.len(), 1);
        let decoded = decode_batch(&sent[0].buffers[0]).unwrap();
        assert_eq!(decoded[0].opcode, Opcode::PutImageData);
        assert_eq!(
            decoded[0].operands,
            vec![json!("IPY_MODEL_pixels"), json!(3.0), json!(4.0)]
        );
    }

    #[test]
    fn test_discard_pending_then_retry() {
        let mut canvas = canvas();
        canvas.begin_caching();
        canvas.move_to(0.0, 0.0).unwrap();
        canvas.line_to(f64::NAN, 1.0).unwrap();

        assert!(canvas.end_caching().is_err());
        assert_eq!(canvas.pending_commands().len(), 2);

        assert!(canvas.discard_pending(1).is_some());
        canvas.flush().unwrap();
        assert!(canvas.pending_commands().is_empty());
    }

    #[test]
    fn test_retain_pending_drops_unencodable() {
        let mut canvas = canvas();
        canvas.begin_caching();
        canvas.rotate(f64::INFINITY).unwrap();
        canvas.stroke().unwrap();

        assert!(canvas.flush().is_err());
        canvas.retain_pending(|c| c.operands().iter().all(Operand::is_finite));
        canvas.end_caching().unwrap();

        assert!(canvas.pending_commands().is_empty());
        assert_eq!(canvas.transport().sent().len(), 1);
    }
}
