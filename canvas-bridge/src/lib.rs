//! # Canvas Bridge Library
//!
//! WebSocket host that attaches a synchronized canvas to each connected
//! renderer. This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;

pub mod demo;
pub mod error;
pub mod frame;
pub mod health;
pub mod session;
pub mod transport;

pub use demo::ClickPainter;
pub use error::{BridgeError, BridgeResult};
pub use frame::{FrameError, WireFrame};
pub use session::{handle_canvas_socket, CanvasSession};
pub use transport::ChannelTransport;

/// Default port for the bridge.
pub const DEFAULT_PORT: u16 = 9473;

/// Command-line arguments for canvas-bridge.
#[derive(Debug, Clone, Parser)]
#[command(name = "canvas-bridge")]
#[command(about = "Serve synchronized canvases to WebSocket renderers")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on (localhost only)
    #[arg(long, env = "CANVAS_BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Initial canvas width in pixels
    #[arg(long, env = "CANVAS_WIDTH", default_value_t = canvas_sync::state::DEFAULT_WIDTH)]
    pub width: i32,

    /// Initial canvas height in pixels
    #[arg(long, env = "CANVAS_HEIGHT", default_value_t = canvas_sync::state::DEFAULT_HEIGHT)]
    pub height: i32,
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Port to listen on.
    pub port: u16,
    /// Width of each new canvas.
    pub width: i32,
    /// Height of each new canvas.
    pub height: i32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            width: canvas_sync::state::DEFAULT_WIDTH,
            height: canvas_sync::state::DEFAULT_HEIGHT,
        }
    }
}

impl From<CliArgs> for BridgeConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            port: args.port,
            width: args.width,
            height: args.height,
        }
    }
}

/// Counts open canvas connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
}

/// Marks one open connection until dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    /// Record a new connection.
    #[must_use]
    pub fn enter(&self) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of open connections.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Bridge configuration.
    pub config: Arc<BridgeConfig>,
    /// Open canvas connections.
    pub connections: ConnectionTracker,
}

impl AppState {
    /// Create state for the given configuration.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(config),
            connections: ConnectionTracker::default(),
        }
    }
}

/// Build the bridge routes.
///
/// - `GET /health` - readiness and open connection count
/// - `GET /health/live` - liveness probe
/// - `GET /ws` - canvas WebSocket
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health", get(health::readiness))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Canvas WebSocket handler.
#[tracing::instrument(name = "websocket_connect", skip(ws, state))]
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_canvas_socket(socket, state))
}
