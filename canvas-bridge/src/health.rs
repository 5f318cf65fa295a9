//! Health check endpoints.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health` - Readiness with the number of open canvases

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Bridge version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// WebSocket handler ready
    pub websocket: bool,
    /// Canvases currently attached to a renderer
    pub active_canvases: usize,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the bridge accepting renderers?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let status = HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            websocket: true,
            active_canvases: state.connections.active(),
        },
    };
    (StatusCode::OK, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeConfig;

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy",
            version: "0.1.0",
            checks: HealthChecks {
                websocket: true,
                active_canvases: 3,
            },
        };

        let json = serde_json::to_value(&status).expect("should serialize");
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["checks"]["active_canvases"], 3);
    }

    #[tokio::test]
    async fn test_readiness_reports_open_connections() {
        let state = AppState::new(BridgeConfig::default());
        let _guard = state.connections.enter();

        let (code, Json(status)) = readiness(State(state)).await;

        assert_eq!(code, StatusCode::OK);
        assert_eq!(status.checks.active_canvases, 1);
    }
}
