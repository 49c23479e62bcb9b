//! Health check endpoints
//!
//! Provides Kubernetes-style health probes:
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /ready, /readyz - Readiness probe (is the service ready for traffic?)
//!
//! Liveness probes return 200 whenever waymark is running, regardless of
//! which store backs it. Readiness probes return 200 only when the hunt
//! store is durable (MongoDB), UNLESS dev_mode is enabled (the in-memory
//! fallback store is acceptable for development).

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Health response for probes and the operator dashboard
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// Service status for UI display: 'online' or 'degraded'
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// Node identifier
    pub node_id: String,
    /// Hunt store backend details
    pub store: StoreHealth,
    /// Active claim policy
    #[serde(rename = "claimPolicy")]
    pub claim_policy: &'static str,
    /// Explanation when running on the non-durable fallback store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Hunt store backend details
#[derive(Serialize)]
pub struct StoreHealth {
    /// Which backend holds hunt state: 'mongodb' or 'memory'
    pub backend: &'static str,
}

/// Build health response with current state
fn build_health_response(state: &AppState) -> HealthResponse {
    let args = &state.args;

    // The in-memory fallback serves traffic but loses progress on
    // restart; surface that as degraded even in dev mode.
    let status = if state.mongo_backed {
        "online"
    } else {
        "degraded"
    };

    let error = if state.mongo_backed {
        None
    } else {
        Some("MongoDB not connected - hunt progress is held in memory".to_string())
    };

    HealthResponse {
        healthy: true, // Service is running
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: args.node_id.to_string(),
        store: StoreHealth {
            backend: if state.mongo_backed {
                "mongodb"
            } else {
                "memory"
            },
        },
        claim_policy: state.engine.policy().as_str(),
        error,
    }
}

/// Handle liveness probe (/health, /healthz)
///
/// Returns 200 OK if the waymark service is running. The response body
/// names the store backend so callers can see whether progress is
/// durable.
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":true,"error":"Serialization failed"}"#.to_string());

    // Liveness probe: always return 200 if service is running
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle readiness probe (/ready, /readyz)
///
/// Returns 200 OK only if waymark should accept traffic.
/// In production: requires the MongoDB-backed store.
/// In dev mode: the in-memory fallback store is acceptable.
/// Use this endpoint for load balancer health checks.
pub fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let is_ready = state.mongo_backed || state.args.dev_mode;

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":false,"error":"Serialization failed"}"#.to_string());

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
///
/// Returns build information for deployment verification.
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "waymark",
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"version":"unknown","commit":"unknown"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle root endpoint (/)
///
/// Simple liveness echo kept for field clients that probe the bare host.
pub fn root_echo() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(r#"{"res":"success"}"#)))
        .unwrap()
}
