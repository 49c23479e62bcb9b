//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::AdminKeyValidator;
use crate::config::Args;
use crate::db::HuntStore;
use crate::progress::ProgressionEngine;
use crate::routes;
use crate::types::WaymarkError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Hunt store backing groups, sequences and checkpoints
    pub store: Arc<dyn HuntStore>,
    /// Claim validation and atomic commit
    pub engine: ProgressionEngine,
    /// Admin key gate for the /admin surface
    pub admin_auth: AdminKeyValidator,
    /// Whether the store is MongoDB-backed (false means the in-memory
    /// dev fallback is serving)
    pub mongo_backed: bool,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn HuntStore>, mongo_backed: bool) -> Self {
        // Args::validate has already rejected unparseable policies
        let policy = args.policy().unwrap_or_default();
        let engine = ProgressionEngine::new(Arc::clone(&store), args.admission_radius_km, policy);
        let admin_auth = AdminKeyValidator::new(args.admin_key.clone(), args.dev_mode);

        Self {
            args,
            store,
            engine,
            admin_auth,
            mongo_backed,
        }
    }
}

pub async fn run(state: Arc<AppState>) -> Result<(), WaymarkError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Waymark listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - admin key not required");
    }

    info!(
        "Hunt store backend: {}",
        if state.mongo_backed { "mongodb" } else { "memory" }
    );
    info!(
        "Claim policy: {} (admission radius {} km)",
        state.engine.policy(),
        state.args.admission_radius_km
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Root echo for field clients probing the bare host
        (Method::GET, "/") => to_boxed(routes::root_echo()),

        // Liveness probe - returns 200 if waymark is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Readiness probe - returns 200 only if the store can take traffic
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            to_boxed(routes::readiness_check(Arc::clone(&state)))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // Group credential login
        (Method::POST, "/login") => routes::handle_login(req, Arc::clone(&state)).await,

        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // Hunt progression (/group/{groupNo}/...)
        (_, p) if p.starts_with("/group/") => {
            routes::handle_group_request(req, Arc::clone(&state), p).await
        }

        // Admin surface (/admin/...)
        (_, p) if p.starts_with("/admin") => {
            to_boxed(routes::handle_admin_request(req, Arc::clone(&state), p).await)
        }

        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
