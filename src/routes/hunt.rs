//! Player-facing hunt routes
//!
//! ## Endpoints
//!
//! - `GET  /group/{groupNo}/checkpoint` - Current checkpoint with clue and task
//! - `POST /group/{groupNo}/validate`   - Claim a checkpoint from a physical location
//! - `GET  /group/{groupNo}/progress`   - Visited history and completion state
//!
//! Boolean results ride under the `res` field. Reference coordinates
//! never appear in any response, and a rejected claim carries a code
//! but not the measured distance; repeated probing must not let a
//! client triangulate a checkpoint.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::geo::GeoPoint;
use crate::ident::CheckpointId;
use crate::progress::{current_checkpoint, ClaimOutcome, CurrentCheckpoint};
use crate::server::AppState;
use crate::types::WaymarkError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub ckpt_no: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Checkpoint metadata as shown to players (no reference coordinates)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointView {
    pub ckpt_no: String,
    pub clue: String,
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCheckpointResponse {
    pub res: &'static str,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub res: &'static str,
    pub visited_ckpts: Vec<String>,
    pub total: usize,
    pub complete: bool,
    pub members: Vec<String>,
    pub done_tasks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResResponse {
    pub res: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FailResponse {
    pub res: &'static str,
    pub code: &'static str,
}

// =============================================================================
// Routing
// =============================================================================

/// Route /group/{groupNo}/* requests
pub async fn handle_group_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<BoxBody> {
    let subpath = path.strip_prefix("/group/").unwrap_or("");
    let Some((group_no, action)) = subpath.split_once('/') else {
        return not_found();
    };
    if group_no.is_empty() {
        return not_found();
    }

    let method = req.method().clone();
    match (method, action) {
        (Method::GET, "checkpoint") => handle_current_checkpoint(state, group_no).await,
        (Method::POST, "validate") => handle_validate(req, state, group_no).await,
        (Method::GET, "progress") => handle_progress(state, group_no).await,
        _ => not_found(),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /group/{groupNo}/checkpoint
///
/// Returns the group's current checkpoint, or a completion marker once
/// every checkpoint of the sequence is visited.
async fn handle_current_checkpoint(state: Arc<AppState>, group_no: &str) -> Response<BoxBody> {
    let current = match state.engine.current_for_group(group_no).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let ckpt_no = match current {
        CurrentCheckpoint::Complete => {
            return json_response(
                StatusCode::OK,
                &CurrentCheckpointResponse {
                    res: "success",
                    complete: true,
                    checkpoint: None,
                },
            )
        }
        CurrentCheckpoint::Next(ckpt_no) => ckpt_no,
    };

    let checkpoint = match state.store.get_checkpoint(&ckpt_no).await {
        Ok(c) => c,
        // The sequence names an id the catalog does not carry
        Err(WaymarkError::NotFound(_)) => {
            return error_response(&WaymarkError::Integrity(format!(
                "sequence references unknown checkpoint '{}'",
                ckpt_no
            )))
        }
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &CurrentCheckpointResponse {
            res: "success",
            complete: false,
            checkpoint: Some(CheckpointView {
                ckpt_no: checkpoint.ckpt_no.to_string(),
                clue: checkpoint.clue,
                task: checkpoint.task,
                image: checkpoint.image,
            }),
        },
    )
}

/// POST /group/{groupNo}/validate
///
/// Validates a location claim and commits it on success. Rejections
/// answer 200 with `res: fail` and a code; only the losing side of a
/// commit race gets 409 so clients know to re-read and retry.
async fn handle_validate(
    req: Request<Incoming>,
    state: Arc<AppState>,
    group_no: &str,
) -> Response<BoxBody> {
    let body: ValidateRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.ckpt_no.is_empty() {
        return error_response(&WaymarkError::Http("ckptNo must not be empty".into()));
    }

    let claimed = CheckpointId::from(body.ckpt_no);
    let position = GeoPoint::new(body.latitude, body.longitude);

    let outcome = match state.engine.commit_claim(group_no, &claimed, position).await {
        Ok(o) => o,
        Err(e) => return error_response(&e),
    };

    match outcome {
        ClaimOutcome::Committed => json_response(StatusCode::OK, &ResResponse { res: "success" }),
        ClaimOutcome::OutOfRange => claim_rejection(StatusCode::OK, "OUT_OF_RANGE"),
        ClaimOutcome::OutOfOrder => claim_rejection(StatusCode::OK, "OUT_OF_ORDER"),
        ClaimOutcome::AlreadyVisited => claim_rejection(StatusCode::OK, "ALREADY_VISITED"),
        ClaimOutcome::HuntComplete => claim_rejection(StatusCode::OK, "HUNT_COMPLETE"),
        ClaimOutcome::Conflict => claim_rejection(StatusCode::CONFLICT, "CONFLICT"),
    }
}

/// GET /group/{groupNo}/progress
async fn handle_progress(state: Arc<AppState>, group_no: &str) -> Response<BoxBody> {
    let group = match state.store.get_group(group_no).await {
        Ok(g) => g,
        Err(e) => return error_response(&e),
    };
    let sequence = match state.store.get_sequence(&group.seq_id).await {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };

    let complete = match current_checkpoint(&group.visited_ckpts, &sequence.sequence) {
        Ok(c) => c.is_complete(),
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &ProgressResponse {
            res: "success",
            visited_ckpts: group.visited_ckpts.iter().map(|c| c.to_string()).collect(),
            total: sequence.sequence.len(),
            complete,
            members: group.members,
            done_tasks: group.done_tasks,
        },
    )
}

// =============================================================================
// Response Helpers
// =============================================================================

fn claim_rejection(status: StatusCode, code: &'static str) -> Response<BoxBody> {
    json_response(status, &FailResponse { res: "fail", code })
}

fn not_found() -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &FailResponse {
            res: "fail",
            code: "NOT_FOUND",
        },
    )
}

fn error_response(err: &WaymarkError) -> Response<BoxBody> {
    let (status, code) = match err {
        WaymarkError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        WaymarkError::Integrity(_) => {
            error!("Integrity fault: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "INTEGRITY_FAULT")
        }
        WaymarkError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        WaymarkError::Http(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    json_response(status, &FailResponse { res: "fail", code })
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, x-admin-key")
        .body(full_body(json))
        .unwrap()
}

fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, WaymarkError> {
    let body = req
        .collect()
        .await
        .map_err(|e| WaymarkError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(WaymarkError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| WaymarkError::Http(format!("Invalid JSON: {}", e)))
}
