//! Admin API endpoints for hunt setup and calibration
//!
//! ## Endpoints
//!
//! - `POST /admin/groups`                      - Bulk insert groups
//! - `POST /admin/sequences`                   - Bulk insert sequences
//! - `POST /admin/checkpoints`                 - Bulk insert checkpoints
//! - `GET  /admin/checkpoints`                 - Full ordered listing
//! - `PUT  /admin/checkpoints/{ckptNo}/coords` - Recalibrate one class slot
//!
//! ## Authentication
//!
//! Every endpoint requires the configured admin key (`x-admin-key` or
//! bearer token); without a configured key the surface is open only in
//! dev mode.
//!
//! Groups arrive with plaintext passwords and are argon2-hashed here;
//! the store never sees a plaintext credential. Inserts skip ids that
//! already exist, so re-running a seed script is harmless.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{extract_admin_key, hash_password};
use crate::db::schemas::{CheckpointDoc, ClassCoords, GroupDoc, SequenceDoc};
use crate::geo::GeoPoint;
use crate::ident::{CheckpointId, GroupClass};
use crate::server::AppState;
use crate::types::WaymarkError;

type FullBody = Full<Bytes>;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroupEntry {
    pub group_no: String,
    pub password: String,
    pub class: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub seq_id: String,
    #[serde(default)]
    pub done_tasks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsertGroupsRequest {
    pub groups: Vec<NewGroupEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSequenceEntry {
    pub seq_id: String,
    pub sequence: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsertSequencesRequest {
    pub sequences: Vec<NewSequenceEntry>,
}

/// Per-class coordinate slots; omitted slots stay uncalibrated
#[derive(Debug, Deserialize)]
pub struct ClassCoordsEntry {
    #[serde(default)]
    pub y: Option<GeoPoint>,
    #[serde(default)]
    pub f: Option<GeoPoint>,
    #[serde(default)]
    pub e: Option<GeoPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckpointEntry {
    pub ckpt_no: String,
    /// Per-class coordinates; mutually exclusive with `sharedCoords`
    #[serde(default)]
    pub coords: Option<ClassCoordsEntry>,
    /// One pair for every class (classification-independent checkpoint)
    #[serde(default)]
    pub shared_coords: Option<GeoPoint>,
    pub clue: String,
    pub task: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsertCheckpointsRequest {
    pub checkpoints: Vec<NewCheckpointEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalibrateRequest {
    pub class: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub res: &'static str,
    pub inserted: usize,
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

/// Checkpoint as listed to operators, reference coordinates included
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckpointView {
    pub ckpt_no: String,
    pub coords: ClassCoords,
    pub clue: String,
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListCheckpointsResponse {
    pub res: &'static str,
    pub checkpoints: Vec<AdminCheckpointView>,
}

// =============================================================================
// Routing
// =============================================================================

/// Route /admin/* requests
pub async fn handle_admin_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<FullBody> {
    let authorized = state.admin_auth.authorize(extract_admin_key(req.headers()));
    if !authorized {
        warn!("Admin request rejected: missing or invalid admin key");
        return json_response(
            StatusCode::UNAUTHORIZED,
            &FailResponse {
                res: "fail",
                code: "UNAUTHORIZED",
            },
        );
    }

    let method = req.method().clone();
    let subpath = path.strip_prefix("/admin").unwrap_or("").to_string();

    match (method, subpath.as_str()) {
        (Method::POST, "/groups") => handle_insert_groups(req, state).await,
        (Method::POST, "/sequences") => handle_insert_sequences(req, state).await,
        (Method::POST, "/checkpoints") => handle_insert_checkpoints(req, state).await,
        (Method::GET, "/checkpoints") => handle_list_checkpoints(state).await,
        (Method::PUT, p) if p.starts_with("/checkpoints/") && p.ends_with("/coords") => {
            let ckpt_no = p
                .strip_prefix("/checkpoints/")
                .and_then(|s| s.strip_suffix("/coords"))
                .unwrap_or("");
            handle_recalibrate(req, state, ckpt_no).await
        }
        _ => json_response(
            StatusCode::NOT_FOUND,
            &FailResponse {
                res: "fail",
                code: "NOT_FOUND",
            },
        ),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /admin/groups
async fn handle_insert_groups(req: Request<Incoming>, state: Arc<AppState>) -> Response<FullBody> {
    let body: InsertGroupsRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mut docs = Vec::with_capacity(body.groups.len());
    for entry in body.groups {
        if entry.group_no.is_empty() || entry.password.is_empty() || entry.seq_id.is_empty() {
            return error_response(&WaymarkError::Http(
                "groups require groupNo, password and seqId".into(),
            ));
        }

        let class: GroupClass = match entry.class.parse() {
            Ok(c) => c,
            Err(e) => return error_response(&WaymarkError::Http(e)),
        };
        let password_hash = match hash_password(&entry.password) {
            Ok(h) => h,
            Err(e) => return error_response(&e),
        };

        let mut doc = GroupDoc::new(
            entry.group_no,
            password_hash,
            class,
            entry.members,
            entry.seq_id,
        );
        doc.done_tasks = entry.done_tasks;
        docs.push(doc);
    }

    match state.store.insert_groups(docs).await {
        Ok(inserted) => {
            info!("Inserted {} group(s)", inserted);
            json_response(
                StatusCode::OK,
                &InsertResponse {
                    res: "success",
                    inserted,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

/// POST /admin/sequences
async fn handle_insert_sequences(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<FullBody> {
    let body: InsertSequencesRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mut docs = Vec::with_capacity(body.sequences.len());
    for entry in body.sequences {
        if entry.seq_id.is_empty() {
            return error_response(&WaymarkError::Http("sequences require seqId".into()));
        }
        // An empty sequence would make every referencing group an
        // integrity fault; refuse it here.
        if entry.sequence.is_empty() {
            return error_response(&WaymarkError::Http(format!(
                "sequence '{}' must name at least one checkpoint",
                entry.seq_id
            )));
        }

        let sequence = entry.sequence.into_iter().map(CheckpointId::from).collect();
        docs.push(SequenceDoc::new(entry.seq_id, sequence));
    }

    match state.store.insert_sequences(docs).await {
        Ok(inserted) => {
            info!("Inserted {} sequence(s)", inserted);
            json_response(
                StatusCode::OK,
                &InsertResponse {
                    res: "success",
                    inserted,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

/// POST /admin/checkpoints
async fn handle_insert_checkpoints(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<FullBody> {
    let body: InsertCheckpointsRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mut docs = Vec::with_capacity(body.checkpoints.len());
    for entry in body.checkpoints {
        if entry.ckpt_no.is_empty() {
            return error_response(&WaymarkError::Http("checkpoints require ckptNo".into()));
        }

        let coords = match (entry.coords, entry.shared_coords) {
            (Some(_), Some(_)) => {
                return error_response(&WaymarkError::Http(format!(
                    "checkpoint '{}' carries both coords and sharedCoords",
                    entry.ckpt_no
                )))
            }
            (Some(per_class), None) => ClassCoords {
                y: per_class.y,
                f: per_class.f,
                e: per_class.e,
            },
            (None, Some(shared)) => ClassCoords::shared(shared),
            (None, None) => {
                return error_response(&WaymarkError::Http(format!(
                    "checkpoint '{}' needs coords or sharedCoords",
                    entry.ckpt_no
                )))
            }
        };

        docs.push(CheckpointDoc::new(
            CheckpointId::from(entry.ckpt_no),
            coords,
            entry.clue,
            entry.task,
            entry.image,
        ));
    }

    match state.store.insert_checkpoints(docs).await {
        Ok(inserted) => {
            info!("Inserted {} checkpoint(s)", inserted);
            json_response(
                StatusCode::OK,
                &InsertResponse {
                    res: "success",
                    inserted,
                },
            )
        }
        Err(e) => error_response(&e),
    }
}

/// GET /admin/checkpoints
async fn handle_list_checkpoints(state: Arc<AppState>) -> Response<FullBody> {
    let checkpoints = match state.store.list_checkpoints_ordered().await {
        Ok(list) => list,
        Err(e) => return error_response(&e),
    };

    let views = checkpoints
        .into_iter()
        .map(|c| AdminCheckpointView {
            ckpt_no: c.ckpt_no.to_string(),
            coords: c.coords,
            clue: c.clue,
            task: c.task,
            image: c.image,
        })
        .collect();

    json_response(
        StatusCode::OK,
        &ListCheckpointsResponse {
            res: "success",
            checkpoints: views,
        },
    )
}

/// PUT /admin/checkpoints/{ckptNo}/coords
async fn handle_recalibrate(
    req: Request<Incoming>,
    state: Arc<AppState>,
    ckpt_no: &str,
) -> Response<FullBody> {
    let body: RecalibrateRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let class: GroupClass = match body.class.parse() {
        Ok(c) => c,
        Err(e) => return error_response(&WaymarkError::Http(e)),
    };

    let ckpt_no = CheckpointId::from(ckpt_no);
    let coords = GeoPoint::new(body.latitude, body.longitude);

    match state
        .store
        .recalibrate_checkpoint(&ckpt_no, class, coords)
        .await
    {
        Ok(()) => {
            info!("Recalibrated checkpoint '{}' class {}", ckpt_no, class);
            json_response(StatusCode::OK, &ResResponse { res: "success" })
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

fn error_response(err: &WaymarkError) -> Response<FullBody> {
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

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization, x-admin-key")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, WaymarkError> {
    let body = req
        .collect()
        .await
        .map_err(|e| WaymarkError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 1_048_576 {
        return Err(WaymarkError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| WaymarkError::Http(format!("Invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use crate::db::memory::MemoryHuntStore;
    use crate::db::HuntStore;
    use clap::Parser;

    async fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryHuntStore::new());
        store
            .insert_checkpoints(vec![
                CheckpointDoc::new(
                    "10".into(),
                    ClassCoords::shared(GeoPoint::new(0.0, 0.0)),
                    "clue".into(),
                    "task".into(),
                    None,
                ),
                CheckpointDoc::new(
                    "2".into(),
                    ClassCoords::shared(GeoPoint::new(0.0, 0.0)),
                    "clue".into(),
                    "task".into(),
                    None,
                ),
                CheckpointDoc::new(
                    "1".into(),
                    ClassCoords::shared(GeoPoint::new(0.0, 0.0)),
                    "clue".into(),
                    "task".into(),
                    None,
                ),
            ])
            .await
            .unwrap();

        let args = Args::try_parse_from(["waymark", "--dev-mode", "true"]).unwrap();
        Arc::new(AppState::new(args, store, false))
    }

    #[tokio::test]
    async fn test_listing_uses_natural_order() {
        let state = test_state().await;
        let response = handle_list_checkpoints(state).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<&str> = json["checkpoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["ckptNo"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }
}
