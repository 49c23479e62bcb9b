//! Group login route
//!
//! - `POST /login` - Verify a group's credentials
//!
//! Answers with the `res` convention only; a failed login never says
//! whether the group exists or the password was wrong, so the endpoint
//! cannot be used to enumerate groups.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::verify_password;
use crate::server::AppState;
use crate::types::WaymarkError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub group_no: String,
    pub password: String,
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

/// POST /login
pub async fn handle_login(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            warn!("Login request rejected: {}", e);
            return json_response(
                StatusCode::BAD_REQUEST,
                &FailResponse {
                    res: "fail",
                    code: "BAD_REQUEST",
                },
            );
        }
    };

    if body.group_no.is_empty() || body.password.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &FailResponse {
                res: "fail",
                code: "BAD_REQUEST",
            },
        );
    }

    let group = match state.store.get_group(&body.group_no).await {
        Ok(g) => g,
        Err(WaymarkError::NotFound(_)) => {
            warn!("Login failed - unknown group: {}", body.group_no);
            // Generic failure to prevent group enumeration
            return invalid_credentials();
        }
        Err(e) => {
            warn!("Login lookup failed: {}", e);
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &FailResponse {
                    res: "fail",
                    code: "UNAVAILABLE",
                },
            );
        }
    };

    let password_valid = match verify_password(&body.password, &group.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &FailResponse {
                    res: "fail",
                    code: "INTERNAL",
                },
            );
        }
    };

    if !password_valid {
        warn!("Login failed - wrong password for group: {}", body.group_no);
        return invalid_credentials();
    }

    info!("Group '{}' logged in", body.group_no);
    json_response(StatusCode::OK, &ResResponse { res: "success" })
}

fn invalid_credentials() -> Response<BoxBody> {
    json_response(
        StatusCode::UNAUTHORIZED,
        &FailResponse {
            res: "fail",
            code: "INVALID_CREDENTIALS",
        },
    )
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
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
