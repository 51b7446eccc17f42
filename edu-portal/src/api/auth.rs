//! Authentication for the portal
//!
//! Admin routes carry `timestamp` and `hash` in the JSON body, validated
//! against the shared secret (secret 0 disables the check). Student routes
//! carry `Authorization: Bearer <token>` issued by `POST /auth/login` and
//! signed with the separate token key.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use edu_common::api::{issue_token, validate_hash, validate_timestamp, verify_password, verify_token, ApiAuthError};
use edu_common::db::students::{find_student_by_number, load_credentials, Student};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::format::LoginResponse;
use crate::AppState;

/// Largest admin body read for hash validation
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct AuthFields {
    timestamp: i64,
    hash: String,
}

/// Identity resolved from a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedStudent {
    pub student_number: String,
}

impl AuthenticatedStudent {
    /// Load the student the token names; a token for a deleted student is 404
    pub async fn load(&self, state: &AppState) -> ApiResult<Student> {
        find_student_by_number(&state.db, &self.student_number)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Student {}", self.student_number)))
    }
}

/// Admin authentication middleware
///
/// Returns 401 when the timestamp or hash is wrong, 400 when the body is
/// not JSON or lacks the fields.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.shared_secret == 0 {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    // Bodyless admin requests (GET) sign an object holding only the auth fields
    let json_value: Value = if body_bytes.is_empty() && parts.method == Method::GET {
        auth_fields_from_query(parts.uri.query())?
    } else {
        serde_json::from_slice(&body_bytes)
            .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?
    };

    let auth_fields: AuthFields = serde_json::from_value(json_value.clone())
        .map_err(|e| AuthError::MissingFields(format!("Missing auth fields: {}", e)))?;

    validate_timestamp(auth_fields.timestamp).map_err(|e| match e {
        ApiAuthError::InvalidTimestamp { reason, .. } => AuthError::InvalidTimestamp(reason),
        _ => AuthError::Other(e.to_string()),
    })?;

    validate_hash(&auth_fields.hash, &json_value, state.shared_secret).map_err(|e| match e {
        ApiAuthError::InvalidHash { provided, calculated } => {
            warn!(%provided, %calculated, "Admin hash validation failed");
            AuthError::InvalidHash
        }
        _ => AuthError::Other(e.to_string()),
    })?;

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn auth_fields_from_query(query: Option<&str>) -> Result<Value, AuthError> {
    let mut timestamp = None;
    let mut hash = None;
    for pair in query.unwrap_or_default().split('&') {
        match pair.split_once('=') {
            Some(("timestamp", value)) => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| AuthError::ParseError(format!("Invalid timestamp '{}'", value)))?;
                timestamp = Some(parsed);
            }
            Some(("hash", value)) => hash = Some(value.to_string()),
            _ => {}
        }
    }
    match (timestamp, hash) {
        (Some(timestamp), Some(hash)) => Ok(json!({ "timestamp": timestamp, "hash": hash })),
        _ => Err(AuthError::MissingFields("timestamp and hash query parameters".to_string())),
    }
}

/// Student bearer-token middleware
///
/// Inserts [`AuthenticatedStudent`] into the request extensions.
pub async fn student_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let student_number = verify_token(token, state.token_key).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        ApiError::Unauthorized(e.to_string())
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedStudent { student_number });
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "studentid")]
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub password: String,
}

/// POST /auth/login
///
/// Unknown student and wrong password both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    let invalid = || ApiError::Unauthorized("Invalid student number or password".to_string());

    let credentials = load_credentials(&state.db, request.student_id.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&request.password, &credentials.password_hash, &credentials.password_salt) {
        warn!(student_number = %request.student_id, "Failed login");
        return Err(invalid());
    }

    let token =
        issue_token(request.student_id.trim(), state.token_key, state.token_ttl_secs).map_err(|e| {
            error!(error = %e, "Cannot issue student token");
            ApiError::Unauthorized("Login is not available".to_string())
        })?;
    debug!(student_id = credentials.student_id, "Issued student token");
    Ok(Json(LoginResponse { token }))
}

/// Admin authentication failures
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
    Other(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing required fields: {}", msg))
            }
            AuthError::ParseError(msg) => (StatusCode::BAD_REQUEST, format!("Parse error: {}", msg)),
            AuthError::Other(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({
            "status": "error",
            "error": {
                "code": "UNAUTHORIZED",
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
