//! HTTP error type for the portal
//!
//! Domain errors from `edu-common` are mapped to a status code through
//! their [`ErrorKind`]. Internal failures are logged and answered with a
//! generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edu_common::ErrorKind;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned in place of any internal failure
const GENERIC_FAILURE: &str = "خطای داخلی سرور";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid credential (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A registration rule rejected the request (400)
    ///
    /// The student endpoints answer every consistency failure with 400 and
    /// the reason, keeping the machine-readable code of the domain error.
    #[error("{message}")]
    Rejected { code: &'static str, message: String },

    /// Domain error, status chosen from its kind
    #[error(transparent)]
    Common(#[from] edu_common::Error),
}

impl ApiError {
    /// Map a domain error for the student registration endpoints
    ///
    /// Conflicts and validation failures become 400; not-found and internal
    /// errors keep their usual status.
    pub fn rejected(err: edu_common::Error) -> Self {
        match err.kind() {
            ErrorKind::Conflict | ErrorKind::Validation => ApiError::Rejected {
                code: err.code(),
                message: err.to_string(),
            },
            _ => ApiError::Common(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Rejected { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Common(err) => {
                let status = match err.kind() {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Validation => StatusCode::BAD_REQUEST,
                    ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %err, "Request failed");
                    (status, err.code(), GENERIC_FAILURE.to_string())
                } else {
                    (status, err.code(), err.to_string())
                }
            }
        };

        let body = Json(json!({
            "status": "error",
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use edu_common::Error;

    #[test]
    fn test_conflict_status_depends_on_endpoint() {
        let full = || Error::ClassFull {
            class_code: "CL-1".to_string(),
            capacity: 2,
        };

        let admin = ApiError::Common(full()).into_response();
        assert_eq!(admin.status(), StatusCode::CONFLICT);

        let student = ApiError::rejected(full()).into_response();
        assert_eq!(student.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_survives_rejected_mapping() {
        let response = ApiError::rejected(Error::NotFound("Class 9".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_is_generic() {
        let response = ApiError::Common(Error::Internal("disk on fire".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
