//! Crate-wide error type.
//!
//! Mirrors spec §7's error table one-to-one: each variant knows the HTTP status it maps to at
//! ingress, so API handlers can convert a `MoniflowError` straight into a response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

pub type MoniflowResult<T> = Result<T, MoniflowError>;

#[derive(Debug, Error, Clone)]
pub enum MoniflowError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("authorization header missing")]
    AuthMissing,

    #[error("invalid authorization header")]
    AuthMalformed,

    #[error("access token expired")]
    AuthExpired,

    #[error("invalid access token")]
    AuthInvalid,

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("request timed out")]
    UpstreamTimeout,

    #[error("upstream service unreachable")]
    UpstreamUnreachable,

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl MoniflowError {
    pub fn status_code(&self) -> StatusCode {
        use MoniflowError::*;
        match self {
            InvalidTimestamp(_) | InvalidQuery(_) | SchemaInvalid(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            InvalidLogLevel(_) => StatusCode::BAD_REQUEST,
            StorageUnavailable(_) | ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthMissing | AuthMalformed | AuthExpired | AuthInvalid => StatusCode::UNAUTHORIZED,
            UnknownService(_) => StatusCode::NOT_FOUND,
            UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            RuleNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Detail string surfaced to the caller, matching the original service's wording where it
    /// distinguishes cases the client can act on (expired vs. invalid token, missing header).
    pub fn detail(&self) -> String {
        use MoniflowError::*;
        match self {
            AuthMissing => "Authorization header missing".to_string(),
            AuthMalformed => "Invalid Authorization header".to_string(),
            AuthExpired => "Access token expired".to_string(),
            AuthInvalid => "Invalid access token".to_string(),
            UnknownService(s) => format!("Service not found: {s}"),
            UpstreamTimeout => "Request timed out".to_string(),
            UpstreamUnreachable => "Upstream service unreachable".to_string(),
            RuleNotFound(id) => format!("Alert rule not found: {id}"),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for MoniflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.detail(),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec_table() {
        assert_eq!(
            MoniflowError::InvalidTimestamp("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            MoniflowError::StorageUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(MoniflowError::AuthMissing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(MoniflowError::AuthExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            MoniflowError::UnknownService("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(MoniflowError::UpstreamTimeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(MoniflowError::UpstreamUnreachable.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            MoniflowError::RuleNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MoniflowError::InvalidLogLevel("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_detail_strings_are_distinct() {
        assert_eq!(MoniflowError::AuthMissing.detail(), "Authorization header missing");
        assert_eq!(MoniflowError::AuthExpired.detail(), "Access token expired");
        assert_eq!(MoniflowError::AuthInvalid.detail(), "Invalid access token");
    }
}
