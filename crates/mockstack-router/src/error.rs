//! Error types for the session router.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mockstack_core::MockResponse;
use serde::Serialize;

/// No session id could be extracted from the request path.
pub const STATUS_MISSING_SESSION: u16 = 593;
/// The extracted session id is not in the registry.
pub const STATUS_UNKNOWN_SESSION: u16 = 594;

/// Session construction and lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Invalid service list: {0}")]
    InvalidServiceList(String),

    #[error("No services configured")]
    NoServicesProvided,
}

/// Errors surfaced by the router as HTTP-shaped responses.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Missing session id")]
    MissingSession,

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Malformed session id: {0:?}")]
    MalformedSessionId(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl RouterError {
    pub fn status(&self) -> u16 {
        self.status_and_code().0
    }

    fn status_and_code(&self) -> (u16, &'static str) {
        match self {
            RouterError::MissingSession => (STATUS_MISSING_SESSION, "MISSING_SESSION"),
            RouterError::UnknownSession(_) => (STATUS_UNKNOWN_SESSION, "UNKNOWN_SESSION"),
            RouterError::MalformedSessionId(_) => (400, "MALFORMED_SESSION_ID"),
            RouterError::Session(SessionError::InvalidSessionId(_)) => (404, "INVALID_SESSION_ID"),
            RouterError::Session(SessionError::InvalidServiceList(_)) => {
                (500, "INVALID_SERVICE_LIST")
            }
            RouterError::Session(SessionError::NoServicesProvided) => (500, "NO_SERVICES"),
            RouterError::Configuration(_) => (500, "CONFIGURATION_ERROR"),
            RouterError::InvalidBody(_) => (400, "INVALID_BODY"),
            RouterError::Internal(_) => (500, "INTERNAL_ERROR"),
        }
    }

    /// Render as the engine-shaped response used on the routing surface.
    pub fn to_mock_response(&self) -> MockResponse {
        let (status, code) = self.status_and_code();
        MockResponse::json(
            status,
            &ErrorBody {
                error: self.to_string(),
                code,
            },
        )
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_errors_keep_reference_codes() {
        assert_eq!(RouterError::MissingSession.status(), 593);
        assert_eq!(RouterError::UnknownSession("x".into()).status(), 594);
        assert_eq!(
            RouterError::from(SessionError::InvalidSessionId("x".into())).status(),
            404
        );
    }

    #[test]
    fn test_mock_response_carries_structured_body() {
        let response = RouterError::UnknownSession("abc".into()).to_mock_response();
        assert_eq!(response.status, 594);

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["code"], "UNKNOWN_SESSION");
        assert_eq!(body["error"], "Unknown session: abc");
    }
}
