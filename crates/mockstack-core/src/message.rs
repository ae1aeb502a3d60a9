//! Request and response values exchanged with the dispatch engine.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde::Serialize;

/// The matched service has no route for the request.
pub const STATUS_ROUTE_NOT_HANDLED: u16 = 595;
/// The matched service panicked while handling the request.
pub const STATUS_SERVICE_FAILURE: u16 = 596;
/// No service is registered under the requested name.
pub const STATUS_UNKNOWN_SERVICE: u16 = 597;

/// Inbound request data that is not passed to `dispatch` separately.
///
/// Method, routed path and headers travel as their own arguments because the
/// router rewrites the path (and may rewrite headers) before the engine sees them.
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    /// Full request target as received, including any query string.
    pub url: String,
    pub query: Option<String>,
    pub body: Bytes,
}

impl MockRequest {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let query = url.split_once('?').map(|(_, q)| q.to_string());
        Self {
            url,
            query,
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// The `(status, headers, body)` triple produced by a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
            .with_body(body.into())
    }

    /// Serialize `value` as the response body.
    ///
    /// Serialization of the plain data types used here cannot fail in practice;
    /// if it does the response degrades to an empty JSON object.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Body as UTF-8 text, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_splits_query() {
        let request = MockRequest::new("/s1/hello/?a=1&b=2");
        assert_eq!(request.query.as_deref(), Some("a=1&b=2"));

        let request = MockRequest::new("/s1/hello/");
        assert!(request.query.is_none());
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let response = MockResponse::json(200, &serde_json::json!({"value": 3}));
        assert_eq!(response.status, 200);
        assert_eq!(
            response.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.body_text(), r#"{"value":3}"#);
    }
}
