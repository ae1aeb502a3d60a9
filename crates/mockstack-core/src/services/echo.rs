use http::header::{HeaderName, HeaderValue};

use crate::message::MockResponse;
use crate::service::{Call, Holds, Service};

const ECHO_METHOD: &str = "x-echo-method";
const ECHO_PATH: &str = "x-echo-path";

/// Mirrors requests back to the caller.
///
/// `/status/<code>` answers with that status code; every other path answers
/// 200 with the request body, plus the method and service path as headers.
#[derive(Debug, Default)]
pub struct EchoService;

impl Service for EchoService {
    fn name(&self) -> &str {
        "echo"
    }

    fn handle(&mut self, call: &Call<'_>, _holds: &mut Holds) -> Option<MockResponse> {
        if let Some(code) = call.path.strip_prefix("/status/") {
            let status = code.trim_end_matches('/').parse::<u16>().ok()?;
            if !(100..=999).contains(&status) {
                return None;
            }
            return Some(MockResponse::new(status));
        }

        let mut response = MockResponse::new(200).with_body(call.request.body.clone());
        if let Ok(value) = HeaderValue::from_str(call.method.as_str()) {
            response
                .headers
                .insert(HeaderName::from_static(ECHO_METHOD), value);
        }
        if let Ok(value) = HeaderValue::from_str(call.path) {
            response
                .headers
                .insert(HeaderName::from_static(ECHO_PATH), value);
        }
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MockRequest;
    use http::{HeaderMap, Method};

    #[test]
    fn test_echoes_body_and_route() {
        let request = MockRequest::new("/echo/a/b").with_body("payload");
        let headers = HeaderMap::new();
        let call = Call {
            method: &Method::PUT,
            request: &request,
            path: "/a/b",
            headers: &headers,
        };

        let response = EchoService.handle(&call, &mut Holds::new()).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body_text(), "payload");
        assert_eq!(response.headers.get("x-echo-method").unwrap(), "PUT");
        assert_eq!(response.headers.get("x-echo-path").unwrap(), "/a/b");
    }

    #[test]
    fn test_invalid_status_is_unhandled() {
        let request = MockRequest::new("/echo/status/abc");
        let headers = HeaderMap::new();
        let call = Call {
            method: &Method::GET,
            request: &request,
            path: "/status/abc",
            headers: &headers,
        };
        assert!(EchoService.handle(&call, &mut Holds::new()).is_none());
    }
}
