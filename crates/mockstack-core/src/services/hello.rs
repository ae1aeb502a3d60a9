use http::Method;

use crate::message::MockResponse;
use crate::service::{Call, Holds, Service};

/// Answers `GET /` with `Hello`.
#[derive(Debug, Default)]
pub struct HelloService;

impl Service for HelloService {
    fn name(&self) -> &str {
        "hello"
    }

    fn handle(&mut self, call: &Call<'_>, _holds: &mut Holds) -> Option<MockResponse> {
        match (call.method, call.path) {
            (&Method::GET, "/") => Some(MockResponse::text(200, "Hello")),
            _ => None,
        }
    }
}
