use http::Method;
use serde_json::json;

use crate::message::MockResponse;
use crate::service::{Call, Holds, Service};

/// A stateful counter: `GET /` reads it, `POST /` increments, `DELETE /` zeroes.
#[derive(Debug, Default)]
pub struct CounterService {
    value: u64,
}

impl Service for CounterService {
    fn name(&self) -> &str {
        "counter"
    }

    fn handle(&mut self, call: &Call<'_>, _holds: &mut Holds) -> Option<MockResponse> {
        if call.path != "/" {
            return None;
        }
        match *call.method {
            Method::GET => {}
            Method::POST => self.value += 1,
            Method::DELETE => self.value = 0,
            _ => return None,
        }
        Some(MockResponse::json(200, &json!({ "value": self.value })))
    }
}
