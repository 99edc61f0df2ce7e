//! Test utilities: a transport that records requests instead of sending
//! them.

use std::sync::Mutex;

use http::{HeaderMap, Method, StatusCode};

use crate::{AsyncTransport, Error, Profile, Transport, rows::Row};

pub(crate) fn test_profile() -> Profile {
    Profile::new("http://localhost:3000/rest/v1", "test-key", Some("users"))
        .expect("test profile should be valid")
}

/// Convert a JSON object literal into a row.
pub(crate) fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// The parts of a request that went out on the wire.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Captured {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// A transport that answers every request with a canned response, and keeps
/// a copy of each request.
#[derive(Debug)]
pub(crate) struct StubTransport {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<Captured>>,
}

impl StubTransport {
    pub(crate) fn ok(body: &str) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub(crate) fn with_status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, req: http::Request<String>) -> Result<http::Response<String>, Error> {
        let (parts, body) = req.into_parts();
        self.requests.lock().unwrap().push(Captured {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });

        let resp = http::Response::builder()
            .status(self.status)
            .body(self.body.clone())?;
        Ok(resp)
    }
}

impl Transport for StubTransport {
    fn execute(&self, req: http::Request<String>) -> Result<http::Response<String>, Error> {
        self.respond(req)
    }
}

impl AsyncTransport for StubTransport {
    fn execute_async(
        &self,
        req: http::Request<String>,
    ) -> impl Future<Output = Result<http::Response<String>, Error>> + Send {
        std::future::ready(self.respond(req))
    }
}
